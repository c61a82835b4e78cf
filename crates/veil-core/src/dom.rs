#![forbid(unsafe_code)]

//! Arena-backed document model.
//!
//! A [`Document`] owns every [`Element`] in a flat arena; elements are
//! addressed by [`ElementId`] (the arena index). Detaching an element keeps
//! its slot alive, so ids are never reused and a stale id can always be
//! checked with [`Document::is_connected`].
//!
//! The model carries just enough state for overlay components: class lists,
//! attributes, inline styles, box metrics, scroll offsets, focus, the
//! viewport, and transition durations (via [`Stylesheet`]).
//!
//! # Invariants
//!
//! 1. The tree is acyclic: `append_child` refuses to insert an ancestor
//!    below its own descendant.
//! 2. Every element has at most one parent, and appears exactly once in
//!    that parent's child list.
//! 3. `root()` and `body()` are always connected.
//! 4. The active element, when set, is connected.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown id | Id from another document | Getters return `None`, setters are no-ops |
//! | Cyclic append | Parent is inside child | `append_child` returns `false` |
//! | Bad selector | Malformed query | `Err(SelectorError)` |

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use smallvec::SmallVec;

use crate::selector::{Selector, SelectorError};
use crate::stylesheet::{Stylesheet, parse_css_time};
use crate::target::Target;

/// Index of an element inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    /// Raw arena index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Layout-dependent sizes of an element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxMetrics {
    pub client_width: u32,
    pub client_height: u32,
    pub scroll_height: u32,
}

impl BoxMetrics {
    /// Create metrics from client size and scrollable content height.
    #[must_use]
    pub const fn new(client_width: u32, client_height: u32, scroll_height: u32) -> Self {
        Self {
            client_width,
            client_height,
            scroll_height,
        }
    }

    /// Content taller than the visible box.
    #[inline]
    #[must_use]
    pub const fn is_overflowing_y(&self) -> bool {
        self.scroll_height > self.client_height
    }
}

/// Window metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Window width including any vertical scrollbar.
    pub inner_width: u32,
    /// Width of the document element (excludes the scrollbar).
    pub client_width: u32,
    pub inner_height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(inner_width: u32, client_width: u32, inner_height: u32) -> Self {
        Self {
            inner_width,
            client_width,
            inner_height,
        }
    }

    /// Width of the page's vertical scrollbar (0 when there is none).
    #[inline]
    #[must_use]
    pub const fn scrollbar_width(&self) -> u32 {
        self.inner_width.abs_diff(self.client_width)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024, 1024, 768)
    }
}

/// Text direction of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// A single node in the document.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    metrics: BoxMetrics,
    scroll_top: u32,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            metrics: BoxMetrics::default(),
            scroll_top: 0,
        }
    }

    /// Lower-cased tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Attribute value. The class list is exposed as the `class` attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// All attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Class names in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Inline style property.
    #[must_use]
    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    #[must_use]
    pub fn metrics(&self) -> BoxMetrics {
        self.metrics
    }

    #[must_use]
    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    fn add_class(&mut self, class: &str) {
        if class.is_empty() || self.has_class(class) {
            return;
        }
        let list = self.attributes.entry("class".to_owned()).or_default();
        if !list.is_empty() {
            list.push(' ');
        }
        list.push_str(class);
    }

    fn remove_class(&mut self, class: &str) {
        let Some(list) = self.attributes.get_mut("class") else {
            return;
        };
        let kept: Vec<&str> = list
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        *list = kept.join(" ");
    }
}

/// Inclusive propagation path, target first.
pub type PropagationPath = SmallVec<[ElementId; 8]>;

/// Iterator over the (exclusive) ancestors of an element.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<ElementId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// The document: element arena, focus, viewport and stylesheet.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    root: ElementId,
    body: ElementId,
    active: Option<ElementId>,
    viewport: Viewport,
    direction: Direction,
    stylesheet: Stylesheet,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing `<html><body></body></html>`.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: ElementId(0),
            body: ElementId(0),
            active: None,
            viewport: Viewport::default(),
            direction: Direction::Ltr,
            stylesheet: Stylesheet::new(),
        };
        let root = doc.create_element("html");
        let body = doc.create_element("body");
        doc.append_child(root, body);
        doc.root = root;
        doc.body = body;
        doc
    }

    /// Replace the stylesheet, builder style.
    #[must_use]
    pub fn with_stylesheet(mut self, stylesheet: Stylesheet) -> Self {
        self.stylesheet = stylesheet;
        self
    }

    /// Set the viewport, builder style.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> ElementId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Number of elements ever created (connected or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: the root and body always exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(id.index())
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(id.index())
    }

    // --- Tree ---

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let id = ElementId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Element::new(tag));
        id
    }

    /// Start building a detached element.
    pub fn build(&mut self, tag: &str) -> ElementBuilder<'_> {
        let id = self.create_element(tag);
        ElementBuilder { doc: self, id }
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// Returns `false` (and changes nothing) if either id is unknown or the
    /// move would make an element its own ancestor.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        if self.element(parent).is_none() || self.element(child).is_none() {
            return false;
        }
        if self.contains(child, parent) {
            return false;
        }
        self.remove(child);
        if let Some(el) = self.element_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(p) = self.element_mut(parent) {
            p.children.push(child);
        }
        true
    }

    /// Detach an element (and its subtree) from its parent.
    pub fn remove(&mut self, id: ElementId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(element = %id, parent = %parent, "detach element");
        if let Some(p) = self.element_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(el) = self.element_mut(id) {
            el.parent = None;
        }
        if self.active.is_some_and(|a| self.contains(id, a)) {
            self.active = None;
        }
    }

    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id).and_then(Element::parent)
    }

    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.element(id).map(Element::children).unwrap_or_default()
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    #[must_use]
    pub fn ancestors(&self, id: ElementId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// `id` followed by its ancestors: the order events bubble in.
    #[must_use]
    pub fn propagation_path(&self, id: ElementId) -> PropagationPath {
        let mut path = PropagationPath::new();
        if self.element(id).is_some() {
            path.push(id);
            path.extend(self.ancestors(id));
        }
        path
    }

    /// Whether `node` is `ancestor` or lies inside it.
    #[must_use]
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    #[must_use]
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.element(id).is_some() && self.contains(self.root, id)
    }

    /// Descendants of `id` in document (pre-)order, excluding `id`.
    #[must_use]
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    // --- Queries ---

    /// First connected element whose `id` attribute equals `value`.
    #[must_use]
    pub fn get_element_by_id(&self, value: &str) -> Option<ElementId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.attribute(*id, "id") == Some(value))
    }

    /// First connected element matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementId>, SelectorError> {
        let sel = Selector::parse(selector)?;
        Ok(self.select_all(&sel).into_iter().next())
    }

    /// Every connected element matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>, SelectorError> {
        let sel = Selector::parse(selector)?;
        Ok(self.select_all(&sel))
    }

    #[must_use]
    pub fn select_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.select_within(self.root, selector)
    }

    /// Descendants of `scope` matching `selector`, in document order.
    #[must_use]
    pub fn select_within(&self, scope: ElementId, selector: &Selector) -> Vec<ElementId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    /// Nearest inclusive ancestor of `id` matching `selector`.
    #[must_use]
    pub fn closest(&self, id: ElementId, selector: &Selector) -> Option<ElementId> {
        self.propagation_path(id)
            .into_iter()
            .find(|candidate| selector.matches(self, *candidate))
    }

    pub fn matches(&self, id: ElementId, selector: &str) -> Result<bool, SelectorError> {
        Ok(Selector::parse(selector)?.matches(self, id))
    }

    /// Resolve a target to its first element.
    pub fn resolve(&self, target: &Target) -> Result<Option<ElementId>, SelectorError> {
        match target {
            Target::Element(id) => Ok(self.element(*id).map(|_| *id)),
            Target::Selector(sel) => self.query_selector(sel),
        }
    }

    /// Resolve a target to every element it names.
    pub fn resolve_all(&self, target: &Target) -> Result<Vec<ElementId>, SelectorError> {
        match target {
            Target::Element(id) => Ok(self.element(*id).map(|_| *id).into_iter().collect()),
            Target::Selector(sel) => self.query_selector_all(sel),
        }
    }

    // --- Classes, attributes, styles ---

    #[must_use]
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.add_class(class);
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_class(class);
        }
    }

    #[must_use]
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.insert(name.to_owned(), value.into());
        }
    }

    pub fn remove_attribute(&mut self, id: ElementId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.remove(name);
        }
    }

    #[must_use]
    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.style(property))
    }

    pub fn set_style(&mut self, id: ElementId, property: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.style.insert(property.to_owned(), value.into());
        }
    }

    pub fn remove_style(&mut self, id: ElementId, property: &str) {
        if let Some(el) = self.element_mut(id) {
            el.style.remove(property);
        }
    }

    // --- Metrics ---

    #[must_use]
    pub fn metrics(&self, id: ElementId) -> BoxMetrics {
        self.element(id).map(Element::metrics).unwrap_or_default()
    }

    pub fn set_metrics(&mut self, id: ElementId, metrics: BoxMetrics) {
        if let Some(el) = self.element_mut(id) {
            el.metrics = metrics;
        }
    }

    #[must_use]
    pub fn scroll_top(&self, id: ElementId) -> u32 {
        self.element(id).map(Element::scroll_top).unwrap_or_default()
    }

    pub fn set_scroll_top(&mut self, id: ElementId, value: u32) {
        if let Some(el) = self.element_mut(id) {
            el.scroll_top = value;
        }
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    // --- Focus & visibility ---

    #[must_use]
    pub fn active_element(&self) -> Option<ElementId> {
        self.active
    }

    /// Focus `id`. Detached or unknown elements cannot take focus.
    pub fn focus(&mut self, id: ElementId) -> bool {
        if !self.is_connected(id) {
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    /// Connected, not inside a `display: none` subtree and not
    /// `visibility: hidden` itself.
    #[must_use]
    pub fn is_visible(&self, id: ElementId) -> bool {
        if !self.is_connected(id) {
            return false;
        }
        if self.style(id, "visibility") == Some("hidden") {
            return false;
        }
        !self
            .propagation_path(id)
            .into_iter()
            .any(|el| self.style(el, "display") == Some("none"))
    }

    /// Disabled via the `disabled` attribute or class.
    #[must_use]
    pub fn is_disabled(&self, id: ElementId) -> bool {
        match self.element(id) {
            None => true,
            Some(el) => el.has_class("disabled") || el.attribute("disabled").is_some(),
        }
    }

    // --- Transitions ---

    #[must_use]
    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    pub fn stylesheet_mut(&mut self) -> &mut Stylesheet {
        &mut self.stylesheet
    }

    /// Transition duration plus delay for `id`.
    ///
    /// Inline `transition-duration` / `transition-delay` win over stylesheet
    /// rules; among matching rules the longest duration applies.
    #[must_use]
    pub fn transition_duration(&self, id: ElementId) -> Duration {
        let inline = self
            .style(id, "transition-duration")
            .and_then(parse_css_time);
        let delay = self
            .style(id, "transition-delay")
            .and_then(parse_css_time)
            .unwrap_or_default();
        match inline {
            Some(d) => d + delay,
            None => self.stylesheet.duration_for(self, id) + delay,
        }
    }
}

/// Fluent builder returned by [`Document::build`].
pub struct ElementBuilder<'a> {
    doc: &'a mut Document,
    id: ElementId,
}

impl ElementBuilder<'_> {
    /// Set the `id` attribute.
    #[must_use]
    pub fn id(self, value: &str) -> Self {
        self.attr("id", value)
    }

    /// Add one or more whitespace-separated classes.
    #[must_use]
    pub fn class(self, classes: &str) -> Self {
        for class in classes.split_ascii_whitespace() {
            self.doc.add_class(self.id, class);
        }
        self
    }

    #[must_use]
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.doc.set_attribute(self.id, name, value);
        self
    }

    #[must_use]
    pub fn style(self, property: &str, value: &str) -> Self {
        self.doc.set_style(self.id, property, value);
        self
    }

    #[must_use]
    pub fn metrics(self, metrics: BoxMetrics) -> Self {
        self.doc.set_metrics(self.id, metrics);
        self
    }

    /// Append to `parent` and return the new element's id.
    pub fn append_to(self, parent: ElementId) -> ElementId {
        self.doc.append_child(parent, self.id);
        self.id
    }

    /// Leave the element detached and return its id.
    #[must_use]
    pub fn detached(self) -> ElementId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_html_and_body() {
        let doc = Document::new();
        assert_eq!(doc.element(doc.root()).map(Element::tag), Some("html"));
        assert_eq!(doc.parent(doc.body()), Some(doc.root()));
        assert!(doc.is_connected(doc.body()));
    }

    #[test]
    fn append_and_remove() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.build("div").append_to(body);
        let b = doc.build("span").append_to(a);
        assert!(doc.contains(a, b));
        assert!(doc.is_connected(b));

        doc.remove(a);
        assert!(!doc.is_connected(b));
        assert!(doc.contains(a, b));
        assert!(doc.children(body).is_empty());
    }

    #[test]
    fn append_rejects_cycles() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.build("div").append_to(body);
        let b = doc.build("div").append_to(a);
        assert!(!doc.append_child(b, a));
        assert_eq!(doc.parent(a), Some(body));
    }

    #[test]
    fn append_moves_between_parents() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.build("div").append_to(body);
        let b = doc.build("div").append_to(body);
        let c = doc.build("p").append_to(a);
        assert!(doc.append_child(b, c));
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[c]);
    }

    #[test]
    fn class_list_edits() {
        let mut doc = Document::new();
        let el = doc.build("div").class("modal fade").detached();
        doc.add_class(el, "show");
        doc.add_class(el, "show");
        assert_eq!(doc.attribute(el, "class"), Some("modal fade show"));
        doc.remove_class(el, "fade");
        assert_eq!(doc.attribute(el, "class"), Some("modal show"));
        assert!(!doc.has_class(el, "fade"));
    }

    #[test]
    fn query_in_document_order_skips_detached() {
        let mut doc = Document::new();
        let body = doc.body();
        let first = doc.build("div").class("x").append_to(body);
        let outer = doc.build("div").append_to(body);
        let second = doc.build("div").class("x").append_to(outer);
        let _loose = doc.build("div").class("x").detached();
        assert_eq!(doc.query_selector(".x").unwrap(), Some(first));
        assert_eq!(doc.query_selector_all(".x").unwrap(), vec![first, second]);
        assert!(doc.query_selector("..").is_err());
    }

    #[test]
    fn closest_is_inclusive() {
        let mut doc = Document::new();
        let body = doc.body();
        let modal = doc.build("div").class("modal").append_to(body);
        let btn = doc.build("button").append_to(modal);
        let sel = Selector::parse(".modal").unwrap();
        assert_eq!(doc.closest(btn, &sel), Some(modal));
        assert_eq!(doc.closest(modal, &sel), Some(modal));
        assert_eq!(doc.closest(body, &sel), None);
    }

    #[test]
    fn visibility_follows_display_none_ancestors() {
        let mut doc = Document::new();
        let body = doc.body();
        let modal = doc.build("div").style("display", "none").append_to(body);
        let btn = doc.build("button").append_to(modal);
        assert!(!doc.is_visible(btn));
        doc.set_style(modal, "display", "block");
        assert!(doc.is_visible(btn));
        doc.remove(modal);
        assert!(!doc.is_visible(btn));
    }

    #[test]
    fn focus_requires_connection_and_clears_on_removal() {
        let mut doc = Document::new();
        let body = doc.body();
        let loose = doc.create_element("input");
        assert!(!doc.focus(loose));
        let wrapper = doc.build("div").append_to(body);
        let input = doc.build("input").append_to(wrapper);
        assert!(doc.focus(input));
        doc.remove(wrapper);
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn scrollbar_width_is_absolute_difference() {
        assert_eq!(Viewport::new(1024, 1007, 768).scrollbar_width(), 17);
        assert_eq!(Viewport::new(1000, 1000, 768).scrollbar_width(), 0);
    }

    #[test]
    fn inline_transition_overrides_stylesheet() {
        let mut doc = Document::new().with_stylesheet(Stylesheet::bootstrap());
        let body = doc.body();
        let el = doc.build("div").class("fade").append_to(body);
        assert_eq!(doc.transition_duration(el), Duration::from_millis(150));
        doc.set_style(el, "transition-duration", "0.5s");
        doc.set_style(el, "transition-delay", "20ms");
        assert_eq!(doc.transition_duration(el), Duration::from_millis(520));
    }
}
