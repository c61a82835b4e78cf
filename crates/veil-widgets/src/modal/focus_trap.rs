#![forbid(unsafe_code)]

//! Keeps keyboard focus inside an open modal.
//!
//! One trap is active per page. Activating a trap focuses its element;
//! any later focus-in that lands outside the element is pulled back to the
//! first focusable descendant, or the last one when the user was tabbing
//! backwards.

use veil_core::{Document, ElementId, Selector};

const FOCUSABLE: [&str; 8] = [
    "a",
    "button",
    "input",
    "textarea",
    "select",
    "details",
    "[tabindex]",
    "[contenteditable=\"true\"]",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TabDirection {
    #[default]
    Forward,
    Backward,
}

/// Page-wide focus trap state.
#[derive(Debug, Default)]
pub struct FocusTrap {
    active: Option<ElementId>,
    last_tab: TabDirection,
}

impl FocusTrap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Element focus is currently confined to.
    #[must_use]
    pub fn active(&self) -> Option<ElementId> {
        self.active
    }

    /// Confine focus to `trap` and move focus onto it.
    pub fn activate(&mut self, doc: &mut Document, trap: ElementId) {
        if self.active == Some(trap) {
            return;
        }
        doc.focus(trap);
        self.active = Some(trap);
        self.last_tab = TabDirection::Forward;
        tracing::trace!(element = %trap, "focus trap active");
    }

    /// Release the trap if `trap` holds it.
    pub fn deactivate(&mut self, trap: ElementId) {
        if self.active == Some(trap) {
            self.active = None;
            tracing::trace!(element = %trap, "focus trap released");
        }
    }

    pub fn record_tab(&mut self, backward: bool) {
        self.last_tab = if backward {
            TabDirection::Backward
        } else {
            TabDirection::Forward
        };
    }

    /// Where focus should go after `target` received it, if the trap
    /// rejects `target`.
    #[must_use]
    pub fn redirect(&self, doc: &Document, target: ElementId) -> Option<ElementId> {
        let trap = self.active?;
        if target == doc.root() || doc.contains(trap, target) {
            return None;
        }
        let candidates = focusable_children(doc, trap);
        let next = match self.last_tab {
            TabDirection::Forward => candidates.first(),
            TabDirection::Backward => candidates.last(),
        };
        Some(next.copied().unwrap_or(trap))
    }
}

/// Focusable descendants of `scope`, in document order.
///
/// Negative `tabindex`, disabled and invisible elements are excluded.
#[must_use]
pub fn focusable_children(doc: &Document, scope: ElementId) -> Vec<ElementId> {
    let selector = FOCUSABLE
        .iter()
        .map(|base| format!("{base}:not([tabindex^=\"-\"])"))
        .collect::<Vec<_>>()
        .join(", ");
    let Ok(selector) = Selector::parse(&selector) else {
        return Vec::new();
    };
    doc.select_within(scope, &selector)
        .into_iter()
        .filter(|&el| !doc.is_disabled(el) && doc.is_visible(el))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog() -> (Document, ElementId, [ElementId; 3]) {
        let mut doc = Document::new();
        let body = doc.body();
        let modal = doc.build("div").class("modal").append_to(body);
        let first = doc.build("button").append_to(modal);
        let _skipped = doc.build("a").attr("tabindex", "-1").append_to(modal);
        let _disabled = doc.build("button").attr("disabled", "").append_to(modal);
        let last = doc.build("input").append_to(modal);
        let outside = doc.build("button").append_to(body);
        (doc, modal, [first, last, outside])
    }

    #[test]
    fn focusable_children_filters_negative_tabindex_and_disabled() {
        let (doc, modal, [first, last, _]) = dialog();
        assert_eq!(focusable_children(&doc, modal), vec![first, last]);
    }

    #[test]
    fn hidden_descendants_are_not_focusable() {
        let (mut doc, modal, [first, last, _]) = dialog();
        doc.set_style(first, "display", "none");
        assert_eq!(focusable_children(&doc, modal), vec![last]);
    }

    #[test]
    fn activation_focuses_trap_element() {
        let (mut doc, modal, _) = dialog();
        let mut trap = FocusTrap::new();
        trap.activate(&mut doc, modal);
        assert_eq!(doc.active_element(), Some(modal));
        assert_eq!(trap.active(), Some(modal));
    }

    #[test]
    fn redirect_follows_tab_direction() {
        let (mut doc, modal, [first, last, outside]) = dialog();
        let mut trap = FocusTrap::new();
        assert_eq!(trap.redirect(&doc, outside), None);

        trap.activate(&mut doc, modal);
        assert_eq!(trap.redirect(&doc, first), None);
        assert_eq!(trap.redirect(&doc, outside), Some(first));
        trap.record_tab(true);
        assert_eq!(trap.redirect(&doc, outside), Some(last));

        trap.deactivate(modal);
        assert_eq!(trap.redirect(&doc, outside), None);
    }

    #[test]
    fn empty_trap_redirects_to_itself() {
        let mut doc = Document::new();
        let body = doc.body();
        let modal = doc.build("div").append_to(body);
        let outside = doc.build("button").append_to(body);
        let mut trap = FocusTrap::new();
        trap.activate(&mut doc, modal);
        assert_eq!(trap.redirect(&doc, outside), Some(modal));
    }
}
