#![forbid(unsafe_code)]

//! Page scrollbar suppression and layout compensation.
//!
//! While a modal is open the page must not scroll, but removing the
//! scrollbar would shift content sideways. [`hide`] therefore sets
//! `overflow: hidden` on `<body>` and pads `<body>` plus fixed/sticky
//! elements by the scrollbar width. [`reset`] puts every touched inline
//! value back.
//!
//! # Invariants
//!
//! - Every property changed by [`hide`] is either saved in a
//!   `data-bs-<property>` attribute (if it had an inline value) or absent
//!   from that attribute (if it did not); [`reset`] restores or removes it
//!   accordingly.
//! - `hide` followed by `reset` leaves inline styles as they were.
//! - While `<body>` has `overflow: hidden` the page has no scrollbar, so
//!   [`width`] is 0 and a second `hide` adds no further padding.

use veil_core::{Document, ElementId, Selector};

const FIXED_CONTENT: &str = ".fixed-top, .fixed-bottom, .is-fixed, .sticky-top";
const STICKY_CONTENT: &str = ".sticky-top";

const OVERFLOW: &str = "overflow";
const PADDING_RIGHT: &str = "padding-right";
const MARGIN_RIGHT: &str = "margin-right";

/// Width of the page's vertical scrollbar.
#[must_use]
pub fn width(doc: &Document) -> u32 {
    if doc.style(doc.body(), OVERFLOW) == Some("hidden") {
        return 0;
    }
    doc.viewport().scrollbar_width()
}

/// Hide the page scrollbar and compensate layout for its width.
pub fn hide(doc: &mut Document) {
    let width = width(doc);
    let body = doc.body();
    save_initial(doc, body, OVERFLOW);
    doc.set_style(body, OVERFLOW, "hidden");
    if width == 0 {
        return;
    }
    let w = f64::from(width);
    adjust(doc, &[body], width, PADDING_RIGHT, |v| v + w);
    let fixed = select(doc, FIXED_CONTENT);
    adjust(doc, &fixed, width, PADDING_RIGHT, |v| v + w);
    let sticky = select(doc, STICKY_CONTENT);
    adjust(doc, &sticky, width, MARGIN_RIGHT, |v| v - w);
    tracing::trace!(width, fixed = fixed.len(), sticky = sticky.len(), "scrollbar hidden");
}

/// Undo [`hide`].
pub fn reset(doc: &mut Document) {
    let body = doc.body();
    restore(doc, body, OVERFLOW);
    restore(doc, body, PADDING_RIGHT);
    for el in select(doc, FIXED_CONTENT) {
        restore(doc, el, PADDING_RIGHT);
    }
    for el in select(doc, STICKY_CONTENT) {
        restore(doc, el, MARGIN_RIGHT);
    }
}

fn select(doc: &Document, selector: &str) -> Vec<ElementId> {
    match Selector::parse(selector) {
        Ok(sel) => doc.select_all(&sel),
        Err(_) => Vec::new(),
    }
}

fn adjust(
    doc: &mut Document,
    elements: &[ElementId],
    width: u32,
    property: &str,
    f: impl Fn(f64) -> f64,
) {
    let inner_width = doc.viewport().inner_width;
    let body = doc.body();
    for &el in elements {
        if el != body && inner_width > doc.metrics(el).client_width.saturating_add(width) {
            continue;
        }
        save_initial(doc, el, property);
        let current = doc.style(el, property).map_or(0.0, parse_px);
        doc.set_style(el, property, format!("{}px", f(current)));
    }
}

fn data_key(property: &str) -> String {
    format!("data-bs-{property}")
}

fn save_initial(doc: &mut Document, el: ElementId, property: &str) {
    if let Some(value) = doc.style(el, property).map(str::to_owned) {
        doc.set_attribute(el, &data_key(property), value);
    }
}

fn restore(doc: &mut Document, el: ElementId, property: &str) {
    let key = data_key(property);
    match doc.attribute(el, &key).map(str::to_owned) {
        Some(value) => {
            doc.remove_attribute(el, &key);
            doc.set_style(el, property, value);
        }
        None => doc.remove_style(el, property),
    }
}

/// Leading numeric part of a CSS length, like `parseFloat`.
fn parse_px(value: &str) -> f64 {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse().unwrap_or(0.0)
}
