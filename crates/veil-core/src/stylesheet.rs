#![forbid(unsafe_code)]

//! Transition timing rules.
//!
//! The only styling that matters to overlay sequencing is how long an
//! element's transition takes. A [`Stylesheet`] maps selectors to durations;
//! [`Document::transition_duration`](crate::dom::Document::transition_duration)
//! consults it when an element has no inline timing.

use std::time::Duration;

use crate::dom::{Document, ElementId};
use crate::selector::{Selector, SelectorError};

/// Default timings of the stock overlay theme.
const BOOTSTRAP_TRANSITIONS: &[(&str, u64)] = &[(".fade", 150), (".modal.fade .modal-dialog", 300)];

#[derive(Debug, Clone)]
struct TransitionRule {
    selector: Selector,
    duration: Duration,
}

/// Selector → transition duration table.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<TransitionRule>,
}

impl Stylesheet {
    /// An empty stylesheet: nothing transitions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fade at 150ms, modal dialog slide at 300ms.
    #[must_use]
    pub fn bootstrap() -> Self {
        let rules = BOOTSTRAP_TRANSITIONS
            .iter()
            .filter_map(|(sel, ms)| {
                Selector::parse(sel).ok().map(|selector| TransitionRule {
                    selector,
                    duration: Duration::from_millis(*ms),
                })
            })
            .collect();
        Self { rules }
    }

    /// Add a rule.
    pub fn add_transition(
        &mut self,
        selector: &str,
        duration: Duration,
    ) -> Result<&mut Self, SelectorError> {
        self.rules.push(TransitionRule {
            selector: Selector::parse(selector)?,
            duration,
        });
        Ok(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Longest duration among rules matching `id`.
    #[must_use]
    pub fn duration_for(&self, doc: &Document, id: ElementId) -> Duration {
        self.rules
            .iter()
            .filter(|rule| rule.selector.matches(doc, id))
            .map(|rule| rule.duration)
            .max()
            .unwrap_or_default()
    }
}

/// Parse a CSS `<time>` list, keeping only the first entry (`"0.3s, 1s"` → 300ms).
#[must_use]
pub fn parse_css_time(value: &str) -> Option<Duration> {
    let first = value.split(',').next()?.trim();
    let (number, scale) = if let Some(ms) = first.strip_suffix("ms") {
        (ms, 1.0)
    } else if let Some(s) = first.strip_suffix('s') {
        (s, 1000.0)
    } else {
        return None;
    };
    let parsed: f64 = number.trim().parse().ok()?;
    if !parsed.is_finite() || parsed < 0.0 {
        return None;
    }
    Some(Duration::from_micros((parsed * scale * 1000.0).round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_time_units() {
        assert_eq!(parse_css_time("150ms"), Some(Duration::from_millis(150)));
        assert_eq!(parse_css_time(".3s"), Some(Duration::from_millis(300)));
        assert_eq!(parse_css_time("0s"), Some(Duration::ZERO));
        assert_eq!(parse_css_time("0.2s, 1s"), Some(Duration::from_millis(200)));
        assert_eq!(parse_css_time("fast"), None);
        assert_eq!(parse_css_time("-1s"), None);
    }

    #[test]
    fn longest_matching_rule_wins() {
        let mut sheet = Stylesheet::bootstrap();
        sheet
            .add_transition(".slow", Duration::from_millis(900))
            .unwrap();
        let mut doc = Document::new().with_stylesheet(sheet);
        let body = doc.body();
        let modal = doc.build("div").class("modal fade").append_to(body);
        let dialog = doc.build("div").class("modal-dialog").append_to(modal);
        let plain = doc.build("div").append_to(body);
        let slow = doc.build("div").class("fade slow").append_to(body);

        assert_eq!(doc.transition_duration(modal), Duration::from_millis(150));
        assert_eq!(doc.transition_duration(dialog), Duration::from_millis(300));
        assert_eq!(doc.transition_duration(plain), Duration::ZERO);
        assert_eq!(doc.transition_duration(slow), Duration::from_millis(900));
    }

    #[test]
    fn invalid_rule_is_rejected() {
        let mut sheet = Stylesheet::new();
        assert!(sheet.add_transition("[", Duration::ZERO).is_err());
        assert!(sheet.is_empty());
    }
}
