#![forbid(unsafe_code)]

//! Lifecycle events fired through a modal's element.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use veil_core::ElementId;
use veil_runtime::BusEvent;

/// The five modal lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalEventKind {
    /// Before showing; cancelable.
    Show,
    /// After the show transition.
    Shown,
    /// Before hiding; cancelable.
    Hide,
    /// After the hide transition.
    Hidden,
    /// A dismissal was refused (static backdrop or `keyboard: false`).
    HidePrevented,
}

impl ModalEventKind {
    pub const ALL: [Self; 5] = [
        Self::Show,
        Self::Shown,
        Self::Hide,
        Self::Hidden,
        Self::HidePrevented,
    ];

    /// Un-namespaced phase, e.g. `"hidePrevented"`.
    #[must_use]
    pub const fn phase(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Shown => "shown",
            Self::Hide => "hide",
            Self::Hidden => "hidden",
            Self::HidePrevented => "hidePrevented",
        }
    }

    /// Canonical event name, e.g. `"show.bs.modal"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Show => "show.bs.modal",
            Self::Shown => "shown.bs.modal",
            Self::Hide => "hide.bs.modal",
            Self::Hidden => "hidden.bs.modal",
            Self::HidePrevented => "hidePrevented.bs.modal",
        }
    }

    #[must_use]
    pub const fn is_cancelable(self) -> bool {
        matches!(self, Self::Show | Self::Hide | Self::HidePrevented)
    }
}

impl fmt::Display for ModalEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown modal event '{}'", self.0)
    }
}

impl std::error::Error for UnknownEvent {}

impl FromStr for ModalEventKind {
    type Err = UnknownEvent;

    /// Accepts both `"show"` and `"show.bs.modal"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let phase = s.strip_suffix(".bs.modal").unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|kind| kind.phase() == phase)
            .ok_or_else(|| UnknownEvent(s.to_owned()))
    }
}

/// A lifecycle event in flight.
///
/// Listeners receive `&ModalEvent`; cancellation and propagation flags are
/// interior-mutable so any listener on the path can set them.
#[derive(Debug)]
pub struct ModalEvent {
    kind: ModalEventKind,
    target: ElementId,
    related_target: Option<ElementId>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl ModalEvent {
    #[must_use]
    pub fn new(kind: ModalEventKind, target: ElementId, related_target: Option<ElementId>) -> Self {
        Self {
            kind,
            target,
            related_target,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ModalEventKind {
        self.kind
    }

    /// The modal element.
    #[must_use]
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// The element that triggered `show`/`shown`, if any.
    #[must_use]
    pub fn related_target(&self) -> Option<ElementId> {
        self.related_target
    }

    /// Cancel the default action. No-op for non-cancelable kinds.
    pub fn prevent_default(&self) {
        if self.kind.is_cancelable() {
            self.default_prevented.set(true);
        }
    }

    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Stop bubbling after the current element's listeners.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }
}

impl BusEvent for ModalEvent {
    type Kind = ModalEventKind;

    fn kind(&self) -> ModalEventKind {
        self.kind
    }

    fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::Document;

    #[test]
    fn names_are_namespaced() {
        let names: Vec<_> = ModalEventKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            [
                "show.bs.modal",
                "shown.bs.modal",
                "hide.bs.modal",
                "hidden.bs.modal",
                "hidePrevented.bs.modal"
            ]
        );
    }

    #[test]
    fn parse_accepts_short_and_full_names() {
        assert_eq!("hidePrevented".parse(), Ok(ModalEventKind::HidePrevented));
        assert_eq!("shown.bs.modal".parse(), Ok(ModalEventKind::Shown));
        assert!("shown.bs.tooltip".parse::<ModalEventKind>().is_err());
    }

    #[test]
    fn only_cancelable_kinds_can_be_prevented() {
        let mut doc = Document::new();
        let el = doc.create_element("div");

        let show = ModalEvent::new(ModalEventKind::Show, el, None);
        show.prevent_default();
        assert!(show.is_default_prevented());

        let shown = ModalEvent::new(ModalEventKind::Shown, el, None);
        shown.prevent_default();
        assert!(!shown.is_default_prevented());
    }
}
