#![forbid(unsafe_code)]

//! Input events delivered to a page.
//!
//! These are the user-originated signals overlay components react to:
//! keys, mouse presses and clicks, focus moves, and window resizes. Every
//! pointer or keyboard event names the element it was aimed at.

use bitflags::bitflags;

use crate::dom::{ElementId, Viewport};

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// Logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Tab,
    Enter,
    Char(char),
}

/// A key press aimed at `target` (normally the focused element).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub target: ElementId,
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(target: ElementId, code: KeyCode) -> Self {
        Self {
            target,
            code,
            modifiers: Modifiers::empty(),
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Input delivered to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    /// Primary button pressed over `target`.
    MouseDown { target: ElementId },
    /// Primary button released over `target` after a press.
    Click { target: ElementId },
    /// `target` is about to receive focus.
    FocusIn { target: ElementId },
    /// The window changed size (or its scrollbar appeared/disappeared).
    Resize(Viewport),
}

impl InputEvent {
    /// Escape pressed on `target`.
    #[must_use]
    pub const fn escape(target: ElementId) -> Self {
        Self::Key(KeyEvent::new(target, KeyCode::Escape))
    }

    /// The element the event is aimed at, if any.
    #[must_use]
    pub const fn target(&self) -> Option<ElementId> {
        match self {
            Self::Key(key) => Some(key.target),
            Self::MouseDown { target } | Self::Click { target } | Self::FocusIn { target } => {
                Some(*target)
            }
            Self::Resize(_) => None,
        }
    }
}
