#![forbid(unsafe_code)]

//! Modal configuration.
//!
//! Options resolve in layers, later layers winning:
//!
//! 1. [`ModalOptions::DEFAULT`]
//! 2. JSON in the element's `data-bs-config` attribute
//! 3. `data-bs-backdrop`, `data-bs-keyboard`, `data-bs-focus` attributes
//! 4. the [`PartialModalOptions`] passed by the caller
//!
//! Attribute values are strictly typed: flags accept `true`/`false`, the
//! backdrop additionally accepts `static`. Anything else is a
//! [`ModalError::InvalidOption`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veil_core::{Document, ElementId};

use crate::error::ModalError;

/// Backdrop behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "BackdropRepr", into = "BackdropRepr")]
pub enum Backdrop {
    /// No backdrop element; outside clicks do nothing.
    Disabled,
    /// Backdrop shown; clicking outside the dialog hides the modal.
    #[default]
    Dismissible,
    /// Backdrop shown; clicking outside bounces instead of hiding.
    Static,
}

impl Backdrop {
    /// Whether a backdrop element is rendered.
    #[inline]
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<bool> for Backdrop {
    fn from(flag: bool) -> Self {
        if flag { Self::Dismissible } else { Self::Disabled }
    }
}

impl fmt::Display for Backdrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "false",
            Self::Dismissible => "true",
            Self::Static => "static",
        })
    }
}

impl FromStr for Backdrop {
    type Err = ModalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Self::Dismissible),
            "false" => Ok(Self::Disabled),
            "static" => Ok(Self::Static),
            other => Err(ModalError::InvalidOption {
                option: "backdrop",
                value: other.to_owned(),
                expected: "boolean|\"static\"",
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BackdropRepr {
    Flag(bool),
    Word(String),
}

impl TryFrom<BackdropRepr> for Backdrop {
    type Error = String;

    fn try_from(repr: BackdropRepr) -> Result<Self, Self::Error> {
        match repr {
            BackdropRepr::Flag(flag) => Ok(flag.into()),
            BackdropRepr::Word(word) if word == "static" => Ok(Self::Static),
            BackdropRepr::Word(word) => Err(format!(
                "backdrop must be true, false or \"static\", got \"{word}\""
            )),
        }
    }
}

impl From<Backdrop> for BackdropRepr {
    fn from(backdrop: Backdrop) -> Self {
        match backdrop {
            Backdrop::Disabled => Self::Flag(false),
            Backdrop::Dismissible => Self::Flag(true),
            Backdrop::Static => Self::Word("static".to_owned()),
        }
    }
}

/// Fully resolved modal options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalOptions {
    /// Backdrop mode. Default: [`Backdrop::Dismissible`].
    pub backdrop: Backdrop,
    /// Escape hides the modal. Default: `true`.
    pub keyboard: bool,
    /// Focus moves into the modal once shown. Default: `true`.
    pub focus: bool,
}

impl ModalOptions {
    pub const DEFAULT: Self = Self {
        backdrop: Backdrop::Dismissible,
        keyboard: true,
        focus: true,
    };

    #[must_use]
    pub fn backdrop(mut self, backdrop: Backdrop) -> Self {
        self.backdrop = backdrop;
        self
    }

    #[must_use]
    pub fn keyboard(mut self, keyboard: bool) -> Self {
        self.keyboard = keyboard;
        self
    }

    #[must_use]
    pub fn focus(mut self, focus: bool) -> Self {
        self.focus = focus;
        self
    }

    /// Apply the fields set in `patch`.
    #[must_use]
    pub fn merged(self, patch: &PartialModalOptions) -> Self {
        Self {
            backdrop: patch.backdrop.unwrap_or(self.backdrop),
            keyboard: patch.keyboard.unwrap_or(self.keyboard),
            focus: patch.focus.unwrap_or(self.focus),
        }
    }

    /// Resolve the options for `element`: defaults, then the element's
    /// data attributes, then `explicit`.
    pub fn resolve(
        doc: &Document,
        element: ElementId,
        explicit: &PartialModalOptions,
    ) -> Result<Self, ModalError> {
        let from_markup = PartialModalOptions::from_element(doc, element)?;
        Ok(Self::DEFAULT.merged(&from_markup.overlay(explicit)))
    }
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Options with every field optional, merged over the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialModalOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<Backdrop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<bool>,
}

impl PartialModalOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            backdrop: None,
            keyboard: None,
            focus: None,
        }
    }

    #[must_use]
    pub fn backdrop(mut self, backdrop: impl Into<Backdrop>) -> Self {
        self.backdrop = Some(backdrop.into());
        self
    }

    #[must_use]
    pub fn keyboard(mut self, keyboard: bool) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    #[must_use]
    pub fn focus(mut self, focus: bool) -> Self {
        self.focus = Some(focus);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backdrop.is_none() && self.keyboard.is_none() && self.focus.is_none()
    }

    /// Fields set in `top` win over fields set in `self`.
    #[must_use]
    pub fn overlay(self, top: &Self) -> Self {
        Self {
            backdrop: top.backdrop.or(self.backdrop),
            keyboard: top.keyboard.or(self.keyboard),
            focus: top.focus.or(self.focus),
        }
    }

    /// Parse a JSON options object (unknown keys are ignored).
    pub fn from_json(json: &str) -> Result<Self, ModalError> {
        serde_json::from_str(json).map_err(|err| ModalError::InvalidConfig(err.to_string()))
    }

    /// Options declared in markup: `data-bs-config`, then the individual
    /// `data-bs-*` attributes.
    pub fn from_element(doc: &Document, element: ElementId) -> Result<Self, ModalError> {
        let mut patch = match doc.attribute(element, "data-bs-config") {
            Some(json) => Self::from_json(json)?,
            None => Self::new(),
        };
        if let Some(value) = doc.attribute(element, "data-bs-backdrop") {
            patch.backdrop = Some(value.parse()?);
        }
        if let Some(value) = doc.attribute(element, "data-bs-keyboard") {
            patch.keyboard = Some(parse_flag("keyboard", value)?);
        }
        if let Some(value) = doc.attribute(element, "data-bs-focus") {
            patch.focus = Some(parse_flag("focus", value)?);
        }
        Ok(patch)
    }
}

impl From<ModalOptions> for PartialModalOptions {
    fn from(options: ModalOptions) -> Self {
        Self {
            backdrop: Some(options.backdrop),
            keyboard: Some(options.keyboard),
            focus: Some(options.focus),
        }
    }
}

fn parse_flag(option: &'static str, value: &str) -> Result<bool, ModalError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ModalError::InvalidOption {
            option,
            value: other.to_owned(),
            expected: "boolean",
        }),
    }
}
