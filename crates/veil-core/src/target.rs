#![forbid(unsafe_code)]

//! Element-or-selector argument type.

use crate::dom::ElementId;

/// Names an element either directly or through a selector string.
///
/// Resolved with [`Document::resolve`](crate::dom::Document::resolve).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Element(ElementId),
    Selector(String),
}

impl Target {
    /// Human-readable form for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Element(id) => id.to_string(),
            Self::Selector(sel) => sel.clone(),
        }
    }
}

impl From<ElementId> for Target {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_owned())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<&String> for Target {
    fn from(selector: &String) -> Self {
        Self::Selector(selector.clone())
    }
}
