#![forbid(unsafe_code)]

//! Errors surfaced by component operations.
//!
//! All of these are caller-usage errors: nothing here is retried
//! internally.

use std::fmt;

use veil_core::{ElementId, SelectorError};

/// Errors from component construction, configuration, and invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// The element or selector did not resolve to a document element.
    ElementNotFound(String),
    /// A selector argument could not be parsed.
    InvalidSelector(SelectorError),
    /// The element already has a modal bound; use `get_or_create_instance`.
    AlreadyBound(ElementId),
    /// The handle refers to an instance that was disposed.
    Disposed(ElementId),
    /// The legacy adapter was given a method name it does not know.
    UnknownMethod(String),
    /// A configuration value had the wrong type.
    InvalidOption {
        option: &'static str,
        value: String,
        expected: &'static str,
    },
    /// `data-bs-config` was not a valid JSON options object.
    InvalidConfig(String),
}

impl fmt::Display for ModalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementNotFound(target) => write!(f, "no element matches '{target}'"),
            Self::InvalidSelector(err) => write!(f, "invalid selector: {err}"),
            Self::AlreadyBound(el) => write!(f, "a modal is already bound to element {el}"),
            Self::Disposed(el) => write!(f, "the modal bound to element {el} was disposed"),
            Self::UnknownMethod(name) => write!(f, "No method named \"{name}\""),
            Self::InvalidOption {
                option,
                value,
                expected,
            } => write!(
                f,
                "MODAL: Option \"{option}\" provided value \"{value}\" but expected type \"{expected}\""
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid modal config: {msg}"),
        }
    }
}

impl std::error::Error for ModalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSelector(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SelectorError> for ModalError {
    fn from(err: SelectorError) -> Self {
        Self::InvalidSelector(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use veil_core::Selector;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            ModalError::UnknownMethod("open".into()).to_string(),
            "No method named \"open\""
        );
        let err = ModalError::InvalidOption {
            option: "keyboard",
            value: "yes".into(),
            expected: "boolean",
        };
        assert!(err.to_string().contains("\"keyboard\""));
    }

    #[test]
    fn selector_errors_keep_their_source() {
        let sel_err = Selector::parse("[").unwrap_err();
        let err = ModalError::from(sel_err.clone());
        assert_eq!(err, ModalError::InvalidSelector(sel_err));
        assert!(err.source().is_some());
    }
}
