#![forbid(unsafe_code)]

//! jQuery-style adapter: `$(selector).modal(config, relatedTarget)`.
//!
//! The loosely typed `config` argument (options object *or* method name)
//! becomes the closed [`LegacyCall`] enum; method names are parsed up
//! front so an unknown name never reaches an instance.

use std::fmt;
use std::str::FromStr;

use veil_core::{ElementId, Target};

use super::{Modal, ModalOptions, PartialModalOptions};
use crate::error::ModalError;
use crate::page::Page;

/// Methods callable by name through the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalMethod {
    Toggle,
    Show,
    Hide,
    HandleUpdate,
    Dispose,
}

impl ModalMethod {
    pub const ALL: [Self; 5] = [
        Self::Toggle,
        Self::Show,
        Self::Hide,
        Self::HandleUpdate,
        Self::Dispose,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Show => "show",
            Self::Hide => "hide",
            Self::HandleUpdate => "handleUpdate",
            Self::Dispose => "dispose",
        }
    }
}

impl fmt::Display for ModalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModalMethod {
    type Err = ModalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.name() == s)
            .ok_or_else(|| ModalError::UnknownMethod(s.to_owned()))
    }
}

/// The adapter's first argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyCall {
    /// Create (or look up) instances with these options.
    Configure(PartialModalOptions),
    /// Create (or look up) instances, then call a method.
    Invoke(ModalMethod),
}

impl Default for LegacyCall {
    fn default() -> Self {
        Self::Configure(PartialModalOptions::new())
    }
}

impl From<PartialModalOptions> for LegacyCall {
    fn from(options: PartialModalOptions) -> Self {
        Self::Configure(options)
    }
}

impl From<ModalMethod> for LegacyCall {
    fn from(method: ModalMethod) -> Self {
        Self::Invoke(method)
    }
}

impl FromStr for LegacyCall {
    type Err = ModalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self::Invoke)
    }
}

impl Modal {
    /// Apply `call` to every element `target` matches.
    ///
    /// Each element gets an instance via
    /// [`get_or_create_instance`](Modal::get_or_create_instance); options
    /// only apply to elements that had none. `related` is passed to
    /// `show`/`toggle`. Matching nothing is not an error.
    ///
    /// Markup options of every unbound match are checked before any
    /// instance is created, so a bad `data-bs-*` value on one element binds
    /// none of them.
    pub fn legacy_interface(
        page: &mut Page,
        target: impl Into<Target>,
        call: impl Into<LegacyCall>,
        related: Option<ElementId>,
    ) -> Result<(), ModalError> {
        let call = call.into();
        let elements = page.document().resolve_all(&target.into())?;
        tracing::debug!(?call, matched = elements.len(), "legacy modal call");
        let explicit = match call {
            LegacyCall::Configure(options) => options,
            LegacyCall::Invoke(_) => PartialModalOptions::new(),
        };
        for &element in &elements {
            if Modal::get_instance(page, element).is_none() {
                ModalOptions::resolve(page.document(), element, &explicit)?;
            }
        }
        for element in elements {
            match call {
                LegacyCall::Configure(options) => {
                    Modal::get_or_create_instance(page, element, options)?;
                }
                LegacyCall::Invoke(method) => {
                    let modal =
                        Modal::get_or_create_instance(page, element, PartialModalOptions::new())?;
                    modal.invoke(page, method, related)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_round_trip() {
        for method in ModalMethod::ALL {
            assert_eq!(method.name().parse::<ModalMethod>(), Ok(method));
        }
        assert_eq!("handleUpdate".parse(), Ok(ModalMethod::HandleUpdate));
    }

    #[test]
    fn unknown_method_is_an_error() {
        assert_eq!(
            "open".parse::<LegacyCall>(),
            Err(ModalError::UnknownMethod("open".into()))
        );
        assert!("handle_update".parse::<ModalMethod>().is_err());
    }

    #[test]
    fn default_call_configures_with_defaults() {
        assert_eq!(
            LegacyCall::default(),
            LegacyCall::Configure(PartialModalOptions::new())
        );
        assert_eq!(
            LegacyCall::from(ModalMethod::Show),
            LegacyCall::Invoke(ModalMethod::Show)
        );
    }
}
