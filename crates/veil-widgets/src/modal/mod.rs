#![forbid(unsafe_code)]

//! Modal dialog component.
//!
//! A [`Modal`] binds to an element (normally `div.modal` containing a
//! `.modal-dialog`) and drives its visibility: backdrop, page scrollbar
//! suppression, focus trapping and the five lifecycle events
//! (`show`, `shown`, `hide`, `hidden`, `hidePrevented`, all suffixed
//! `.bs.modal`).
//!
//! Handles are small `Copy` values; all state lives in the [`Page`].
//! Operating on a handle whose instance was disposed fails with
//! [`ModalError::Disposed`].
//!
//! # Example
//!
//! ```ignore
//! let mut page = Page::new(doc);
//! let modal = Modal::new(&mut page, "#confirm", PartialModalOptions::new())?;
//! let _sub = page.events().on(modal.element(), ModalEventKind::Shown, |_| {
//!     println!("visible");
//! });
//! let done = modal.show(&mut page)?;
//! page.run_until_idle();
//! assert_eq!(done.peek(), Some(TransitionOutcome::Completed));
//! ```

mod backdrop;
mod data_api;
mod event;
mod focus_trap;
mod instance;
mod legacy;
mod options;
mod scrollbar;

pub use event::{ModalEvent, ModalEventKind, UnknownEvent};
pub use focus_trap::focusable_children;
pub use legacy::{LegacyCall, ModalMethod};
pub use options::{Backdrop, ModalOptions, PartialModalOptions};

pub(crate) use data_api::handle_click;
pub(crate) use focus_trap::FocusTrap;
pub(crate) use instance::{ModalInstance, Task};

use veil_core::{ElementId, Target};
use veil_runtime::Completion;

use crate::component::{Component, InstanceSerial};
use crate::error::ModalError;
use crate::page::Page;

/// Where a modal is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalPhase {
    Hidden,
    Showing,
    Shown,
    Hiding,
}

/// How a requested transition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionOutcome {
    /// The transition ran to the end.
    Completed,
    /// A `show`/`hide` listener called `prevent_default`.
    Prevented,
    /// The modal was already in (or moving to) the requested state.
    Skipped,
    /// The instance was disposed before the transition finished.
    Aborted,
}

/// Handle to a modal instance bound to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modal {
    element: ElementId,
    serial: InstanceSerial,
}

impl Component for Modal {
    const NAME: &'static str = "modal";
    const DATA_KEY: &'static str = "bs.modal";
    const EVENT_KEY: &'static str = ".bs.modal";

    type Options = ModalOptions;

    fn default_options() -> ModalOptions {
        ModalOptions::DEFAULT
    }
}

impl Modal {
    /// Options used when neither markup nor caller set anything.
    pub const DEFAULT: ModalOptions = ModalOptions::DEFAULT;

    /// Bind a new modal to `target`.
    ///
    /// Options are layered over [`Modal::DEFAULT`]: `data-bs-config`, then
    /// `data-bs-*` attributes, then `options`.
    ///
    /// # Errors
    ///
    /// [`ModalError::ElementNotFound`] if `target` names no element,
    /// [`ModalError::AlreadyBound`] if a modal already lives there, and
    /// option parsing errors from the element's markup.
    pub fn new(
        page: &mut Page,
        target: impl Into<Target>,
        options: PartialModalOptions,
    ) -> Result<Self, ModalError> {
        let element = resolve(page, &target.into())?;
        if page.modals.contains(element) {
            return Err(ModalError::AlreadyBound(element));
        }
        Self::bind(page, element, &options)
    }

    fn bind(
        page: &mut Page,
        element: ElementId,
        options: &PartialModalOptions,
    ) -> Result<Self, ModalError> {
        let resolved = ModalOptions::resolve(page.document(), element, options)?;
        let serial = page.bind_modal(element, resolved);
        Ok(Self { element, serial })
    }

    /// The modal bound to `target`, without creating one.
    #[must_use]
    pub fn get_instance(page: &Page, target: impl Into<Target>) -> Option<Self> {
        let element = page.document().resolve(&target.into()).ok()??;
        let serial = page.modals.serial(element)?;
        Some(Self { element, serial })
    }

    /// The modal bound to `target`, creating it with `options` if needed.
    /// `options` are ignored when an instance already exists.
    pub fn get_or_create_instance(
        page: &mut Page,
        target: impl Into<Target>,
        options: PartialModalOptions,
    ) -> Result<Self, ModalError> {
        let element = resolve(page, &target.into())?;
        match page.modals.serial(element) {
            Some(serial) => Ok(Self { element, serial }),
            None => Self::bind(page, element, &options),
        }
    }

    #[inline]
    #[must_use]
    pub fn element(self) -> ElementId {
        self.element
    }

    /// Whether this handle still refers to a live instance.
    #[must_use]
    pub fn is_bound(self, page: &Page) -> bool {
        page.modals.get(self.element, self.serial).is_some()
    }

    fn instance(self, page: &Page) -> Result<&ModalInstance, ModalError> {
        page.modals
            .get(self.element, self.serial)
            .ok_or(ModalError::Disposed(self.element))
    }

    /// Resolved options.
    pub fn options(self, page: &Page) -> Result<ModalOptions, ModalError> {
        Ok(self.instance(page)?.options)
    }

    pub fn phase(self, page: &Page) -> Result<ModalPhase, ModalError> {
        Ok(self.instance(page)?.phase())
    }

    /// True from the start of `show` until the start of `hide`.
    pub fn is_shown(self, page: &Page) -> Result<bool, ModalError> {
        Ok(self.instance(page)?.is_shown)
    }

    /// Show the modal. `show` fires before this returns; `shown` fires
    /// when the returned completion settles.
    pub fn show(self, page: &mut Page) -> Result<Completion<TransitionOutcome>, ModalError> {
        self.instance(page)?;
        Ok(page.modal_show(self.element, self.serial, None))
    }

    /// Show the modal, reporting `related` as the event's related target.
    pub fn show_from(
        self,
        page: &mut Page,
        related: ElementId,
    ) -> Result<Completion<TransitionOutcome>, ModalError> {
        self.instance(page)?;
        Ok(page.modal_show(self.element, self.serial, Some(related)))
    }

    pub fn hide(self, page: &mut Page) -> Result<Completion<TransitionOutcome>, ModalError> {
        self.instance(page)?;
        Ok(page.modal_hide(self.element, self.serial))
    }

    /// Hide if shown, otherwise show.
    pub fn toggle(self, page: &mut Page) -> Result<Completion<TransitionOutcome>, ModalError> {
        self.toggle_inner(page, None)
    }

    pub fn toggle_from(
        self,
        page: &mut Page,
        related: ElementId,
    ) -> Result<Completion<TransitionOutcome>, ModalError> {
        self.toggle_inner(page, Some(related))
    }

    fn toggle_inner(
        self,
        page: &mut Page,
        related: Option<ElementId>,
    ) -> Result<Completion<TransitionOutcome>, ModalError> {
        if self.instance(page)?.is_shown {
            Ok(page.modal_hide(self.element, self.serial))
        } else {
            Ok(page.modal_show(self.element, self.serial, related))
        }
    }

    /// Recompute scrollbar padding, e.g. after the modal's height changed.
    pub fn handle_update(self, page: &mut Page) -> Result<(), ModalError> {
        self.instance(page)?;
        page.adjust_dialog(self.element, self.serial);
        Ok(())
    }

    /// Unbind the instance. Pending transitions are cancelled and their
    /// completions resolve as [`TransitionOutcome::Aborted`]; the element
    /// is left as it is.
    pub fn dispose(self, page: &mut Page) -> Result<(), ModalError> {
        if page.modal_dispose(self.element, self.serial) {
            Ok(())
        } else {
            Err(ModalError::Disposed(self.element))
        }
    }

    /// Call `method` by value; used by the legacy adapter.
    pub fn invoke(
        self,
        page: &mut Page,
        method: ModalMethod,
        related: Option<ElementId>,
    ) -> Result<(), ModalError> {
        match method {
            ModalMethod::Toggle => {
                self.toggle_inner(page, related)?;
            }
            ModalMethod::Show => {
                self.instance(page)?;
                page.modal_show(self.element, self.serial, related);
            }
            ModalMethod::Hide => {
                self.hide(page)?;
            }
            ModalMethod::HandleUpdate => self.handle_update(page)?,
            ModalMethod::Dispose => self.dispose(page)?,
        }
        Ok(())
    }
}

fn resolve(page: &Page, target: &Target) -> Result<ElementId, ModalError> {
    page.document()
        .resolve(target)?
        .ok_or_else(|| ModalError::ElementNotFound(target.describe()))
}
