#![forbid(unsafe_code)]

//! Overlay components for veil.
//!
//! Components bind to elements of a [`veil_core::Document`] hosted by a
//! [`Page`]. The page routes input, advances transitions on a virtual
//! clock and fires lifecycle events through the bound element.

pub mod component;
pub mod error;
pub mod modal;
pub mod page;

pub use component::{Component, ComponentData, InstanceSerial, VERSION};
pub use error::ModalError;
pub use modal::{
    Backdrop, LegacyCall, Modal, ModalEvent, ModalEventKind, ModalMethod, ModalOptions,
    ModalPhase, PartialModalOptions, TransitionOutcome,
};
pub use page::Page;
