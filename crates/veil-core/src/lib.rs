#![forbid(unsafe_code)]

//! Core types for veil: the document model components bind to, the
//! selector engine used to find elements, transition timing, and input
//! events.

pub mod dom;
pub mod event;
pub mod selector;
pub mod stylesheet;
pub mod target;

pub use dom::{BoxMetrics, Direction, Document, Element, ElementBuilder, ElementId, Viewport};
pub use event::{InputEvent, KeyCode, KeyEvent, Modifiers};
pub use selector::{Selector, SelectorError, SelectorErrorKind};
pub use stylesheet::Stylesheet;
pub use target::Target;
