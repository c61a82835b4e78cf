#![forbid(unsafe_code)]

//! Runtime plumbing for veil components.
//!
//! - [`EventBus`]: typed listeners with bubbling dispatch and RAII
//!   [`Subscription`]s.
//! - [`Timeline`]: deterministic task queue over a virtual clock, standing
//!   in for transition timers.
//! - [`Completion`]: one-shot result tokens that can be polled, observed
//!   through callbacks, or awaited.

pub mod bus;
pub mod completion;
pub mod timeline;

pub use bus::{BusEvent, EventBus, Subscription};
pub use completion::{Completion, Resolver, completion};
pub use timeline::{TaskId, Timeline};
