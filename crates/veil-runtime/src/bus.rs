#![forbid(unsafe_code)]

//! Typed event bus with bubbling dispatch.
//!
//! An [`EventBus<N, E>`] routes events of type `E` to listeners attached to
//! nodes of type `N`. Dispatch walks a caller-supplied propagation path
//! (target first, then ancestors) and invokes, at each node, the listeners
//! registered there whose kind filter accepts the event.
//!
//! # Architecture
//!
//! The bus uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Callbacks are held strongly by the returned [`Subscription`] and only
//! weakly by the bus; dead entries are pruned lazily during dispatch.
//!
//! # Invariants
//!
//! 1. Listeners on one node run in registration order.
//! 2. Nodes are visited in path order; a listener that stops propagation
//!    lets the remaining listeners on the current node run, then halts.
//! 3. A `once` listener runs at most one time.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    dispatch.
//! 5. Listeners may subscribe or dispatch re-entrantly: the bus is not
//!    borrowed while callbacks run. Listeners added during a dispatch do
//!    not see that dispatch.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// An event that can travel through an [`EventBus`].
pub trait BusEvent {
    /// Discriminant used to filter listeners.
    type Kind: Copy + Eq + fmt::Debug;

    fn kind(&self) -> Self::Kind;

    /// Whether a listener asked to stop bubbling.
    fn propagation_stopped(&self) -> bool {
        false
    }
}

type Callback<E> = dyn Fn(&E);

struct Listener<N, E: BusEvent> {
    node: N,
    filter: Option<E::Kind>,
    once: bool,
    fired: bool,
    callback: Weak<Callback<E>>,
}

struct BusInner<N, E: BusEvent> {
    listeners: Vec<Listener<N, E>>,
}

/// RAII guard for a registered listener. Drop it to unsubscribe.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Shared, cloneable event bus.
pub struct EventBus<N, E: BusEvent> {
    inner: Rc<RefCell<BusInner<N, E>>>,
}

impl<N, E: BusEvent> Clone for EventBus<N, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N, E: BusEvent> fmt::Debug for EventBus<N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.inner.borrow().listeners.len())
            .finish()
    }
}

impl<N: Copy + Eq + 'static, E: BusEvent + 'static> Default for EventBus<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy + Eq + 'static, E: BusEvent + 'static> EventBus<N, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                listeners: Vec::new(),
            })),
        }
    }

    /// Listen for events of `kind` reaching `node`.
    pub fn on(&self, node: N, kind: E::Kind, f: impl Fn(&E) + 'static) -> Subscription {
        self.register(node, Some(kind), false, f)
    }

    /// Listen for every event reaching `node`.
    pub fn on_any(&self, node: N, f: impl Fn(&E) + 'static) -> Subscription {
        self.register(node, None, false, f)
    }

    /// Listen for the next event of `kind` reaching `node`, then stop.
    pub fn once(&self, node: N, kind: E::Kind, f: impl Fn(&E) + 'static) -> Subscription {
        self.register(node, Some(kind), true, f)
    }

    fn register(
        &self,
        node: N,
        filter: Option<E::Kind>,
        once: bool,
        f: impl Fn(&E) + 'static,
    ) -> Subscription {
        let callback: Rc<Callback<E>> = Rc::new(f);
        self.inner.borrow_mut().listeners.push(Listener {
            node,
            filter,
            once,
            fired: false,
            callback: Rc::downgrade(&callback),
        });
        Subscription {
            _callback: Box::new(callback),
        }
    }

    /// Number of listeners whose subscription is still alive.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| !l.fired && l.callback.strong_count() > 0)
            .count()
    }

    /// Deliver `event` along `path`. Returns how many listeners ran.
    pub fn dispatch(&self, path: &[N], event: &E) -> usize {
        let kind = event.kind();
        let mut invoked = 0;
        for node in path {
            let callbacks = self.collect(*node, kind);
            for callback in &callbacks {
                callback(event);
                invoked += 1;
            }
            if event.propagation_stopped() {
                tracing::trace!(?kind, "propagation stopped");
                break;
            }
        }
        invoked
    }

    fn collect(&self, node: N, kind: E::Kind) -> Vec<Rc<Callback<E>>> {
        let mut inner = self.inner.borrow_mut();
        inner
            .listeners
            .retain(|l| !l.fired && l.callback.strong_count() > 0);
        let mut out = Vec::new();
        for listener in inner.listeners.iter_mut() {
            if listener.node != node || listener.filter.is_some_and(|k| k != kind) {
                continue;
            }
            if let Some(cb) = listener.callback.upgrade() {
                listener.fired = listener.once;
                out.push(cb);
            }
        }
        out
    }
}
