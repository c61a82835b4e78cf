#![forbid(unsafe_code)]

//! One-shot completion tokens.
//!
//! A [`Completion<T>`] is the observing half of a one-shot result: it can be
//! polled ([`Completion::peek`]), given callbacks ([`Completion::on_settle`]),
//! or awaited as a [`Future`]. The producing half is a [`Resolver<T>`].
//!
//! # Invariants
//!
//! 1. A completion settles at most once; later `resolve` calls are
//!    impossible because `Resolver::resolve` consumes the resolver.
//! 2. Callbacks run exactly once, in registration order, when the value
//!    arrives (immediately if it already has).
//! 3. Dropping the resolver without resolving leaves the completion pending.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

type SettleCallback<T> = Box<dyn FnOnce(&T)>;

struct Shared<T> {
    value: Option<T>,
    wakers: Vec<Waker>,
    callbacks: Vec<SettleCallback<T>>,
}

/// Observing half of a one-shot result. Cheap to clone.
pub struct Completion<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

/// Producing half of a one-shot result.
pub struct Resolver<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

/// Create a linked resolver/completion pair.
#[must_use]
pub fn completion<T>() -> (Resolver<T>, Completion<T>) {
    let shared = Rc::new(RefCell::new(Shared {
        value: None,
        wakers: Vec::new(),
        callbacks: Vec::new(),
    }));
    (
        Resolver {
            shared: Rc::clone(&shared),
        },
        Completion { shared },
    )
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("value", &self.shared.borrow().value)
            .finish()
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

impl<T> Completion<T> {
    /// An already-settled completion.
    #[must_use]
    pub fn ready(value: T) -> Self {
        let (resolver, completion) = completion();
        resolver.resolve(value);
        completion
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.shared.borrow().value.is_some()
    }

    /// Run `f` with the value once it arrives.
    pub fn on_settle(&self, f: impl FnOnce(&T) + 'static) {
        {
            let shared = self.shared.borrow();
            if let Some(value) = &shared.value {
                f(value);
                return;
            }
        }
        self.shared.borrow_mut().callbacks.push(Box::new(f));
    }
}

impl<T: Clone> Completion<T> {
    /// The value, if settled.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        self.shared.borrow().value.clone()
    }
}

impl<T: Clone> Future for Completion<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut shared = self.shared.borrow_mut();
        if let Some(value) = &shared.value {
            return Poll::Ready(value.clone());
        }
        if !shared.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            shared.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T> Resolver<T> {
    /// Another observer of the same result.
    #[must_use]
    pub fn completion(&self) -> Completion<T> {
        Completion {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Settle the result, run callbacks and wake pending futures.
    pub fn resolve(self, value: T) {
        let (callbacks, wakers) = {
            let mut shared = self.shared.borrow_mut();
            shared.value = Some(value);
            (
                std::mem::take(&mut shared.callbacks),
                std::mem::take(&mut shared.wakers),
            )
        };
        {
            let shared = self.shared.borrow();
            if let Some(value) = &shared.value {
                for callback in callbacks {
                    callback(value);
                }
            }
        }
        for waker in wakers {
            waker.wake();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn poll_once<F: Future + Unpin>(fut: &mut F) -> Poll<F::Output> {
        let mut cx = Context::from_waker(Waker::noop());
        Pin::new(fut).poll(&mut cx)
    }

    #[test]
    fn pending_until_resolved() {
        let (resolver, mut done) = completion::<u8>();
        assert!(!done.is_settled());
        assert_eq!(poll_once(&mut done), Poll::Pending);
        resolver.resolve(7);
        assert_eq!(done.peek(), Some(7));
        assert_eq!(poll_once(&mut done), Poll::Ready(7));
    }

    #[test]
    fn callbacks_run_once_in_order() {
        let (resolver, done) = completion::<&'static str>();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        done.on_settle(move |v| l.borrow_mut().push(format!("first:{v}")));
        let l = Rc::clone(&log);
        done.on_settle(move |v| l.borrow_mut().push(format!("second:{v}")));
        resolver.resolve("ok");
        assert_eq!(*log.borrow(), vec!["first:ok", "second:ok"]);
    }

    #[test]
    fn settled_completion_calls_back_immediately() {
        let done = Completion::ready(3);
        let hit = Rc::new(Cell::new(0));
        let h = Rc::clone(&hit);
        done.on_settle(move |v| h.set(*v));
        assert_eq!(hit.get(), 3);
    }

    #[test]
    fn dropped_resolver_leaves_pending() {
        let (resolver, done) = completion::<()>();
        drop(resolver);
        assert!(!done.is_settled());
    }

    #[test]
    fn clones_share_state() {
        let (resolver, done) = completion::<i32>();
        let other = done.clone();
        let third = resolver.completion();
        resolver.resolve(-1);
        assert_eq!(other.peek(), Some(-1));
        assert_eq!(third.peek(), Some(-1));
    }
}
