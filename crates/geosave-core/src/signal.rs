#![forbid(unsafe_code)]

//! Multicast change signal with RAII subscriptions.
//!
//! # Design
//!
//! [`Signal<A>`] keeps its handlers as `Weak<dyn Fn(&A)>`. The strong side of
//! each handler lives in the [`Subscription`] guard returned by
//! [`Signal::subscribe`], so the signal never extends the lifetime of an
//! observer: dropping the guard detaches the handler.
//!
//! `A` is the payload type. Command enablement uses `Signal<()>`; property
//! notification uses `Signal<str>` and passes the property name.
//!
//! # Failure Modes
//!
//! - **Re-entrant emit**: handlers may subscribe, unsubscribe or emit again
//!   from inside a callback. Live handlers are collected before any of them
//!   runs, so a handler added during an emit is first called on the next one.
//! - **Leaked guards**: a guard kept forever keeps its handler alive. Dead
//!   entries are pruned lazily during [`Signal::emit`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type HandlerRc<A> = Rc<dyn Fn(&A)>;
type HandlerWeak<A> = Weak<dyn Fn(&A)>;

/// A subscribable "something happened" signal.
///
/// Cloning a `Signal` creates another handle to the same handler list.
pub struct Signal<A: ?Sized + 'static = ()> {
    handlers: Rc<RefCell<Vec<HandlerWeak<A>>>>,
}

impl<A: ?Sized + 'static> Clone for Signal<A> {
    fn clone(&self) -> Self {
        Self {
            handlers: Rc::clone(&self.handlers),
        }
    }
}

impl<A: ?Sized + 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized + 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl<A: ?Sized + 'static> Signal<A> {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register `handler`. It stays attached for as long as the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, handler: impl Fn(&A) + 'static) -> Subscription {
        let strong: HandlerRc<A> = Rc::new(handler);
        self.handlers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Call every live handler once with `args`. Returns how many handlers
    /// were called.
    pub fn emit(&self, args: &A) -> usize {
        let live: Vec<HandlerRc<A>> = {
            let mut handlers = self.handlers.borrow_mut();
            handlers.retain(|w| w.strong_count() > 0);
            handlers.iter().filter_map(Weak::upgrade).collect()
        };

        for handler in &live {
            handler(args);
        }
        live.len()
    }

    /// Registered handlers, including detached ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Handlers whose subscription guard is still alive.
    #[must_use]
    pub fn live_subscriber_count(&self) -> usize {
        self.handlers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// RAII guard for a [`Signal`] handler.
///
/// Dropping the guard (or calling [`Subscription::unsubscribe`]) releases the
/// only strong reference to the handler, so the signal can no longer upgrade
/// its weak entry.
#[must_use = "dropping a Subscription detaches its handler immediately"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// Detach the handler now.
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
