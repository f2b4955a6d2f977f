#![forbid(unsafe_code)]

//! Bindable commands backed by weak callables.
//!
//! A UI binding layer talks to commands through the [`Command`] trait:
//! `can_execute`, `execute`, and a "may have changed" notification.
//! [`RelayCommand`] is the stock implementation. It wraps its execution logic
//! and optional predicate in [`WeakCallable`]s, so a button bound to a
//! view-model method never keeps that view-model alive on its own.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use geosave_core::{Callable, RelayCommand};
//!
//! struct Counter { hits: Cell<u32> }
//! impl Counter {
//!     fn bump(&self) { self.hits.set(self.hits.get() + 1); }
//! }
//!
//! let counter = Rc::new(Counter { hits: Cell::new(0) });
//! let command = RelayCommand::new(Callable::bound(&counter, Counter::bump));
//!
//! command.execute(None);
//! assert_eq!(counter.hits.get(), 1);
//!
//! drop(counter);
//! command.execute(None); // receiver gone: silently does nothing
//! ```

use std::any::Any;
use std::fmt;

use web_time::Instant;

use crate::error::CommandError;
use crate::signal::{Signal, Subscription};
use crate::weak_callable::{Callable, WeakAction, WeakFunc};

/// The contract a UI binding layer consumes.
///
/// The `parameter` passed to both methods is part of the binding contract;
/// implementations are free to ignore it.
pub trait Command {
    /// Whether the command is currently enabled.
    fn can_execute(&self, parameter: Option<&dyn Any>) -> bool;

    /// Run the command.
    fn execute(&self, parameter: Option<&dyn Any>);

    /// Be told when [`can_execute`](Self::can_execute) may return something
    /// different. The handler stays attached while the guard lives.
    fn subscribe_can_execute_changed(&self, handler: Box<dyn Fn()>) -> Subscription;
}

/// A command that relays to weakly held callables.
///
/// Built once (usually lazily by its view-model) and queried for as long as
/// the view lives. There is no destroyed state: once the receivers go away,
/// `can_execute` degrades to `false` and `execute` to a no-op.
pub struct RelayCommand {
    execute: WeakAction,
    can_execute: Option<WeakFunc<bool>>,
    can_execute_changed: Signal,
}

impl RelayCommand {
    /// A command that is always enabled. The receiver is held weakly.
    pub fn new(execute: Callable<()>) -> Self {
        Self::with_options(execute, None, false)
    }

    /// A command enabled by `can_execute`. Both receivers are held weakly.
    pub fn with_predicate(execute: Callable<()>, can_execute: Callable<bool>) -> Self {
        Self::with_options(execute, Some(can_execute), false)
    }

    /// An always-enabled command that keeps its receiver alive.
    ///
    /// Use this when the receiver exists only for the command, such as a
    /// context built just to capture state for it. Nothing else would keep it
    /// alive.
    pub fn keep_alive(execute: Callable<()>) -> Self {
        Self::with_options(execute, None, true)
    }

    /// Full constructor. `keep_target_alive` applies to both callables.
    pub fn with_options(
        execute: Callable<()>,
        can_execute: Option<Callable<bool>>,
        keep_target_alive: bool,
    ) -> Self {
        Self {
            execute: WeakAction::new(execute, keep_target_alive),
            can_execute: can_execute.map(|p| WeakFunc::new(p, keep_target_alive)),
            can_execute_changed: Signal::new(),
        }
    }

    /// Checked constructor for callers whose execute callable may be missing.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidArgument`] when `execute` is `None`.
    pub fn try_new(
        execute: Option<Callable<()>>,
        can_execute: Option<Callable<bool>>,
        keep_target_alive: bool,
    ) -> Result<Self, CommandError> {
        let execute = execute.ok_or(CommandError::InvalidArgument { name: "execute" })?;
        Ok(Self::with_options(execute, can_execute, keep_target_alive))
    }

    /// Whether the command is currently enabled. `_parameter` is ignored.
    ///
    /// Without a predicate this is always `true`. With one, the predicate runs
    /// only if it is static or its receiver is alive; otherwise `false`.
    pub fn can_execute(&self, _parameter: Option<&dyn Any>) -> bool {
        let Some(predicate) = &self.can_execute else {
            return true;
        };

        if predicate.is_static() || predicate.is_alive() {
            return predicate.execute();
        }

        tracing::trace!(
            target: "geosave.command",
            predicate = predicate.method_name().unwrap_or("<deleted>"),
            "predicate receiver reclaimed; command disabled"
        );
        false
    }

    /// Run the command if it is enabled and its receiver is reachable.
    /// `parameter` is ignored.
    pub fn execute(&self, parameter: Option<&dyn Any>) {
        if !self.can_execute(parameter) {
            return;
        }
        if !(self.execute.is_static() || self.execute.is_alive()) {
            return;
        }

        let method = self.execute.method_name().unwrap_or("<deleted>");
        let start = Instant::now();
        let span = tracing::debug_span!(
            "command.execute",
            method = %method,
            duration_us = tracing::field::Empty,
        )
        .entered();

        self.execute.execute();

        let duration_us = start.elapsed().as_micros() as u64;
        span.record("duration_us", duration_us);
    }

    /// Notify every current subscriber that enablement may have changed.
    pub fn raise_can_execute_changed(&self) {
        let notified = self.can_execute_changed.emit(&());
        tracing::trace!(target: "geosave.command", notified, "can_execute_changed raised");
    }

    /// Attach a handler to the "may have changed" signal.
    pub fn on_can_execute_changed(&self, handler: impl Fn() + 'static) -> Subscription {
        self.can_execute_changed.subscribe(move |_| handler())
    }

    /// The wrapped execution callable.
    #[must_use]
    pub fn execute_callable(&self) -> &WeakAction {
        &self.execute
    }

    /// The wrapped predicate, if any.
    #[must_use]
    pub fn can_execute_callable(&self) -> Option<&WeakFunc<bool>> {
        self.can_execute.as_ref()
    }
}

impl Command for RelayCommand {
    fn can_execute(&self, parameter: Option<&dyn Any>) -> bool {
        RelayCommand::can_execute(self, parameter)
    }

    fn execute(&self, parameter: Option<&dyn Any>) {
        RelayCommand::execute(self, parameter);
    }

    fn subscribe_can_execute_changed(&self, handler: Box<dyn Fn()>) -> Subscription {
        self.on_can_execute_changed(handler)
    }
}

impl fmt::Debug for RelayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayCommand")
            .field("execute", &self.execute)
            .field("can_execute", &self.can_execute)
            .field("subscribers", &self.can_execute_changed.subscriber_count())
            .finish()
    }
}
