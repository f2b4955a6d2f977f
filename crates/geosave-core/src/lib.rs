#![forbid(unsafe_code)]

//! geosave core: weak-reference callables and bindable commands.
//!
//! # Key Components
//!
//! - [`WeakCallable`] - a zero-argument callable that does not keep its
//!   receiver alive (aliases [`WeakAction`] and [`WeakFunc`])
//! - [`Callable`] - static or receiver-bound callable handed to constructors
//! - [`RelayCommand`] - bindable command built from weak callables
//! - [`Command`] - the contract a UI binding layer consumes
//! - [`Signal`] / [`Subscription`] - change notification with RAII detach
//!
//! # Role in geosave
//! View-models construct `RelayCommand`s from their own methods; the UI layer
//! only ever calls `can_execute` / `execute` and listens for
//! `can_execute_changed`. Neither side extends the other's lifetime unless a
//! command is explicitly built with `keep_target_alive`.

pub mod error;
pub mod relay_command;
pub mod signal;
pub mod weak_callable;

pub use error::CommandError;
pub use relay_command::{Command, RelayCommand};
pub use signal::{Signal, Subscription};
pub use weak_callable::{Callable, WeakAction, WeakCallable, WeakFunc};
