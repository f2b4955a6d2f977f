#![forbid(unsafe_code)]

//! Errors surfaced while constructing commands.
//!
//! Construction is the only place a caller can get an error back. Everything
//! that happens later (reclaimed receivers, torn-down callables) is treated as
//! a normal steady state and degrades silently.

use std::fmt;

/// Errors returned by [`RelayCommand::try_new`](crate::RelayCommand::try_new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A mandatory argument was missing.
    InvalidArgument {
        /// Name of the offending parameter.
        name: &'static str,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { name } => write!(f, "invalid argument: {name} is required"),
        }
    }
}

impl std::error::Error for CommandError {}
