#![forbid(unsafe_code)]

//! geosave public facade crate.
//!
//! This crate provides the stable surface area for applications. It
//! re-exports the command types from `geosave-core`, the view-model runtime
//! from `geosave-runtime` (feature `runtime`, on by default), and offers a
//! prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use geosave_core::{
    Callable, Command, CommandError, RelayCommand, Signal, Subscription, WeakAction, WeakCallable,
    WeakFunc,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use geosave_runtime::{
    AppConfig, CancellationSource, CancellationToken, ConfigError, GeolocationAccuracy, Location,
    LocationConfig, LocationError, LocationProvider, LocationRequest, LocationViewModel,
    LoggingConfig, LoggingError, ManualLocationProvider, ViewModelBase, init_logging,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for geosave apps.
#[derive(Debug)]
pub enum Error {
    /// A command could not be constructed.
    Command(CommandError),
    /// Configuration failed to load or validate.
    #[cfg(feature = "runtime")]
    Config(ConfigError),
    /// The logging subscriber could not be installed.
    #[cfg(feature = "runtime")]
    Logging(LoggingError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Logging(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Command(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Config(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Logging(err) => Some(err),
        }
    }
}

impl From<CommandError> for Error {
    fn from(err: CommandError) -> Self {
        Self::Command(err)
    }
}

#[cfg(feature = "runtime")]
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "runtime")]
impl From<LoggingError> for Error {
    fn from(err: LoggingError) -> Self {
        Self::Logging(err)
    }
}

/// Standard result type for geosave APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Validate `config` and install its logging subscriber.
///
/// # Errors
///
/// [`Error::Config`] for an invalid configuration, [`Error::Logging`] if the
/// subscriber cannot be installed.
#[cfg(feature = "runtime")]
pub fn bootstrap(config: &AppConfig) -> Result<()> {
    config.validate()?;
    init_logging(&config.logging)?;
    Ok(())
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{Callable, Command, Error, RelayCommand, Result, Subscription, WeakCallable};

    #[cfg(feature = "runtime")]
    pub use crate::{AppConfig, LocationProvider, LocationViewModel};

    pub use crate::core;
    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use geosave_core as core;
#[cfg(feature = "runtime")]
pub use geosave_runtime as runtime;
