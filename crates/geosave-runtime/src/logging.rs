#![forbid(unsafe_code)]

//! Process-wide `tracing` subscriber setup.
//!
//! Hosts call [`init_logging`] once at startup. `RUST_LOG`, when set, wins
//! over [`LoggingConfig::filter`]. JSON output requires the `tracing-json`
//! feature.

use std::fmt;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::LoggingConfig;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// The filter directives did not parse.
    InvalidFilter(String),
    /// JSON output was requested without the `tracing-json` feature.
    JsonUnavailable,
    /// A global subscriber is already installed.
    AlreadyInstalled(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilter(msg) => write!(f, "invalid log filter: {msg}"),
            Self::JsonUnavailable => {
                write!(f, "JSON logging requires the `tracing-json` feature")
            }
            Self::AlreadyInstalled(msg) => write!(f, "logging already initialised: {msg}"),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Parse `EnvFilter` directives.
///
/// # Errors
///
/// [`LoggingError::InvalidFilter`] when a directive is malformed.
pub fn parse_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidFilter(e.to_string()))
}

/// Pick the filter: non-blank `env` directives win over `config.filter`.
///
/// `env` is the value of `RUST_LOG`, passed in so the precedence can be
/// checked without touching the process environment.
///
/// # Errors
///
/// [`LoggingError::InvalidFilter`] when the chosen directives are malformed.
pub fn resolve_filter_from(
    env: Option<&str>,
    config: &LoggingConfig,
) -> Result<EnvFilter, LoggingError> {
    match env {
        Some(directives) if !directives.trim().is_empty() => parse_filter(directives),
        _ => parse_filter(&config.filter),
    }
}

fn resolve_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    resolve_filter_from(env.as_deref(), config)
}

/// Install the global fmt subscriber described by `config`, writing to
/// stdout.
///
/// # Errors
///
/// See [`LoggingError`].
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    init_logging_with_writer(config, std::io::stdout)
}

/// Install the global fmt subscriber described by `config`, writing through
/// `make_writer`.
///
/// # Errors
///
/// See [`LoggingError`].
pub fn init_logging_with_writer<W>(config: &LoggingConfig, make_writer: W) -> Result<(), LoggingError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if config.json && !cfg!(feature = "tracing-json") {
        return Err(LoggingError::JsonUnavailable);
    }

    let filter = resolve_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(make_writer);

    #[cfg(feature = "tracing-json")]
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    #[cfg(not(feature = "tracing-json"))]
    let installed = builder.try_init();

    installed.map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;
    tracing::debug!(
        target: "geosave.logging",
        filter = %config.filter,
        json = config.json,
        "logging initialised"
    );
    Ok(())
}
