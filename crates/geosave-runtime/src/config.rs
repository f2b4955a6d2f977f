#![forbid(unsafe_code)]

//! Application configuration.
//!
//! [`AppConfig`] groups every tunable of the runtime. All fields have
//! defaults, so `AppConfig::default()` is a working configuration and a file
//! only needs to mention what it overrides.
//!
//! # Loading
//!
//! ```toml
//! # geosave.toml
//! [location]
//! accuracy = "high"
//! timeout_ms = 5000
//!
//! [logging]
//! filter = "geosave=debug"
//! ```
//!
//! ```rust,ignore
//! let config = AppConfig::from_toml_file("geosave.toml")?;
//! let config = AppConfig::from_json_str(json)?;
//! ```

#[cfg(feature = "app-config")]
use std::path::Path;

#[cfg(feature = "app-config")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::location::{GeolocationAccuracy, LocationRequest};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "app-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "app-config", serde(default))]
pub struct AppConfig {
    /// Location screen settings.
    pub location: LocationConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from a TOML string.
    #[cfg(feature = "app-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "app-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "app-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "app-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Check that every field is usable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        if self.location.timeout_ms == 0 {
            errors.push("location.timeout_ms must be greater than 0".to_string());
        }
        if self.location.placeholder.trim().is_empty() {
            errors.push("location.placeholder must not be empty".to_string());
        }
        if self.logging.filter.trim().is_empty() {
            errors.push("logging.filter must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Location screen settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "app-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "app-config", serde(default))]
pub struct LocationConfig {
    /// Accuracy passed to the provider. Default: best.
    pub accuracy: GeolocationAccuracy,
    /// Provider timeout in milliseconds. Default: 10000.
    pub timeout_ms: u64,
    /// Text shown before any fix arrives. Default: "No data".
    pub placeholder: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            accuracy: GeolocationAccuracy::Best,
            timeout_ms: 10_000,
            placeholder: "No data".to_string(),
        }
    }
}

impl LocationConfig {
    /// The request sent to the provider for this configuration.
    #[must_use]
    pub fn request(&self) -> LocationRequest {
        LocationRequest {
            accuracy: self.accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "app-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "app-config", serde(default))]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence. Default: "info".
    pub filter: String,
    /// Emit JSON lines (needs the `tracing-json` feature). Default: false.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[cfg(feature = "app-config")]
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "app-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "app-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "app-config")]
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "app-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "app-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "app-config")]
            Self::Io(e) => Some(e),
            #[cfg(feature = "app-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "app-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
