#![forbid(unsafe_code)]

//! geosave runtime
//!
//! View-model plumbing built on `geosave-core` commands.
//!
//! # Key Components
//!
//! - [`ViewModelBase`] - property-change notification for view-models
//! - [`CancellationSource`] / [`CancellationToken`] - cooperative cancellation
//! - [`LocationViewModel`] - the location screen and its commands
//! - [`LocationProvider`] - platform geolocation seam
//! - [`AppConfig`] - configuration, loadable from TOML/JSON with `app-config`
//! - [`init_logging`] - global `tracing` subscriber setup

pub mod cancellation;
pub mod config;
pub mod location;
pub mod location_view_model;
pub mod logging;
pub mod view_model;

pub use cancellation::{CancellationSource, CancellationToken};
pub use config::{AppConfig, ConfigError, LocationConfig, LoggingConfig};
pub use location::{
    GeolocationAccuracy, Location, LocationCallback, LocationError, LocationProvider,
    LocationRequest, LocationResult, ManualLocationProvider, PendingRequest,
};
pub use location_view_model::{IS_CHECKING_PROPERTY, LOCATION_PROPERTY, LocationViewModel};
pub use logging::{
    LoggingError, init_logging, init_logging_with_writer, parse_filter, resolve_filter_from,
};
pub use view_model::ViewModelBase;
