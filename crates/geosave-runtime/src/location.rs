#![forbid(unsafe_code)]

//! Location types and the platform provider seam.
//!
//! The platform geolocation API is an external collaborator. It is reached
//! through [`LocationProvider`], which takes a request, a cancellation token
//! and a completion callback. The provider decides accuracy handling,
//! timeouts and permissions; the view-model only reacts to the outcome.
//!
//! [`ManualLocationProvider`] queues requests in-process so hosts without a
//! platform backend (and tests) can resolve them explicitly.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

#[cfg(feature = "app-config")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::cancellation::CancellationToken;

/// A position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level, when the platform reports it.
    pub altitude: Option<f64>,
}

impl Location {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
        }
    }

    #[must_use]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Latitude: {}, Longitude: {}, Altitude: ",
            self.latitude, self.longitude
        )?;
        match self.altitude {
            Some(altitude) => write!(f, "{altitude}"),
            None => Ok(()),
        }
    }
}

/// Requested fix quality. Interpretation belongs to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "app-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "app-config", serde(rename_all = "snake_case"))]
pub enum GeolocationAccuracy {
    Default,
    Lowest,
    Low,
    Medium,
    High,
    #[default]
    Best,
}

/// Parameters of one location query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub accuracy: GeolocationAccuracy,
    pub timeout: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            accuracy: GeolocationAccuracy::Best,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Why a provider could not produce a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The device has no location capability.
    FeatureNotSupported,
    /// Location services are switched off.
    FeatureNotEnabled,
    /// The user or platform refused access.
    PermissionDenied,
    /// The request's token was cancelled.
    Cancelled,
    /// No fix within the request timeout.
    TimedOut,
    /// Any other platform failure.
    Unavailable(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureNotSupported => write!(f, "location is not supported on this device"),
            Self::FeatureNotEnabled => write!(f, "location services are disabled"),
            Self::PermissionDenied => write!(f, "location permission denied"),
            Self::Cancelled => write!(f, "location request cancelled"),
            Self::TimedOut => write!(f, "location request timed out"),
            Self::Unavailable(msg) => write!(f, "location unavailable: {msg}"),
        }
    }
}

impl std::error::Error for LocationError {}

/// Outcome handed to a completion callback. `Ok(None)` means the platform
/// answered without a fix.
pub type LocationResult = Result<Option<Location>, LocationError>;

/// Completion callback, invoked once on the UI thread.
pub type LocationCallback = Box<dyn FnOnce(LocationResult)>;

/// The platform seam for geolocation.
pub trait LocationProvider {
    /// Start a query. `on_complete` must be called exactly once, possibly
    /// before this method returns.
    fn request_location(
        &self,
        request: LocationRequest,
        token: CancellationToken,
        on_complete: LocationCallback,
    );
}

/// A queued request awaiting resolution.
pub struct PendingRequest {
    pub request: LocationRequest,
    pub token: CancellationToken,
    on_complete: LocationCallback,
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("request", &self.request)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Provider that parks every request until told how it ends.
#[derive(Debug, Default)]
pub struct ManualLocationProvider {
    pending: RefCell<VecDeque<PendingRequest>>,
    history: RefCell<Vec<LocationRequest>>,
}

impl ManualLocationProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests not yet resolved.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Every request received, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<LocationRequest> {
        self.history.borrow().clone()
    }

    /// Resolve the oldest pending request. Returns `false` if none was
    /// pending.
    pub fn complete_next(&self, result: LocationResult) -> bool {
        let Some(pending) = self.pending.borrow_mut().pop_front() else {
            return false;
        };
        (pending.on_complete)(result);
        true
    }

    /// Resolve every pending request whose token was cancelled with
    /// [`LocationError::Cancelled`]. Returns how many were resolved.
    pub fn resolve_cancelled(&self) -> usize {
        let cancelled: Vec<PendingRequest> = {
            let mut pending = self.pending.borrow_mut();
            let (cancelled, waiting): (VecDeque<_>, VecDeque<_>) =
                pending.drain(..).partition(|p| p.token.is_cancelled());
            *pending = waiting;
            cancelled.into()
        };

        let count = cancelled.len();
        for pending in cancelled {
            (pending.on_complete)(Err(LocationError::Cancelled));
        }
        count
    }
}

impl LocationProvider for ManualLocationProvider {
    fn request_location(
        &self,
        request: LocationRequest,
        token: CancellationToken,
        on_complete: LocationCallback,
    ) {
        self.history.borrow_mut().push(request);
        self.pending.borrow_mut().push_back(PendingRequest {
            request,
            token,
            on_complete,
        });
    }
}
