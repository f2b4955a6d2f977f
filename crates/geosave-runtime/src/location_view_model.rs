#![forbid(unsafe_code)]

//! View-model for the "where am I" screen.
//!
//! # Design
//!
//! All state lives in an `Rc<LocationState>` built with `Rc::new_cyclic`, so
//! provider callbacks can hold a `Weak` back-reference. The two commands are
//! created lazily on first access and stored inside the state; each is bound
//! to the state through a weak callable, so a UI that keeps a command after
//! the view-model is gone gets a harmless no-op instead of a leak.
//!
//! # Flow
//!
//! 1. `get_location` marks the screen as checking, creates a fresh
//!    [`CancellationSource`], and hands the provider a request plus token.
//! 2. The provider answers through its completion callback. A fix updates
//!    the `location` property; a failure is logged and otherwise ignored.
//! 3. Checking is cleared whatever the outcome, once the latest request
//!    finishes, and `cancel_command` observers hear about it through
//!    `can_execute_changed`. A superseded request finishing leaves the newer
//!    one checking and cancellable.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use geosave_core::{Callable, RelayCommand, Subscription};
use tracing::{debug, trace, warn};

use crate::cancellation::CancellationSource;
use crate::config::LocationConfig;
use crate::location::{LocationProvider, LocationResult};
use crate::view_model::ViewModelBase;

/// Property name raised when the location text changes.
pub const LOCATION_PROPERTY: &str = "location";
/// Property name raised when the checking flag changes.
pub const IS_CHECKING_PROPERTY: &str = "is_checking_location";

struct LocationState {
    this: Weak<LocationState>,
    base: ViewModelBase,
    config: LocationConfig,
    provider: Rc<dyn LocationProvider>,
    location: RefCell<String>,
    is_checking: RefCell<bool>,
    request_seq: Cell<u64>,
    cancel_source: RefCell<Option<CancellationSource>>,
    get_location: OnceCell<Rc<RelayCommand>>,
    cancel: OnceCell<Rc<RelayCommand>>,
}

impl LocationState {
    fn get_current_location(&self) {
        let request = self.config.request();
        let request_id = self.request_seq.get() + 1;
        self.request_seq.set(request_id);

        let source = CancellationSource::new();
        let token = source.token();
        *self.cancel_source.borrow_mut() = Some(source);
        self.set_checking(true);

        debug!(
            target: "geosave.location",
            request_id,
            accuracy = ?request.accuracy,
            timeout_ms = request.timeout.as_millis() as u64,
            "location request started"
        );

        let this = Weak::clone(&self.this);
        self.provider.request_location(
            request,
            token,
            Box::new(move |result| match this.upgrade() {
                Some(state) => state.finish_request(request_id, result),
                None => trace!(
                    target: "geosave.location",
                    request_id,
                    "view-model dropped before location arrived"
                ),
            }),
        );
    }

    fn finish_request(&self, request_id: u64, result: LocationResult) {
        match result {
            Ok(Some(location)) => {
                debug!(target: "geosave.location", request_id, "location received");
                self.base
                    .set_property(&self.location, location.to_string(), LOCATION_PROPERTY);
            }
            Ok(None) => {
                debug!(target: "geosave.location", request_id, "provider returned no fix");
            }
            Err(err) => {
                warn!(
                    target: "geosave.location",
                    request_id,
                    error = %err,
                    "unable to get location"
                );
            }
        }

        // An older request finishing must not end the one still in flight.
        if request_id == self.request_seq.get() {
            self.set_checking(false);
        } else {
            debug!(
                target: "geosave.location",
                request_id,
                current = self.request_seq.get(),
                "superseded request finished; still checking"
            );
        }
    }

    fn cancel_request(&self) {
        if !*self.is_checking.borrow() {
            return;
        }
        if let Some(source) = self.cancel_source.borrow().as_ref() {
            if !source.is_cancellation_requested() {
                debug!(target: "geosave.location", "location request cancelled by user");
                source.cancel();
            }
        }
    }

    fn is_checking(&self) -> bool {
        *self.is_checking.borrow()
    }

    fn set_checking(&self, checking: bool) {
        if self
            .base
            .set_property(&self.is_checking, checking, IS_CHECKING_PROPERTY)
        {
            if let Some(cancel) = self.cancel.get() {
                cancel.raise_can_execute_changed();
            }
        }
    }
}

/// The location screen's view-model.
pub struct LocationViewModel {
    state: Rc<LocationState>,
}

impl LocationViewModel {
    /// Create a view-model showing `config.placeholder` until a fix arrives.
    pub fn new(provider: Rc<dyn LocationProvider>, config: LocationConfig) -> Self {
        let state = Rc::new_cyclic(|this| LocationState {
            this: Weak::clone(this),
            base: ViewModelBase::new(),
            location: RefCell::new(config.placeholder.clone()),
            config,
            provider,
            is_checking: RefCell::new(false),
            request_seq: Cell::new(0),
            cancel_source: RefCell::new(None),
            get_location: OnceCell::new(),
            cancel: OnceCell::new(),
        });
        Self { state }
    }

    /// Create a view-model with [`LocationConfig::default`].
    pub fn with_defaults(provider: Rc<dyn LocationProvider>) -> Self {
        Self::new(provider, LocationConfig::default())
    }

    /// Current location text.
    #[must_use]
    pub fn location(&self) -> String {
        self.state.location.borrow().clone()
    }

    /// Replace the location text, notifying observers if it changed.
    pub fn set_location(&self, value: impl Into<String>) {
        self.state
            .base
            .set_property(&self.state.location, value.into(), LOCATION_PROPERTY);
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_checking_location(&self) -> bool {
        self.state.is_checking()
    }

    /// The command that starts a location request. Created on first access.
    pub fn get_location(&self) -> Rc<RelayCommand> {
        Rc::clone(self.state.get_location.get_or_init(|| {
            Rc::new(RelayCommand::new(Callable::bound(
                &self.state,
                LocationState::get_current_location,
            )))
        }))
    }

    /// The command that cancels the request in flight. Enabled only while
    /// checking. Created on first access.
    pub fn cancel_command(&self) -> Rc<RelayCommand> {
        Rc::clone(self.state.cancel.get_or_init(|| {
            Rc::new(RelayCommand::with_predicate(
                Callable::bound(&self.state, LocationState::cancel_request),
                Callable::bound(&self.state, LocationState::is_checking),
            ))
        }))
    }

    /// Cancel the request in flight, if there is one that is not already
    /// cancelled.
    pub fn cancel_request(&self) {
        self.state.cancel_request();
    }

    /// Attach a handler receiving changed property names.
    pub fn subscribe_property_changed(&self, handler: impl Fn(&str) + 'static) -> Subscription {
        self.state.base.subscribe_property_changed(handler)
    }
}

impl fmt::Debug for LocationViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationViewModel")
            .field("location", &*self.state.location.borrow())
            .field("is_checking", &self.state.is_checking())
            .field("requests", &self.state.request_seq.get())
            .finish()
    }
}
