#![forbid(unsafe_code)]

//! Property-change notification shared by view-models.
//!
//! [`ViewModelBase`] owns a `Signal<str>` that carries the name of the
//! property that changed. View-models keep their state in `RefCell`s and
//! route writes through [`ViewModelBase::set_property`], which only notifies
//! when the stored value actually differs.

use std::cell::RefCell;

use geosave_core::{Signal, Subscription};

/// Notification plumbing embedded in every view-model.
#[derive(Debug, Default)]
pub struct ViewModelBase {
    property_changed: Signal<str>,
}

impl ViewModelBase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` in `field` and raise `property_changed(name)`.
    ///
    /// Returns `false` without notifying when `value` equals the current
    /// value. The borrow on `field` is released before handlers run, so they
    /// may read the property back.
    pub fn set_property<T: PartialEq>(&self, field: &RefCell<T>, value: T, name: &str) -> bool {
        {
            let mut current = field.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.raise_property_changed(name);
        true
    }

    /// Tell subscribers that `name` changed.
    pub fn raise_property_changed(&self, name: &str) {
        let notified = self.property_changed.emit(name);
        tracing::trace!(target: "geosave.view_model", property = name, notified, "property changed");
    }

    /// Attach a handler receiving changed property names.
    pub fn subscribe_property_changed(&self, handler: impl Fn(&str) + 'static) -> Subscription {
        self.property_changed.subscribe(handler)
    }
}
