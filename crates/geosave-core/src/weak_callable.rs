#![forbid(unsafe_code)]

//! Zero-argument callables that do not keep their receiver alive.
//!
//! # Design
//!
//! A [`Callable<R>`] is either a free function/closure ([`Callable::Static`])
//! or a method bound to a receiver held in an `Rc` ([`Callable::Bound`]). The
//! bound method is type-erased at construction into `Fn(&dyn Any) -> Option<R>`,
//! so invocation never needs a name lookup.
//!
//! [`WeakCallable<R>`] stores a `Callable` without owning its receiver:
//!
//! | Field    | Role                                                       |
//! |----------|------------------------------------------------------------|
//! | `owner`  | weak owner hint supplied by the caller (may differ from `target`) |
//! | `target` | weak reference to the receiver the method runs against      |
//! | `live`   | strong reference to the receiver, only with `keep_target_alive` |
//! | `method` | bound method, instance case only                            |
//! | `static_fn` | the callable itself, static case only                    |
//!
//! Once the receiver has been dropped, [`WeakCallable::execute`] does nothing
//! and returns `R::default()`. That is the normal steady state for a command
//! whose view-model went away, not an error.
//!
//! `WeakAction` and `WeakFunc<R>` are aliases for the unit and value-returning
//! instantiations.
//!
//! # Invariants
//!
//! 1. Exactly one of `static_fn` / `method` is populated until teardown.
//! 2. While `live` is set the receiver is alive, whatever the weak state.
//! 3. After [`WeakCallable::mark_for_deletion`] every field is empty,
//!    `is_alive()` is false and `execute()` returns the default.

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type StaticFn<R> = Rc<dyn Fn() -> R>;
type MethodFn<R> = Rc<dyn Fn(&dyn Any) -> Option<R>>;

/// A zero-argument callable, optionally bound to a receiver.
pub enum Callable<R> {
    /// A free function or self-contained closure. Nothing to outlive.
    Static {
        func: StaticFn<R>,
        name: &'static str,
    },
    /// A method bound to a reference-counted receiver.
    Bound {
        target: Rc<dyn Any>,
        method: MethodFn<R>,
        name: &'static str,
    },
}

impl<R: 'static> Callable<R> {
    /// Wrap a function or closure with no receiver.
    pub fn free<F>(func: F) -> Self
    where
        F: Fn() -> R + 'static,
    {
        Self::Static {
            func: Rc::new(func),
            name: type_name::<F>(),
        }
    }

    /// Bind `method` to `target`. The resulting [`WeakCallable`] observes
    /// `target` weakly unless asked to keep it alive.
    pub fn bound<T, F>(target: &Rc<T>, method: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> R + 'static,
    {
        let target: Rc<dyn Any> = Rc::clone(target) as Rc<dyn Any>;
        Self::Bound {
            target,
            method: Rc::new(move |receiver: &dyn Any| receiver.downcast_ref::<T>().map(&method)),
            name: type_name::<F>(),
        }
    }
}

impl<R> Callable<R> {
    /// True for callables without a receiver.
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static { .. })
    }

    /// Type name of the wrapped function or closure.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static { name, .. } | Self::Bound { name, .. } => *name,
        }
    }

    fn receiver(&self) -> Option<&Rc<dyn Any>> {
        match self {
            Self::Static { .. } => None,
            Self::Bound { target, .. } => Some(target),
        }
    }
}

impl<R> fmt::Debug for Callable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("is_static", &self.is_static())
            .field("name", &self.name())
            .finish()
    }
}

struct Slots<R> {
    static_fn: Option<StaticFn<R>>,
    method: Option<MethodFn<R>>,
    method_name: Option<&'static str>,
    owner: Option<Weak<dyn Any>>,
    target: Option<Weak<dyn Any>>,
    live: Option<Rc<dyn Any>>,
}

impl<R> Slots<R> {
    fn is_alive(&self) -> bool {
        if self.static_fn.is_none()
            && self.owner.is_none()
            && self.target.is_none()
            && self.live.is_none()
        {
            return false;
        }

        if self.static_fn.is_some() {
            return self.owner.as_ref().is_none_or(|owner| owner.strong_count() > 0);
        }

        if self.live.is_some() {
            return true;
        }

        self.target
            .as_ref()
            .is_some_and(|target| target.strong_count() > 0)
    }

    fn receiver(&self) -> Option<Rc<dyn Any>> {
        if let Some(live) = &self.live {
            return Some(Rc::clone(live));
        }
        self.target.as_ref().and_then(Weak::upgrade)
    }
}

/// Stores a [`Callable`] without contributing to its receiver's lifetime.
///
/// All methods take `&self`; teardown goes through interior mutability so
/// an owner holding the command behind a shared reference can still call
/// [`mark_for_deletion`](Self::mark_for_deletion).
pub struct WeakCallable<R> {
    is_static: bool,
    slots: RefCell<Slots<R>>,
}

/// A weak callable with no result.
pub type WeakAction = WeakCallable<()>;

/// A weak callable returning `R`.
pub type WeakFunc<R> = WeakCallable<R>;

impl<R> WeakCallable<R> {
    /// Wrap `callable`. The owner hint is the callable's own receiver, or
    /// nothing for a static callable.
    pub fn new(callable: Callable<R>, keep_target_alive: bool) -> Self {
        let owner = callable.receiver().map(Rc::downgrade);
        Self::from_parts(owner, callable, keep_target_alive)
    }

    /// Wrap `callable` with an explicit owner hint.
    ///
    /// For static callables the hint gates [`is_alive`](Self::is_alive): once
    /// `owner` is dropped the callable reports itself dead (though a direct
    /// [`execute`](Self::execute) still runs it).
    pub fn with_owner<O: Any>(owner: &Rc<O>, callable: Callable<R>, keep_target_alive: bool) -> Self {
        let owner: Rc<dyn Any> = Rc::clone(owner) as Rc<dyn Any>;
        Self::from_parts(Some(Rc::downgrade(&owner)), callable, keep_target_alive)
    }

    fn from_parts(
        owner: Option<Weak<dyn Any>>,
        callable: Callable<R>,
        keep_target_alive: bool,
    ) -> Self {
        let slots = match callable {
            Callable::Static { func, name } => Slots {
                static_fn: Some(func),
                method: None,
                method_name: Some(name),
                owner,
                target: None,
                live: None,
            },
            Callable::Bound {
                target,
                method,
                name,
            } => Slots {
                static_fn: None,
                method: Some(method),
                method_name: Some(name),
                owner,
                target: Some(Rc::downgrade(&target)),
                live: keep_target_alive.then_some(target),
            },
        };

        Self {
            is_static: slots.static_fn.is_some(),
            slots: RefCell::new(slots),
        }
    }

    /// True if the wrapped callable had no receiver. Fixed at construction.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether invoking the callable can currently reach its receiver.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.slots.borrow().is_alive()
    }

    /// The owner hint, if it is still alive.
    #[must_use]
    pub fn owner(&self) -> Option<Rc<dyn Any>> {
        self.slots.borrow().owner.as_ref().and_then(Weak::upgrade)
    }

    /// Type name of the wrapped function or closure; `None` after teardown.
    #[must_use]
    pub fn method_name(&self) -> Option<&'static str> {
        self.slots.borrow().method_name
    }

    /// Whether a strong reference to the receiver is being held.
    #[must_use]
    pub fn keeps_target_alive(&self) -> bool {
        self.slots.borrow().live.is_some()
    }

    /// Drop every stored reference. Idempotent.
    pub fn mark_for_deletion(&self) {
        let mut slots = self.slots.borrow_mut();
        slots.static_fn = None;
        slots.method = None;
        slots.method_name = None;
        slots.owner = None;
        slots.target = None;
        slots.live = None;
    }
}

impl<R: Default> WeakCallable<R> {
    /// Invoke the callable.
    ///
    /// Static callables always run. Bound callables run only while their
    /// receiver is reachable; otherwise this returns `R::default()`.
    pub fn execute(&self) -> R {
        // Clone handles out so the callee may re-enter this callable.
        let (static_fn, method, receiver, alive) = {
            let slots = self.slots.borrow();
            (
                slots.static_fn.clone(),
                slots.method.clone(),
                slots.receiver(),
                slots.is_alive(),
            )
        };

        if let Some(func) = static_fn {
            return func();
        }

        match (alive, method, receiver) {
            (true, Some(method), Some(receiver)) => method(&*receiver).unwrap_or_default(),
            _ => {
                tracing::trace!(
                    target: "geosave.command",
                    method = self.method_name().unwrap_or("<deleted>"),
                    "receiver unavailable; invocation skipped"
                );
                R::default()
            }
        }
    }
}

impl<R> fmt::Debug for WeakCallable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.borrow();
        f.debug_struct("WeakCallable")
            .field("is_static", &self.is_static)
            .field("is_alive", &slots.is_alive())
            .field("method", &slots.method_name)
            .field("keeps_target_alive", &slots.live.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter {
        hits: Cell<u32>,
    }

    impl Counter {
        fn bump(&self) {
            self.hits.set(self.hits.get() + 1);
        }

        fn hits(&self) -> u32 {
            self.hits.get()
        }
    }

    fn counting_action(counter: &Rc<Counter>, keep: bool) -> WeakAction {
        WeakCallable::new(Callable::bound(counter, Counter::bump), keep)
    }

    #[test]
    fn static_callable_always_runs() {
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let action = WeakAction::new(
            Callable::free(move || hits_clone.set(hits_clone.get() + 1)),
            false,
        );

        assert!(action.is_static());
        assert!(action.is_alive());
        action.execute();
        action.execute();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn static_callable_returns_value() {
        let func: WeakFunc<u32> = WeakCallable::new(Callable::free(|| 7), false);
        assert_eq!(func.execute(), 7);
    }

    #[test]
    fn static_callable_liveness_follows_owner_hint() {
        let owner = Rc::new(String::from("view-model"));
        let func = WeakFunc::with_owner(&owner, Callable::free(|| true), false);

        assert!(func.is_alive());
        assert!(func.owner().is_some());
        drop(owner);
        assert!(!func.is_alive());
        assert!(func.owner().is_none());
        // Static callables still run when invoked directly.
        assert!(func.execute());
    }

    #[test]
    fn bound_callable_runs_while_receiver_alive() {
        let counter = Rc::new(Counter::default());
        let action = counting_action(&counter, false);

        assert!(!action.is_static());
        assert!(action.is_alive());
        action.execute();
        assert_eq!(counter.hits(), 1);
    }

    #[test]
    fn bound_callable_does_not_keep_receiver_alive() {
        let counter = Rc::new(Counter::default());
        let action = counting_action(&counter, false);
        assert_eq!(Rc::strong_count(&counter), 1);

        let weak = Rc::downgrade(&counter);
        drop(counter);
        assert!(weak.upgrade().is_none());
        assert!(!action.is_alive());
        action.execute();
    }

    #[test]
    fn bound_func_returns_default_once_receiver_gone() {
        let flag = Rc::new(Cell::new(true));
        let func = WeakFunc::new(Callable::bound(&flag, |f: &Cell<bool>| f.get()), false);
        assert!(func.execute());

        drop(flag);
        assert!(!func.execute());
    }

    #[test]
    fn keep_target_alive_holds_strong_reference() {
        let counter = Rc::new(Counter::default());
        let weak = Rc::downgrade(&counter);
        let action = counting_action(&counter, true);
        assert!(action.keeps_target_alive());

        drop(counter);
        assert!(action.is_alive());
        action.execute();
        assert_eq!(weak.upgrade().map(|c| c.hits()), Some(1));
    }

    #[test]
    fn instance_liveness_ignores_owner_hint() {
        let owner = Rc::new(0u8);
        let counter = Rc::new(Counter::default());
        let action = WeakAction::with_owner(&owner, Callable::bound(&counter, Counter::bump), false);

        drop(owner);
        assert!(action.is_alive());
        action.execute();
        assert_eq!(counter.hits(), 1);
    }

    #[test]
    fn mark_for_deletion_is_idempotent_and_inert() {
        let counter = Rc::new(Counter::default());
        let action = counting_action(&counter, true);

        action.mark_for_deletion();
        action.mark_for_deletion();

        assert!(!action.is_alive());
        assert!(action.method_name().is_none());
        assert!(!action.keeps_target_alive());
        action.execute();
        assert_eq!(counter.hits(), 0);
        // The strong reference was released.
        assert_eq!(Rc::strong_count(&counter), 1);
    }

    #[test]
    fn mark_for_deletion_on_static_func_yields_default() {
        let func = WeakFunc::new(Callable::free(|| 42u64), false);
        func.mark_for_deletion();
        assert!(func.is_static());
        assert!(!func.is_alive());
        assert_eq!(func.execute(), 0);
    }

    #[test]
    fn callee_may_tear_down_its_own_wrapper() {
        let slot: Rc<RefCell<Option<Rc<WeakAction>>>> = Rc::new(RefCell::new(None));
        let slot_clone = Rc::clone(&slot);
        let action = Rc::new(WeakAction::new(
            Callable::free(move || {
                if let Some(me) = slot_clone.borrow().as_ref() {
                    me.mark_for_deletion();
                }
            }),
            false,
        ));
        *slot.borrow_mut() = Some(Rc::clone(&action));

        action.execute();
        assert!(!action.is_alive());
        slot.borrow_mut().take();
    }

    #[test]
    fn method_name_reports_function() {
        let counter = Rc::new(Counter::default());
        let action = counting_action(&counter, false);
        let name = action.method_name().unwrap_or_default();
        assert!(name.ends_with("bump"), "unexpected name {name}");
    }

    #[test]
    fn debug_format() {
        let action = WeakAction::new(Callable::free(|| {}), false);
        let dbg = format!("{action:?}");
        assert!(dbg.contains("WeakCallable"));
        assert!(dbg.contains("is_static: true"));
    }
}
