#![forbid(unsafe_code)]

//! End-to-end behavior of relay commands as a binding layer sees them.
//!
//! 1. `construction` - checked construction and argument errors
//! 2. `lifetime` - weak and kept-alive receivers across drops
//! 3. `notification` - can_execute_changed fan-out
//! 4. `diagnostics` - skipped invocations are traced, never surfaced

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use geosave_core::{Callable, Command, CommandError, RelayCommand, WeakFunc};

#[derive(Default)]
struct CounterViewModel {
    counter: Cell<u32>,
}

impl CounterViewModel {
    fn increment(&self) {
        self.counter.set(self.counter.get() + 1);
    }
}

// =========================================================================
// 1. Construction
// =========================================================================

mod construction {
    use super::*;

    #[test]
    fn missing_execute_always_fails() {
        for keep in [false, true] {
            let result = RelayCommand::try_new(None, None, keep);
            assert!(matches!(
                result,
                Err(CommandError::InvalidArgument { name: "execute" })
            ));
        }
    }

    #[test]
    fn predicate_built_with_same_keep_alive_flag() {
        let vm = Rc::new(CounterViewModel::default());
        let command = RelayCommand::try_new(
            Some(Callable::bound(&vm, CounterViewModel::increment)),
            Some(Callable::bound(&vm, |vm: &CounterViewModel| vm.counter.get() < 2)),
            true,
        )
        .expect("execute supplied");

        assert!(command.execute_callable().keeps_target_alive());
        assert!(
            command
                .can_execute_callable()
                .is_some_and(|p| p.keeps_target_alive())
        );
    }
}

// =========================================================================
// 2. Lifetime
// =========================================================================

mod lifetime {
    use super::*;

    #[test]
    fn counter_scenario_stops_after_owner_dropped() {
        struct Tally {
            counter: Rc<Cell<u32>>,
        }

        let counter = Rc::new(Cell::new(0u32));
        let vm = Rc::new(Tally {
            counter: Rc::clone(&counter),
        });
        let observer = Rc::downgrade(&vm);
        let command = RelayCommand::with_options(
            Callable::bound(&vm, |vm: &Tally| vm.counter.set(vm.counter.get() + 1)),
            None,
            false,
        );

        for _ in 0..3 {
            command.execute(None);
        }
        assert_eq!(counter.get(), 3);

        drop(vm);
        assert!(observer.upgrade().is_none());

        command.execute(None);
        assert_eq!(counter.get(), 3);
        assert!(command.can_execute(None), "no predicate stays enabled");
    }

    #[test]
    fn captured_context_survives_with_keep_alive() {
        struct Capture {
            total: Rc<RefCell<Vec<&'static str>>>,
        }

        let total = Rc::new(RefCell::new(Vec::new()));
        let command = {
            let context = Rc::new(Capture {
                total: Rc::clone(&total),
            });
            RelayCommand::keep_alive(Callable::bound(&context, |ctx: &Capture| {
                ctx.total.borrow_mut().push("ran");
            }))
            // `context` is dropped here; only the command holds it.
        };

        command.execute(None);
        command.execute(None);
        assert_eq!(*total.borrow(), vec!["ran", "ran"]);
    }

    #[test]
    fn captured_context_without_keep_alive_is_lost() {
        struct Capture {
            total: Rc<Cell<u32>>,
        }

        let total = Rc::new(Cell::new(0));
        let command = {
            let context = Rc::new(Capture {
                total: Rc::clone(&total),
            });
            RelayCommand::new(Callable::bound(&context, |ctx: &Capture| {
                ctx.total.set(ctx.total.get() + 1);
            }))
        };

        command.execute(None);
        assert_eq!(total.get(), 0);
    }

    #[test]
    fn predicate_receiver_reclaimed_disables_and_blocks_execute() {
        let vm = Rc::new(CounterViewModel::default());
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let command = RelayCommand::with_predicate(
            Callable::free(move || hits_clone.set(hits_clone.get() + 1)),
            Callable::bound(&vm, |_: &CounterViewModel| true),
        );

        command.execute(None);
        assert_eq!(hits.get(), 1);

        drop(vm);
        assert!(!command.can_execute(None));
        command.execute(None);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn torn_down_func_returns_default_every_time() {
        let vm = Rc::new(CounterViewModel::default());
        vm.counter.set(9);
        let func = WeakFunc::new(Callable::bound(&vm, |vm: &CounterViewModel| vm.counter.get()), true);
        assert_eq!(func.execute(), 9);

        func.mark_for_deletion();
        func.mark_for_deletion();
        assert!(!func.is_alive());
        assert_eq!(func.execute(), 0);
        assert_eq!(Rc::strong_count(&vm), 1);
    }
}

// =========================================================================
// 3. Notification
// =========================================================================

mod notification {
    use super::*;

    #[test]
    fn binding_layer_requeries_on_change() {
        let vm = Rc::new(CounterViewModel::default());
        let command = Rc::new(RelayCommand::with_predicate(
            Callable::bound(&vm, CounterViewModel::increment),
            Callable::bound(&vm, |vm: &CounterViewModel| vm.counter.get() < 2),
        ));

        // A fake button that mirrors enablement whenever it is told to.
        let button_enabled = Rc::new(Cell::new(command.can_execute(None)));
        let weak_command = Rc::downgrade(&command);
        let button = Rc::clone(&button_enabled);
        let _binding = command.subscribe_can_execute_changed(Box::new(move || {
            if let Some(command) = weak_command.upgrade() {
                button.set(command.can_execute(None));
            }
        }));

        command.execute(None);
        command.raise_can_execute_changed();
        assert!(button_enabled.get());

        command.execute(None);
        command.raise_can_execute_changed();
        assert!(!button_enabled.get());

        command.execute(None);
        assert_eq!(vm.counter.get(), 2);
    }

    #[test]
    fn raise_is_synchronous_and_counts_subscribers() {
        let command = RelayCommand::new(Callable::free(|| {}));
        let calls = Rc::new(Cell::new(0u32));

        let subs: Vec<_> = (0..3)
            .map(|_| {
                let calls = Rc::clone(&calls);
                command.on_can_execute_changed(move || calls.set(calls.get() + 1))
            })
            .collect();

        command.raise_can_execute_changed();
        assert_eq!(calls.get(), 3);

        drop(subs);
        command.raise_can_execute_changed();
        assert_eq!(calls.get(), 3);
    }
}

// =========================================================================
// 4. Diagnostics
// =========================================================================

mod diagnostics {
    use super::*;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;

    #[derive(Default)]
    struct FieldVisitor {
        fields: HashMap<String, String>,
    }

    impl Visit for FieldVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    struct TargetCapture {
        events: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    }

    impl<S: tracing::Subscriber> Layer<S> for TargetCapture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = FieldVisitor::default();
            event.record(&mut visitor);
            self.events
                .lock()
                .expect("capture lock")
                .push((event.metadata().target().to_string(), visitor.fields));
        }
    }

    fn capture(run: impl FnOnce()) -> Vec<(String, HashMap<String, String>)> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(TargetCapture {
            events: Arc::clone(&events),
        });
        tracing::subscriber::with_default(subscriber, run);
        let captured = events.lock().expect("capture lock").clone();
        captured
    }

    #[test]
    fn skipped_invocation_is_traced_not_raised() {
        let vm = Rc::new(CounterViewModel::default());
        let func = WeakFunc::new(Callable::bound(&vm, |vm: &CounterViewModel| vm.counter.get()), false);
        drop(vm);

        let events = capture(|| {
            assert_eq!(func.execute(), 0);
        });

        assert!(
            events
                .iter()
                .any(|(target, fields)| target == "geosave.command" && fields.contains_key("method")),
            "expected a geosave.command trace event, got {events:?}"
        );
    }

    #[test]
    fn reclaimed_predicate_is_traced() {
        let vm = Rc::new(CounterViewModel::default());
        let command = RelayCommand::with_predicate(
            Callable::free(|| {}),
            Callable::bound(&vm, |_: &CounterViewModel| true),
        );
        drop(vm);

        let events = capture(|| {
            assert!(!command.can_execute(None));
        });

        assert!(
            events
                .iter()
                .any(|(_, fields)| fields.contains_key("predicate")),
            "expected predicate field, got {events:?}"
        );
    }

    struct SpanRecordCapture {
        records: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl<S> Layer<S> for SpanRecordCapture
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_record(
            &self,
            id: &tracing::span::Id,
            values: &tracing::span::Record<'_>,
            ctx: Context<'_, S>,
        ) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut visitor = FieldVisitor::default();
            values.record(&mut visitor);
            let mut records = self.records.lock().expect("capture lock");
            for field in visitor.fields.into_keys() {
                records.push((span.name().to_string(), field));
            }
        }
    }

    #[test]
    fn duration_lands_on_execute_span_even_if_callee_leaves_a_span_entered() {
        let records = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(SpanRecordCapture {
            records: Arc::clone(&records),
        });

        let command = RelayCommand::new(Callable::free(|| {
            std::mem::forget(tracing::info_span!("callee.work").entered());
        }));
        tracing::subscriber::with_default(subscriber, || command.execute(None));

        let records = records.lock().expect("capture lock");
        assert_eq!(
            *records,
            vec![("command.execute".to_string(), "duration_us".to_string())],
            "duration_us must be recorded on command.execute only"
        );
    }
}
