//! Tests the API contracts.
//!
//! NOTE: some "tests" here have few assertions, as they are used mainly to verify the API is able to represent certain models
//!       (thread-safety bounds, trait objects, prelude completeness).

use reactive_observables::prelude::*;
use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
};


/// All user facing types must be shareable across threads, given thread-safe payloads
#[cfg_attr(not(doc), test)]
fn public_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Observable<String, String>>();
    assert_send_sync::<Subscriber<String, String>>();
    assert_send_sync::<Subscription>();
    assert_send_sync::<DisposeBag>();
    assert_send_sync::<PublishSubject<String, String>>();
    assert_send_sync::<BehaviorSubject<String, String>>();
    assert_send_sync::<ReplaySubject<String, String>>();
    assert_send_sync::<PublishRelay<String>>();
    assert_send_sync::<BehaviorRelay<String>>();
    assert_send_sync::<CurrentThreadScheduler>();
    assert_send_sync::<TokioScheduler>();
}

/// Proves schedulers & disposables may be used as trait objects
#[cfg_attr(not(doc), test)]
fn trait_objects() {
    let schedulers: Vec<Box<dyn Scheduler>> = vec![Box::new(CurrentThreadScheduler::new())];
    let ran = Arc::new(Mutex::new(Vec::new()));
    for scheduler in &schedulers {
        let ran = Arc::clone(&ran);
        let name = scheduler.name().to_string();
        scheduler.schedule(Box::new(move || ran.lock().unwrap().push(name)));
    }
    assert_eq!(ran.lock().unwrap().len(), 1);

    let disposables: Vec<Box<dyn Disposable>> = vec![Box::new(Subscription::new()), Box::new(DisposeBag::new())];
    disposables.iter().for_each(|disposable| disposable.dispose());
    assert!(disposables.iter().all(|disposable| disposable.is_disposed()));
}

/// Proves subjects may be fed by subscribing them to an upstream & that relays' observables are typed to never fail
#[cfg_attr(not(doc), test)]
fn subjects_are_observers() {
    let subject = ReplaySubject::<u32, String>::unbounded();
    Observable::from_iter([1, 2, 3]).subscribe(subject.clone());
    assert!(subject.is_terminated());

    let relay = BehaviorRelay::new("idle");
    let states: Observable<&str, Infallible> = relay.as_observable();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_ref = Arc::clone(&seen);
    let _subscription = states.subscribe_next(move |state| seen_ref.lock().unwrap().push(state));
    relay.accept("busy");
    assert_eq!(*seen.lock().unwrap(), vec!["idle", "busy"]);
}

/// Observers may be any user type implementing [Observer] -- including shared ones
#[cfg_attr(not(doc), test)]
fn custom_observers() {
    #[derive(Default)]
    struct Totalizer {
        total: Mutex<i64>,
        done:  Mutex<bool>,
    }
    impl Observer<i64, String> for Totalizer {
        fn on_next(&self, item: i64) {
            *self.total.lock().unwrap() += item;
        }
        fn on_error(&self, error: String) {
            panic!("Unexpected error: {error}");
        }
        fn on_completed(&self) {
            *self.done.lock().unwrap() = true;
        }
    }
    let totalizer = Arc::new(Totalizer::default());
    Observable::from_iter(vec![10, -3, 5]).subscribe(Arc::clone(&totalizer));
    assert_eq!(*totalizer.total.lock().unwrap(), 12);
    assert!(*totalizer.done.lock().unwrap());
}

/// The const config pattern must be usable in user code
#[cfg_attr(not(doc), test)]
fn const_config_in_user_code() {
    const CONFIG: u64 = ConstConfig {
        observe_on_buffer: 64,
        overflow_strategy: OverflowStrategies::DropOldest,
        drain_mode:        DrainModes::PerItem,
    }.into();
    assert_eq!(ConstConfig::from(CONFIG), ConstConfig {
        observe_on_buffer: 64,
        overflow_strategy: OverflowStrategies::DropOldest,
        drain_mode:        DrainModes::PerItem,
    });
    assert_eq!(ConstConfig::from(DEFAULT_CONFIG), ConstConfig::default());
    let _observable = Observable::<u8, ()>::just(1)
        .observe_on_configured::<CONFIG, _>(CurrentThreadScheduler::new());
}

/// [TokioScheduler::current()] must fail, rather than panic, outside of a runtime
#[cfg_attr(not(doc), test)]
fn tokio_scheduler_outside_of_a_runtime() {
    match TokioScheduler::current() {
        Err(SchedulerError::NoCurrentRuntime(_)) => (),
        other => panic!("Expected `NoCurrentRuntime`, got {other:?}"),
    }
}
