//! Functional requirements: whole pipelines, built only through the public API,
//! crossing threads through the schedulers & ending in `async` code

use reactive_observables::prelude::*;
use std::{
    sync::{Arc, Mutex},
    thread::{self, ThreadId},
    time::Duration,
};
use futures::StreamExt;


#[ctor::ctor]
fn suite_setup() {
    simple_logger::SimpleLogger::new().with_utc_timestamps().init().unwrap_or_else(|_| eprintln!("--> LOGGER WAS ALREADY STARTED"));
}


/// A subject fed from a plain thread, through a pipeline that hops to tokio workers, consumed as an `async` stream
#[cfg_attr(not(doc), tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn relay_to_async_stream() {
    let scheduler = TokioScheduler::current().expect("we are inside a runtime");
    let prices = PublishSubject::<u32, String>::new();
    let mut stream = prices.as_observable()
        .filter(|price| *price > 0)
        .distinct_until_changed()
        .scan(0_u32, |total, price| total + price)
        .observe_on(scheduler)
        .into_stream();
    let producer = prices.clone();
    thread::spawn(move || {
        [0, 10, 10, 20, 0, 5].into_iter().for_each(|price| producer.on_next(price));
        producer.on_error("market closed".to_string());
    });
    let mut totals = Vec::new();
    let error = loop {
        match stream.next().await {
            Some(Ok(total)) => totals.push(total),
            Some(Err(error)) => break error,
            None => panic!("The stream ended without the expected error"),
        }
    };
    assert_eq!(totals, vec![10, 30, 35]);
    assert_eq!(error, "market closed");
    assert!(stream.next().await.is_none(), "Nothing may follow an error");
}

/// `subscribe_on()` moves the production out of the subscribing thread, onto a tokio worker
#[cfg_attr(not(doc), tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn producers_and_consumers_on_different_threads() {
    let scheduler = TokioScheduler::current().expect("we are inside a runtime");
    let test_thread = thread::current().id();
    let production_threads = Arc::new(Mutex::new(Vec::<ThreadId>::new()));
    let production_threads_ref = Arc::clone(&production_threads);
    let stream = Observable::<u32, ()>::defer(move || {
            production_threads_ref.lock().unwrap().push(thread::current().id());
            Observable::from_iter(1..=100)
        })
        .subscribe_on(scheduler.clone())
        .map(|n| n * n)
        .take(10)
        .into_stream();
    let squares: Vec<u32> = stream.map(|item| item.expect("no errors here")).collect().await;
    assert_eq!(squares, (1..=10).map(|n| n * n).collect::<Vec<_>>());
    let production_threads = production_threads.lock().unwrap();
    assert_eq!(production_threads.len(), 1, "`defer()` must run once per subscription");
    assert_ne!(production_threads[0], test_thread, "`subscribe_on()` should have moved the production out of the test thread");
}

/// Merged intervals, cut by `take()`, interleave while keeping each source's order
#[cfg_attr(not(doc), tokio::test)]
async fn merged_intervals() {
    let scheduler = TokioScheduler::current().expect("we are inside a runtime");
    let fast = Observable::<u64, ()>::interval(Duration::from_millis(5), scheduler.clone()).map(|n| ('f', n));
    let slow = Observable::<u64, ()>::interval(Duration::from_millis(13), scheduler.clone()).map(|n| ('s', n));
    let events: Vec<(char, u64)> = fast.merge(&slow)
        .take(8)
        .into_stream()
        .map(|event| event.expect("intervals never fail"))
        .collect().await;
    assert_eq!(events.len(), 8);
    let fast_ones: Vec<u64> = events.iter().filter(|(source, _)| *source == 'f').map(|(_, n)| *n).collect();
    assert!(fast_ones.windows(2).all(|pair| pair[1] == pair[0] + 1), "each source's order must be kept: {events:?}");
    assert!(events.iter().any(|(source, _)| *source == 's'), "the slow source should have had time to emit: {events:?}");
}

/// Everything placed in a [DisposeBag] stops receiving when the bag goes out of scope
#[cfg_attr(not(doc), tokio::test)]
async fn dispose_bag_scoping() {
    let scheduler = TokioScheduler::current().expect("we are inside a runtime");
    let relay = BehaviorRelay::new(0_u32);
    let received = Arc::new(Mutex::new(Vec::new()));
    {
        let bag = DisposeBag::new();
        let received = Arc::clone(&received);
        relay.as_observable()
            .subscribe_next(move |n| received.lock().unwrap().push(n))
            .disposed_by(&bag);
        Observable::<u64, ()>::timer(Duration::from_secs(3600), scheduler.clone())
            .subscribe_next(|_| panic!("disposed timers must never fire"))
            .disposed_by(&bag);
        relay.accept(1);
        assert_eq!(relay.observer_count(), 1);
    }
    relay.accept(2);
    assert_eq!(*received.lock().unwrap(), vec![0, 1]);
    assert!(!relay.has_observers());
    assert_eq!(relay.value(), 2);
}

/// A late subscriber to a [ReplaySubject] fed from another thread sees the exact same sequence as an early one
#[cfg_attr(not(doc), tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn replay_subject_late_subscribers() {
    let subject = ReplaySubject::<u32, ()>::unbounded();
    let early = subject.as_observable().into_stream();
    let producer = subject.clone();
    tokio::task::spawn_blocking(move || {
        Observable::from_iter(1..=1000).subscribe(producer);
    }).await.expect("the producer shouldn't panic");
    let late = subject.as_observable().into_stream();
    let early: Vec<u32> = early.map(|item| item.expect("no errors")).collect().await;
    let late:  Vec<u32> = late.map(|item| item.expect("no errors")).collect().await;
    assert_eq!(early, (1..=1000).collect::<Vec<_>>());
    assert_eq!(late, early);
}
