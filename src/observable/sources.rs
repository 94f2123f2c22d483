//! Constructors for commonly needed [Observable]s

use super::Observable;
use crate::{
    observer::Observer,
    schedulers::Scheduler,
};
use std::{
    ops::ControlFlow,
    time::Duration,
};


impl<T: Send + 'static, E: Send + 'static> Observable<T, E> {

    /// Emits `item`, then completes
    pub fn just(item: T) -> Self
                where T: Clone + Sync {
        Self::create(move |subscriber| {
            subscriber.on_next(item.clone());
            subscriber.on_completed();
        })
    }

    /// Emits every element of `iterable` (iterated anew for each subscription), then completes.\
    /// Iteration stops as soon as the subscriber is closed -- so infinite iterators are fine when
    /// followed by operators like `take()`
    pub fn from_iter<I>(iterable: I) -> Self
                       where I:           IntoIterator<Item=T> + Clone + Send + Sync + 'static,
                             I::IntoIter: Send {
        Self::create(move |subscriber| {
            for item in iterable.clone() {
                if subscriber.is_closed() {
                    return
                }
                subscriber.on_next(item);
            }
            subscriber.on_completed();
        })
    }

    /// Completes right away, without emitting anything
    pub fn empty() -> Self {
        Self::create(|subscriber| subscriber.on_completed())
    }

    /// Emits nothing -- neither items nor termination signals
    pub fn never() -> Self {
        Self::create(|_| {})
    }

    /// Errors right away with `error`
    pub fn throw(error: E) -> Self
                where E: Clone + Sync {
        Self::create(move |subscriber| subscriber.on_error(error.clone()))
    }

    /// Calls `factory` for every new subscription, subscribing to the observable it builds
    pub fn defer<Factory>(factory: Factory) -> Self
                         where Factory: Fn() -> Observable<T, E> + Send + Sync + 'static {
        Self::create(move |subscriber| {
            let observable = factory();
            let subscription = subscriber.child_subscription();
            observable.subscribe_in(subscriber, subscription);
        })
    }
}

impl<E: Send + 'static> Observable<u64, E> {

    /// Emits `0, 1, 2, ...` -- one number after each `period` -- on `scheduler`, until disposed
    pub fn interval<S: Scheduler + Clone>(period: Duration, scheduler: S) -> Self {
        Self::create(move |subscriber| {
            let mut counter = 0_u64;
            let emitter = subscriber.clone();
            let periodic = scheduler.schedule_periodic(period, Box::new(move || {
                if emitter.is_closed() {
                    return ControlFlow::Break(())
                }
                emitter.on_next(counter);
                counter += 1;
                ControlFlow::Continue(())
            }));
            subscriber.add(periodic);
        })
    }

    /// Emits `0` after `delay` on `scheduler`, then completes
    pub fn timer<S: Scheduler + Clone>(delay: Duration, scheduler: S) -> Self {
        Self::create(move |subscriber| {
            let emitter = subscriber.clone();
            let scheduled = scheduler.schedule_after(delay, Box::new(move || {
                emitter.on_next(0);
                emitter.on_completed();
            }));
            subscriber.add(scheduled);
        })
    }
}


/// Unit tests the [sources](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use crate::disposable::Disposable;
    use crate::schedulers::{CurrentThreadScheduler, TokioScheduler};
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;

    #[cfg_attr(not(doc),test)]
    fn just_and_from_iter() {
        let recorder = Recorder::<&str, ()>::new();
        Observable::just("hello").subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Next("hello"), Notification::Completed]);

        let recorder = Recorder::<u32, ()>::new();
        let observable = Observable::from_iter(vec![1, 2, 3]);
        observable.subscribe(recorder.observer());
        observable.subscribe(recorder.observer());
        assert_eq!(recorder.items(), vec![1, 2, 3, 1, 2, 3], "each subscription should iterate anew");
    }

    #[cfg_attr(not(doc),test)]
    fn empty_never_and_throw() {
        let recorder = Recorder::<u32, String>::new();
        Observable::empty().subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Completed]);

        let recorder = Recorder::<u32, String>::new();
        let subscription = Observable::never().subscribe(recorder.observer());
        assert!(recorder.notifications().is_empty());
        assert!(!subscription.is_disposed());

        let recorder = Recorder::<u32, String>::new();
        Observable::throw("nope".to_string()).subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Error("nope".to_string())]);
    }

    #[cfg_attr(not(doc),test)]
    fn defer_builds_one_observable_per_subscription() {
        let built = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let built_ref = std::sync::Arc::clone(&built);
        let observable = Observable::<u32, ()>::defer(move || {
            let n = built_ref.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            Observable::just(n)
        });
        let recorder = Recorder::new();
        observable.subscribe(recorder.observer());
        observable.subscribe(recorder.observer());
        assert_eq!(recorder.items(), vec![0, 1]);
    }

    #[cfg_attr(not(doc),test)]
    fn timer_on_the_current_thread() {
        let recorder = Recorder::<u64, ()>::new();
        Observable::timer(Duration::from_millis(5), CurrentThreadScheduler::new()).subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Next(0), Notification::Completed]);
    }

    #[cfg_attr(not(doc),test)]
    fn interval_stops_when_the_subscriber_closes() {
        let recorder = Recorder::<u64, ()>::new();
        // `take()` closes the subscriber, breaking the (otherwise blocking) periodic loop of the current thread scheduler
        Observable::interval(Duration::from_millis(1), CurrentThreadScheduler::new())
            .take(3)
            .subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Next(0), Notification::Next(1), Notification::Next(2), Notification::Completed]);
    }

    #[cfg_attr(not(doc),tokio::test(flavor = "multi_thread"))]
    async fn interval_on_tokio() {
        let recorder = Recorder::<u64, ()>::new();
        let scheduler = TokioScheduler::current().expect("running inside a tokio runtime");
        let subscription = Observable::interval(Duration::from_millis(5), scheduler).subscribe(recorder.observer());
        tokio::time::sleep(Duration::from_millis(60)).await;
        subscription.dispose();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let items = recorder.items();
        assert!(items.len() >= 3, "expected several ticks, got {items:?}");
        assert_eq!(items, (0..items.len() as u64).collect::<Vec<_>>());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(recorder.items().len(), items.len(), "no ticks are expected after disposing");
    }
}
