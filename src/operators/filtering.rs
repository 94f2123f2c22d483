//! `filter()`, `take()`, `skip()` & `distinct_until_changed()`

use crate::{
    observable::Observable,
    observer::{Observer, Subscriber},
};
use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicUsize, Ordering::{AcqRel, Acquire}},
};


impl<T: Send + 'static, E: Send + 'static> Observable<T, E> {

    /// Forwards only the items satisfying `predicate`
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        let source = self.clone();
        let predicate = Arc::new(predicate);
        Observable::create(move |downstream: Subscriber<T, E>| {
            let observer = FilterObserver { downstream: downstream.clone(), predicate: Arc::clone(&predicate) };
            source.subscribe_for(&downstream, observer);
        })
    }

    /// Forwards the first `count` items, then completes -- disposing the upstream subscription.\
    /// `take(0)` completes without ever subscribing upstream
    pub fn take(&self, count: usize) -> Self {
        let source = self.clone();
        Observable::create(move |downstream: Subscriber<T, E>| {
            if count == 0 {
                downstream.on_completed();
                return
            }
            let observer = TakeObserver { downstream: downstream.clone(), remaining: AtomicUsize::new(count) };
            source.subscribe_for(&downstream, observer);
        })
    }

    /// Ignores the first `count` items, forwarding the rest
    pub fn skip(&self, count: usize) -> Self {
        let source = self.clone();
        Observable::create(move |downstream: Subscriber<T, E>| {
            let observer = SkipObserver { downstream: downstream.clone(), to_skip: AtomicUsize::new(count) };
            source.subscribe_for(&downstream, observer);
        })
    }

    /// Drops items equal to the one forwarded just before them
    pub fn distinct_until_changed(&self) -> Self
                                 where T: PartialEq + Clone + Sync {
        let source = self.clone();
        Observable::create(move |downstream: Subscriber<T, E>| {
            let observer = DistinctUntilChangedObserver { downstream: downstream.clone(), last: Mutex::new(None) };
            source.subscribe_for(&downstream, observer);
        })
    }
}


struct FilterObserver<T, E, P> {
    downstream: Subscriber<T, E>,
    predicate:  Arc<P>,
}

impl<T: Send + 'static, E: Send + 'static, P: Fn(&T) -> bool + Send + Sync>
Observer<T, E> for FilterObserver<T, E, P> {

    #[inline(always)]
    fn on_next(&self, item: T) {
        if (self.predicate)(&item) {
            self.downstream.on_next(item)
        }
    }
    fn on_error(&self, error: E) {
        self.downstream.on_error(error)
    }
    fn on_completed(&self) {
        self.downstream.on_completed()
    }
}


struct TakeObserver<T, E> {
    downstream: Subscriber<T, E>,
    remaining:  AtomicUsize,
}

impl<T: Send + 'static, E: Send + 'static> Observer<T, E> for TakeObserver<T, E> {

    fn on_next(&self, item: T) {
        match self.remaining.fetch_update(AcqRel, Acquire, |remaining| remaining.checked_sub(1)) {
            Ok(1) => {
                self.downstream.on_next(item);
                self.downstream.on_completed();
            },
            Ok(_)  => self.downstream.on_next(item),
            Err(_) => (),
        }
    }
    fn on_error(&self, error: E) {
        self.downstream.on_error(error)
    }
    fn on_completed(&self) {
        self.downstream.on_completed()
    }
}


struct SkipObserver<T, E> {
    downstream: Subscriber<T, E>,
    to_skip:    AtomicUsize,
}

impl<T: Send + 'static, E: Send + 'static> Observer<T, E> for SkipObserver<T, E> {

    fn on_next(&self, item: T) {
        if self.to_skip.fetch_update(AcqRel, Acquire, |to_skip| to_skip.checked_sub(1)).is_err() {
            self.downstream.on_next(item)
        }
    }
    fn on_error(&self, error: E) {
        self.downstream.on_error(error)
    }
    fn on_completed(&self) {
        self.downstream.on_completed()
    }
}


struct DistinctUntilChangedObserver<T, E> {
    downstream: Subscriber<T, E>,
    last:       Mutex<Option<T>>,
}

impl<T: PartialEq + Clone + Send + 'static, E: Send + 'static> Observer<T, E> for DistinctUntilChangedObserver<T, E> {

    fn on_next(&self, item: T) {
        {
            let mut last = self.last.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if last.as_ref() == Some(&item) {
                return
            }
            *last = Some(item.clone());
        }
        self.downstream.on_next(item)
    }
    fn on_error(&self, error: E) {
        self.downstream.on_error(error)
    }
    fn on_completed(&self) {
        self.downstream.on_completed()
    }
}


/// Unit tests the [filtering](self) module
#[cfg(any(test,doc))]
mod tests {
    use crate::disposable::Disposable;
    use crate::observable::Observable;
    use crate::observer::Observer;
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;
    use std::sync::{Arc, atomic::{AtomicBool, Ordering::Relaxed}};

    #[cfg_attr(not(doc),test)]
    fn filter() {
        let recorder = Recorder::<u32, ()>::new();
        Observable::from_iter(1..=10)
            .filter(|n| n % 3 == 0)
            .subscribe(recorder.observer());
        assert_eq!(recorder.items(), vec![3, 6, 9]);
        assert!(recorder.is_completed());
    }

    #[cfg_attr(not(doc),test)]
    fn take_stops_infinite_synchronous_sources() {
        let recorder = Recorder::<u64, ()>::new();
        let subscription = Observable::from_iter(0_u64..)
            .take(4)
            .subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![
            Notification::Next(0), Notification::Next(1), Notification::Next(2), Notification::Next(3), Notification::Completed,
        ]);
        assert!(subscription.is_disposed());
    }

    #[cfg_attr(not(doc),test)]
    fn take_disposes_upstream() {
        let upstream_disposed = Arc::new(AtomicBool::new(false));
        let upstream_disposed_ref = Arc::clone(&upstream_disposed);
        let source = Observable::<u32, ()>::create(move |subscriber| {
            let upstream_disposed = Arc::clone(&upstream_disposed_ref);
            subscriber.add_teardown(move || upstream_disposed.store(true, Relaxed));
            subscriber.on_next(1);
            subscriber.on_next(2);
        });
        let recorder = Recorder::new();
        source.take(1).subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Next(1), Notification::Completed]);
        assert!(upstream_disposed.load(Relaxed));
    }

    #[cfg_attr(not(doc),test)]
    fn take_zero_never_subscribes_upstream() {
        let subscribed = Arc::new(AtomicBool::new(false));
        let subscribed_ref = Arc::clone(&subscribed);
        let source = Observable::<u32, ()>::create(move |_| subscribed_ref.store(true, Relaxed));
        let recorder = Recorder::new();
        source.take(0).subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Completed]);
        assert!(!subscribed.load(Relaxed));
    }

    #[cfg_attr(not(doc),test)]
    fn take_state_is_per_subscription() {
        let first_two = Observable::<u32, ()>::from_iter(1..=5).take(2);
        let recorder = Recorder::new();
        first_two.subscribe(recorder.observer());
        first_two.subscribe(recorder.observer());
        assert_eq!(recorder.items(), vec![1, 2, 1, 2]);
    }

    #[cfg_attr(not(doc),test)]
    fn skip() {
        let recorder = Recorder::<u32, ()>::new();
        Observable::from_iter(1..=5).skip(3).subscribe(recorder.observer());
        assert_eq!(recorder.items(), vec![4, 5]);
        let recorder = Recorder::<u32, ()>::new();
        Observable::from_iter(1..=5).skip(30).subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Completed]);
    }

    #[cfg_attr(not(doc),test)]
    fn distinct_until_changed() {
        let recorder = Recorder::<char, ()>::new();
        Observable::from_iter("aabccca".chars().collect::<Vec<_>>())
            .distinct_until_changed()
            .subscribe(recorder.observer());
        assert_eq!(recorder.items(), vec!['a', 'b', 'c', 'a']);
    }
}
