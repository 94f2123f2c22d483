//! `map()` & `scan()`

use crate::{
    observable::Observable,
    observer::{Observer, Subscriber},
};
use std::sync::{Arc, Mutex};


impl<T: Send + 'static, E: Send + 'static> Observable<T, E> {

    /// Transforms each item with `mapper`
    pub fn map<U: Send + 'static>(&self, mapper: impl Fn(T) -> U + Send + Sync + 'static) -> Observable<U, E> {
        let source = self.clone();
        let mapper = Arc::new(mapper);
        Observable::create(move |downstream: Subscriber<U, E>| {
            let observer = MapObserver { downstream: downstream.clone(), mapper: Arc::clone(&mapper) };
            source.subscribe_for(&downstream, observer);
        })
    }

    /// Emits each intermediate result of folding the items with `accumulator`, starting from `seed`
    /// (which is not emitted itself)
    pub fn scan<A: Clone + Send + Sync + 'static>
               (&self,
                seed:        A,
                accumulator: impl Fn(&A, T) -> A + Send + Sync + 'static)
               -> Observable<A, E> {
        let source = self.clone();
        let accumulator = Arc::new(accumulator);
        Observable::create(move |downstream: Subscriber<A, E>| {
            let observer = ScanObserver {
                downstream:  downstream.clone(),
                accumulator: Arc::clone(&accumulator),
                state:       Mutex::new(seed.clone()),
            };
            source.subscribe_for(&downstream, observer);
        })
    }
}


struct MapObserver<U, E, F> {
    downstream: Subscriber<U, E>,
    mapper:     Arc<F>,
}

impl<T, U: Send + 'static, E: Send + 'static, F: Fn(T) -> U + Send + Sync>
Observer<T, E> for MapObserver<U, E, F> {

    #[inline(always)]
    fn on_next(&self, item: T) {
        self.downstream.on_next((self.mapper)(item))
    }
    fn on_error(&self, error: E) {
        self.downstream.on_error(error)
    }
    fn on_completed(&self) {
        self.downstream.on_completed()
    }
}


struct ScanObserver<A, E, F> {
    downstream:  Subscriber<A, E>,
    accumulator: Arc<F>,
    state:       Mutex<A>,
}

impl<T, A: Clone + Send + Sync + 'static, E: Send + 'static, F: Fn(&A, T) -> A + Send + Sync>
Observer<T, E> for ScanObserver<A, E, F> {

    fn on_next(&self, item: T) {
        let next = {
            let mut state = self.state.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *state = (self.accumulator)(&state, item);
            state.clone()
        };
        self.downstream.on_next(next)
    }
    fn on_error(&self, error: E) {
        self.downstream.on_error(error)
    }
    fn on_completed(&self) {
        self.downstream.on_completed()
    }
}


/// Unit tests the [transforming](self) module
#[cfg(any(test,doc))]
mod tests {
    use crate::observable::Observable;
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;

    #[cfg_attr(not(doc),test)]
    fn map() {
        let recorder = Recorder::<String, ()>::new();
        Observable::from_iter(1..=3)
            .map(|n: u32| format!("#{n}"))
            .subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![
            Notification::Next("#1".to_string()),
            Notification::Next("#2".to_string()),
            Notification::Next("#3".to_string()),
            Notification::Completed,
        ]);
    }

    #[cfg_attr(not(doc),test)]
    fn map_forwards_errors() {
        let recorder = Recorder::<u32, &'static str>::new();
        Observable::throw("upstream failure")
            .map(|n: u32| n * 2)
            .subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Error("upstream failure")]);
    }

    #[cfg_attr(not(doc),test)]
    fn scan_state_is_per_subscription() {
        let running_sums = Observable::<u32, ()>::from_iter(vec![1, 2, 3, 4])
            .scan(0, |sum, n| sum + n);
        let first = Recorder::new();
        let second = Recorder::new();
        running_sums.subscribe(first.observer());
        running_sums.subscribe(second.observer());
        assert_eq!(first.items(), vec![1, 3, 6, 10]);
        assert_eq!(second.items(), vec![1, 3, 6, 10]);
    }
}
