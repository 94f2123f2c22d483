//! `do_on_next()`

use crate::{
    observable::Observable,
    observer::{Observer, Subscriber},
};
use std::sync::Arc;


impl<T: Send + 'static, E: Send + 'static> Observable<T, E> {

    /// Calls `side_effect` for every item, just before forwarding it untouched
    pub fn do_on_next(&self, side_effect: impl Fn(&T) + Send + Sync + 'static) -> Self {
        let source = self.clone();
        let side_effect = Arc::new(side_effect);
        Observable::create(move |downstream: Subscriber<T, E>| {
            let observer = DoOnNextObserver { downstream: downstream.clone(), side_effect: Arc::clone(&side_effect) };
            source.subscribe_for(&downstream, observer);
        })
    }
}

struct DoOnNextObserver<T, E, F> {
    downstream:  Subscriber<T, E>,
    side_effect: Arc<F>,
}

impl<T: Send + 'static, E: Send + 'static, F: Fn(&T) + Send + Sync>
Observer<T, E> for DoOnNextObserver<T, E, F> {

    #[inline(always)]
    fn on_next(&self, item: T) {
        (self.side_effect)(&item);
        self.downstream.on_next(item)
    }
    fn on_error(&self, error: E) {
        self.downstream.on_error(error)
    }
    fn on_completed(&self) {
        self.downstream.on_completed()
    }
}


#[cfg(any(test,doc))]
mod tests {
    use crate::observable::Observable;
    use crate::unit_test_utils::Recorder;
    use std::sync::{Arc, Mutex};

    #[cfg_attr(not(doc),test)]
    fn side_effects_see_every_item_before_downstream() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_ref = Arc::clone(&seen);
        let recorder = Recorder::<u32, ()>::new();
        let recorder_ref = recorder.clone();
        Observable::from_iter(1..=3)
            .do_on_next(move |n| {
                // downstream must not have received it yet
                assert_eq!(recorder_ref.items().len() as u32, n - 1);
                seen_ref.lock().unwrap().push(*n);
            })
            .subscribe(recorder.observer());
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(recorder.items(), vec![1, 2, 3]);
    }
}
