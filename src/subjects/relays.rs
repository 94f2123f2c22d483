//! Relays: subjects stripped of their termination signals -- they can only `accept()` items,
//! so their observers never see an error nor a completion

use super::{BehaviorSubject, PublishSubject};
use crate::{
    observable::Observable,
    observer::Observer,
};
use std::convert::Infallible;


/// A [PublishSubject] that never terminates.\
/// Like the subjects they wrap, relays must not be fed from inside their own deliveries: that deadlocks.
pub struct PublishRelay<T> {
    subject: PublishSubject<T, Infallible>,
}

impl<T> Clone for PublishRelay<T> {
    fn clone(&self) -> Self {
        Self { subject: self.subject.clone() }
    }
}

impl<T: Clone + Send + 'static> PublishRelay<T> {

    pub fn new() -> Self {
        Self { subject: PublishSubject::new() }
    }

    /// Emits `item` to all current subscribers
    pub fn accept(&self, item: T) {
        self.subject.on_next(item)
    }

    pub fn as_observable(&self) -> Observable<T, Infallible> {
        self.subject.as_observable()
    }

    pub fn observer_count(&self) -> usize {
        self.subject.observer_count()
    }

    pub fn has_observers(&self) -> bool {
        self.subject.has_observers()
    }
}

impl<T: Clone + Send + 'static> Default for PublishRelay<T> {
    fn default() -> Self {
        Self::new()
    }
}


/// A [BehaviorSubject] that never terminates -- so it always has a current value.\
/// Like the subjects they wrap, relays must not be fed from inside their own deliveries: that deadlocks.
pub struct BehaviorRelay<T> {
    subject: BehaviorSubject<T, Infallible>,
}

impl<T> Clone for BehaviorRelay<T> {
    fn clone(&self) -> Self {
        Self { subject: self.subject.clone() }
    }
}

impl<T: Clone + Send + 'static> BehaviorRelay<T> {

    pub fn new(initial_value: T) -> Self {
        Self { subject: BehaviorSubject::new(initial_value) }
    }

    /// Replaces the current value, emitting it to all current subscribers
    pub fn accept(&self, item: T) {
        self.subject.on_next(item)
    }

    pub fn value(&self) -> T {
        self.subject.value()
            .unwrap_or_else(|| unreachable!("BehaviorRelay: relays never terminate, so a value must always be present"))
    }

    pub fn as_observable(&self) -> Observable<T, Infallible> {
        self.subject.as_observable()
    }

    pub fn observer_count(&self) -> usize {
        self.subject.observer_count()
    }

    pub fn has_observers(&self) -> bool {
        self.subject.has_observers()
    }
}


/// Unit tests the [relays](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use crate::disposable::Disposable;
    use crate::unit_test_utils::Recorder;

    #[cfg_attr(not(doc),test)]
    fn publish_relay() {
        let relay = PublishRelay::<String>::new();
        relay.accept("nobody listens".to_string());
        let recorder = Recorder::<String, Infallible>::new();
        let subscription = relay.as_observable().subscribe(recorder.observer());
        relay.accept("hello".to_string());
        subscription.dispose();
        relay.accept("bye".to_string());
        assert_eq!(recorder.items(), vec!["hello".to_string()]);
        assert!(!recorder.is_terminated());
        assert!(!relay.has_observers());
    }

    #[cfg_attr(not(doc),test)]
    fn behavior_relay() {
        let relay = BehaviorRelay::new(1_u32);
        let recorder = Recorder::<u32, Infallible>::new();
        relay.as_observable().subscribe(recorder.observer());
        relay.accept(2);
        assert_eq!(relay.value(), 2);
        assert_eq!(recorder.items(), vec![1, 2]);
        assert_eq!(relay.observer_count(), 1);
    }

    #[cfg_attr(not(doc),test)]
    fn callbacks_may_feed_other_relays() {
        let input = PublishRelay::<u32>::new();
        let output = BehaviorRelay::new(0_u32);
        let recorder = Recorder::<u32, Infallible>::new();
        output.as_observable().subscribe(recorder.observer());
        let forward = output.clone();
        input.as_observable().take(2).subscribe_next(move |n| forward.accept(n * 10));
        (1..=3).for_each(|n| input.accept(n));
        assert_eq!(recorder.items(), vec![0, 10, 20]);
        assert_eq!(output.value(), 20);
        assert!(!input.has_observers(), "`take()` disposed its upstream from within the delivery");
    }
}
