//! Resting place for [BehaviorSubject]

use super::subject_core::{LatestValue, SubjectCore};
use crate::{
    observable::Observable,
    observer::Observer,
    types::Terminal,
};
use std::sync::Arc;


/// A subject holding a "current value": every new subscriber first receives the latest item
/// (or the initial value, if nothing was emitted yet), followed by the live events.\
/// Once terminated, the value is forgotten: late subscribers receive only the terminal event.\
/// Emitting into this very subject from inside one of its deliveries deadlocks -- so does having two subjects feed each
/// other from their callbacks on different threads. Feed it from elsewhere, or hop through `observe_on()` first.
pub struct BehaviorSubject<T, E> {
    core: Arc<SubjectCore<T, E, LatestValue<T>>>,
}

impl<T, E> Clone for BehaviorSubject<T, E> {
    fn clone(&self) -> Self {
        Self { core: Arc::clone(&self.core) }
    }
}

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> BehaviorSubject<T, E> {

    pub fn new(initial_value: T) -> Self {
        Self { core: SubjectCore::new("BehaviorSubject", LatestValue(Some(initial_value))) }
    }

    /// The latest value -- `None` after termination
    pub fn value(&self) -> Option<T> {
        self.core.inspect(|state| state.replay.0.clone())
    }

    /// The consumer side of this subject
    pub fn as_observable(&self) -> Observable<T, E> {
        let core = Arc::clone(&self.core);
        Observable::create(move |subscriber| core.register(subscriber))
    }

    pub fn observer_count(&self) -> usize {
        self.core.observer_count()
    }

    pub fn has_observers(&self) -> bool {
        self.observer_count() > 0
    }

    pub fn is_terminated(&self) -> bool {
        self.core.inspect(|state| state.is_terminated())
    }
}

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> Observer<T, E> for BehaviorSubject<T, E> {
    fn on_next(&self, item: T) {
        self.core.emit_next(item)
    }
    fn on_error(&self, error: E) {
        self.core.emit_terminal(Terminal::Error(error))
    }
    fn on_completed(&self) {
        self.core.emit_terminal(Terminal::Completed)
    }
}


#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use crate::schedulers::TokioScheduler;
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;
    use std::time::Duration;

    #[cfg_attr(not(doc),test)]
    fn newcomers_get_the_latest_value_first() {
        let subject = BehaviorSubject::<&str, ()>::new("initial");
        let first = Recorder::new();
        subject.as_observable().subscribe(first.observer());
        subject.on_next("a");
        subject.on_next("b");
        let second = Recorder::new();
        subject.as_observable().subscribe(second.observer());
        subject.on_next("c");
        assert_eq!(first.items(),  vec!["initial", "a", "b", "c"]);
        assert_eq!(second.items(), vec!["b", "c"]);
        assert_eq!(subject.value(), Some("c"));
    }

    #[cfg_attr(not(doc),test)]
    fn termination_forgets_the_value() {
        let subject = BehaviorSubject::<u32, String>::new(0);
        subject.on_next(1);
        subject.on_completed();
        assert_eq!(subject.value(), None);
        let late = Recorder::new();
        subject.as_observable().subscribe(late.observer());
        assert_eq!(late.notifications(), vec![Notification::Completed]);
    }

    #[cfg_attr(not(doc),test)]
    fn replay_may_be_cut_short() {
        let subject = BehaviorSubject::<u32, ()>::new(7);
        let recorder = Recorder::new();
        subject.as_observable().take(1).subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Next(7), Notification::Completed]);
        assert!(!subject.has_observers(), "the completed `take()` should have unregistered itself");
        subject.on_next(8);
        assert_eq!(recorder.items(), vec![7]);
    }

    /// Subscribes while another thread keeps emitting: each subscriber must see an increasing sequence
    #[cfg_attr(not(doc),tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn live_events_never_overtake_the_replay() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let subject = BehaviorSubject::<u32, ()>::new(0);
        let producer = subject.clone();
        let producing = tokio::task::spawn_blocking(move || {
            (1..=20_000).for_each(|n| producer.on_next(n));
            producer.on_completed();
        });
        let recorders: Vec<Recorder<u32, ()>> = (0..8).map(|_| Recorder::new()).collect();
        for recorder in &recorders {
            subject.as_observable().subscribe_on(scheduler.clone()).subscribe(recorder.observer());
            tokio::task::yield_now().await;
        }
        producing.await.expect("producer shouldn't panic");
        for recorder in &recorders {
            recorder.wait_for_termination(Duration::from_secs(5)).await;
            let items = recorder.items();
            assert!(items.windows(2).all(|pair| pair[0] < pair[1]), "out of order delivery: {items:?}");
        }
    }
}
