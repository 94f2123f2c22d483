//! Resting place for [PublishSubject]

use super::subject_core::{NoReplay, SubjectCore};
use crate::{
    observable::Observable,
    observer::Observer,
    types::Terminal,
};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};


/// Multicasts events to the subscribers present at the time each event is emitted:
/// newcomers only see what comes after they subscribed.\
/// Subscribing after termination yields just the terminal event.\
/// Emitting into this very subject from inside one of its deliveries deadlocks -- so does having two subjects feed each
/// other from their callbacks on different threads. Feed it from elsewhere, or hop through `observe_on()` first.
pub struct PublishSubject<T, E> {
    core: Arc<SubjectCore<T, E, NoReplay>>,
}

impl<T, E> Clone for PublishSubject<T, E> {
    fn clone(&self) -> Self {
        Self { core: Arc::clone(&self.core) }
    }
}

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> PublishSubject<T, E> {

    pub fn new() -> Self {
        Self { core: SubjectCore::new("PublishSubject", NoReplay) }
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

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> Default for PublishSubject<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> Observer<T, E> for PublishSubject<T, E> {
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

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> Debug for PublishSubject<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublishSubject {{observers: {}, terminated: {}}}", self.observer_count(), self.is_terminated())
    }
}


/// Unit tests the [publish_subject](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use crate::disposable::Disposable;
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;
    use std::sync::atomic::{AtomicBool, Ordering::Relaxed};

    #[cfg_attr(not(doc),test)]
    fn subscribers_only_see_what_comes_after_them() {
        let subject = PublishSubject::<u32, String>::new();
        let early = Recorder::new();
        let late = Recorder::new();
        subject.on_next(0);
        subject.as_observable().subscribe(early.observer());
        subject.on_next(1);
        subject.as_observable().subscribe(late.observer());
        subject.on_next(2);
        subject.on_completed();
        assert_eq!(early.notifications(), vec![Notification::Next(1), Notification::Next(2), Notification::Completed]);
        assert_eq!(late.notifications(),  vec![Notification::Next(2), Notification::Completed]);
        assert!(subject.is_terminated());
        assert!(!subject.has_observers());
    }

    #[cfg_attr(not(doc),test)]
    fn terminated_subjects_ignore_input_and_replay_the_terminal_event() {
        let subject = PublishSubject::<u32, String>::new();
        subject.on_error("failed".to_string());
        subject.on_next(1);
        subject.on_completed();
        let late = Recorder::new();
        subject.as_observable().subscribe(late.observer());
        assert_eq!(late.notifications(), vec![Notification::Error("failed".to_string())]);
    }

    #[cfg_attr(not(doc),test)]
    fn disposing_unregisters() {
        let subject = PublishSubject::<u32, ()>::new();
        let recorder = Recorder::new();
        let subscription = subject.as_observable().subscribe(recorder.observer());
        let other = subject.as_observable().subscribe_next(|_| {});
        assert_eq!(subject.observer_count(), 2);
        subject.on_next(1);
        subscription.dispose();
        assert_eq!(subject.observer_count(), 1);
        subject.on_next(2);
        assert_eq!(recorder.items(), vec![1]);
        other.dispose();
        assert!(!subject.has_observers());
    }

    #[cfg_attr(not(doc),test)]
    fn subjects_multicast_an_upstream() {
        let subject = PublishSubject::<u32, ()>::new();
        let doubled = Recorder::new();
        let tripled = Recorder::new();
        subject.as_observable().map(|n| n * 2).subscribe(doubled.observer());
        subject.as_observable().map(|n| n * 3).subscribe(tripled.observer());
        Observable::from_iter(1..=3).subscribe(subject.clone());
        assert_eq!(doubled.items(), vec![2, 4, 6]);
        assert_eq!(tripled.items(), vec![3, 6, 9]);
        assert!(doubled.is_completed() && tripled.is_completed());
    }

    #[cfg_attr(not(doc),test)]
    fn observers_may_subscribe_from_within_their_callbacks() {
        let subject = PublishSubject::<u32, ()>::new();
        let inner = Recorder::new();
        let inner_ref = inner.clone();
        let source = subject.clone();
        let subscribed = AtomicBool::new(false);
        subject.as_observable().subscribe_next(move |_| {
            if !subscribed.swap(true, Relaxed) {
                source.as_observable().subscribe(inner_ref.observer());
            }
        });
        subject.on_next(1);
        assert_eq!(subject.observer_count(), 2);
        subject.on_next(2);
        assert_eq!(inner.items(), vec![2], "newcomers only see what comes after they subscribed");
    }

    #[cfg_attr(not(doc),test)]
    fn observers_may_dispose_from_within_their_callbacks() {
        let subject = PublishSubject::<u32, ()>::new();
        let recorder = Recorder::new();
        subject.as_observable().take(2).subscribe(recorder.observer());
        (1..=5).for_each(|n| subject.on_next(n));
        assert_eq!(recorder.notifications(), vec![Notification::Next(1), Notification::Next(2), Notification::Completed]);
        assert!(!subject.has_observers());
    }
}
