//! Resting place for [ReplaySubject]

use super::subject_core::{ReplayBuffer, SubjectCore};
use crate::{
    observable::Observable,
    observer::Observer,
    types::Terminal,
};
use std::{
    collections::VecDeque,
    sync::Arc,
};


/// A subject that records the items it sees, replaying them to every new subscriber before the live events
/// -- even after termination, in which case the terminal event follows the replay.\
/// The history may be unbounded ([Self::unbounded()]) or limited to the most recent items ([Self::with_capacity()]).\
/// Emitting into this very subject from inside one of its deliveries deadlocks -- so does having two subjects feed each
/// other from their callbacks on different threads. Feed it from elsewhere, or hop through `observe_on()` first.
pub struct ReplaySubject<T, E> {
    core: Arc<SubjectCore<T, E, ReplayBuffer<T>>>,
}

impl<T, E> Clone for ReplaySubject<T, E> {
    fn clone(&self) -> Self {
        Self { core: Arc::clone(&self.core) }
    }
}

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> ReplaySubject<T, E> {

    /// Remembers every item ever emitted
    pub fn unbounded() -> Self {
        Self::build(None)
    }

    /// Remembers only the latest `capacity` items
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Some(capacity))
    }

    fn build(capacity: Option<usize>) -> Self {
        let items = VecDeque::with_capacity(capacity.unwrap_or(0).min(1024));
        Self { core: SubjectCore::new("ReplaySubject", ReplayBuffer { items, capacity }) }
    }

    /// The consumer side of this subject
    pub fn as_observable(&self) -> Observable<T, E> {
        let core = Arc::clone(&self.core);
        Observable::create(move |subscriber| core.register(subscriber))
    }

    /// How many items a new subscriber would get replayed
    pub fn buffered_count(&self) -> usize {
        self.core.inspect(|state| state.replay.items.len())
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

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> Observer<T, E> for ReplaySubject<T, E> {
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


/// Unit tests the [replay_subject](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;

    #[cfg_attr(not(doc),test)]
    fn replays_everything_to_newcomers() {
        let subject = ReplaySubject::<u32, ()>::unbounded();
        (1..=3).for_each(|n| subject.on_next(n));
        let recorder = Recorder::new();
        subject.as_observable().subscribe(recorder.observer());
        subject.on_next(4);
        assert_eq!(recorder.items(), vec![1, 2, 3, 4]);
        assert_eq!(subject.buffered_count(), 4);
    }

    #[cfg_attr(not(doc),test)]
    fn bounded_history() {
        let subject = ReplaySubject::<u32, ()>::with_capacity(2);
        (1..=5).for_each(|n| subject.on_next(n));
        let recorder = Recorder::new();
        subject.as_observable().subscribe(recorder.observer());
        assert_eq!(recorder.items(), vec![4, 5]);

        let forgetful = ReplaySubject::<u32, ()>::with_capacity(0);
        forgetful.on_next(1);
        assert_eq!(forgetful.buffered_count(), 0);
    }

    #[cfg_attr(not(doc),test)]
    fn replays_after_termination_too() {
        let subject = ReplaySubject::<u32, String>::unbounded();
        subject.on_next(1);
        subject.on_next(2);
        subject.on_error("end of the line".to_string());
        let recorder = Recorder::new();
        subject.as_observable().subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![
            Notification::Next(1), Notification::Next(2), Notification::Error("end of the line".to_string()),
        ]);
    }
}
