//! `merge()` & `merge_all()`

use crate::{
    observable::Observable,
    observer::{Observer, Subscriber},
    types::Notification,
};
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        atomic::{AtomicUsize, Ordering::AcqRel},
    },
};


impl<T: Send + 'static, E: Send + 'static> Observable<T, E> {

    /// Interleaves the items of `self` & `other` -- see [Self::merge_all()]
    pub fn merge(&self, other: &Observable<T, E>) -> Self {
        Self::merge_all([self.clone(), other.clone()])
    }

    /// Interleaves the items of all `sources`, which may emit from different threads:
    /// deliveries are serialized, so downstream never sees overlapping calls.\
    /// Completes when all sources complete; errors as soon as any of them errors (disposing the others)
    pub fn merge_all(sources: impl IntoIterator<Item=Observable<T, E>>) -> Self {
        let sources: Arc<[Observable<T, E>]> = sources.into_iter().collect();
        Observable::create(move |downstream: Subscriber<T, E>| {
            if sources.is_empty() {
                downstream.on_completed();
                return
            }
            let shared = Arc::new(MergeShared {
                downstream: downstream.clone(),
                emitter:    Mutex::new(MergeEmitter { pending: VecDeque::new(), emitting: false }),
                active:     AtomicUsize::new(sources.len()),
            });
            for source in sources.iter() {
                if downstream.is_closed() {
                    break
                }
                source.subscribe_for(&downstream, MergeObserver { shared: Arc::clone(&shared) });
            }
        })
    }
}


/// Serializes the deliveries coming from the different sources without blocking:
/// whoever finds another thread (or itself, re-entrantly) emitting leaves its notification in `pending`,
/// to be delivered by the active emitter before it steps down
struct MergeEmitter<T, E> {
    pending:  VecDeque<Notification<T, E>>,
    emitting: bool,
}

struct MergeShared<T, E> {
    downstream: Subscriber<T, E>,
    emitter:    Mutex<MergeEmitter<T, E>>,
    /// how many sources haven't completed yet
    active:     AtomicUsize,
}

impl<T: Send + 'static, E: Send + 'static> MergeShared<T, E> {

    fn lock_emitter(&self) -> MutexGuard<'_, MergeEmitter<T, E>> {
        self.emitter.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, notification: Notification<T, E>) {
        {
            let mut emitter = self.lock_emitter();
            emitter.pending.push_back(notification);
            if emitter.emitting {
                return
            }
            emitter.emitting = true;
        }
        loop {
            let next = {
                let mut emitter = self.lock_emitter();
                let next = emitter.pending.pop_front();
                if next.is_none() {
                    emitter.emitting = false;
                }
                next
            };
            match next {
                Some(notification) => notification.deliver_to(&self.downstream),
                None => return,
            }
        }
    }
}

struct MergeObserver<T, E> {
    shared: Arc<MergeShared<T, E>>,
}

impl<T: Send + 'static, E: Send + 'static> Observer<T, E> for MergeObserver<T, E> {

    fn on_next(&self, item: T) {
        self.shared.emit(Notification::Next(item))
    }

    fn on_error(&self, error: E) {
        self.shared.emit(Notification::Error(error))
    }

    fn on_completed(&self) {
        if self.shared.active.fetch_sub(1, AcqRel) == 1 {
            self.shared.emit(Notification::Completed)
        }
    }
}


/// Unit tests the [combining](self) module
#[cfg(any(test,doc))]
mod tests {
    use crate::observable::Observable;
    use crate::schedulers::TokioScheduler;
    use crate::subjects::PublishSubject;
    use crate::observer::Observer;
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    #[cfg_attr(not(doc),test)]
    fn merge_completes_when_all_sources_do() {
        let left = PublishSubject::<&str, String>::new();
        let right = PublishSubject::<&str, String>::new();
        let recorder = Recorder::new();
        left.as_observable().merge(&right.as_observable()).subscribe(recorder.observer());
        left.on_next("l1");
        right.on_next("r1");
        left.on_completed();
        right.on_next("r2");
        assert!(!recorder.is_completed(), "one source is still active");
        right.on_completed();
        assert_eq!(recorder.notifications(), vec![
            Notification::Next("l1"), Notification::Next("r1"), Notification::Next("r2"), Notification::Completed,
        ]);
    }

    #[cfg_attr(not(doc),test)]
    fn merge_errors_eagerly() {
        let left = PublishSubject::<u32, String>::new();
        let right = PublishSubject::<u32, String>::new();
        let recorder = Recorder::new();
        left.as_observable().merge(&right.as_observable()).subscribe(recorder.observer());
        left.on_next(1);
        right.on_error("right failed".to_string());
        left.on_next(2);
        assert_eq!(recorder.notifications(), vec![Notification::Next(1), Notification::Error("right failed".to_string())]);
        assert!(!left.has_observers(), "the surviving source should have been disposed");
    }

    #[cfg_attr(not(doc),test)]
    fn downstream_may_feed_a_merged_source() {
        let left = PublishSubject::<u32, ()>::new();
        let right = PublishSubject::<u32, ()>::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_ref = Arc::clone(&received);
        let feedback = right.clone();
        left.as_observable().merge(&right.as_observable())
            .subscribe_next(move |n| {
                received_ref.lock().unwrap().push(n);
                if n == 1 {
                    feedback.on_next(2);
                    // not delivered yet: the outer delivery must finish first
                    assert_eq!(*received_ref.lock().unwrap(), vec![1]);
                }
            });
        left.on_next(1);
        assert_eq!(*received.lock().unwrap(), vec![1, 2]);
        right.on_next(3);
        assert_eq!(*received.lock().unwrap(), vec![1, 2, 3]);
    }

    #[cfg_attr(not(doc),test)]
    fn merge_all_of_nothing_completes() {
        let recorder = Recorder::<u32, ()>::new();
        Observable::merge_all(Vec::new()).subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Completed]);
    }

    #[cfg_attr(not(doc),tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn merge_across_threads() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let sources = (0..4_u32)
            .map(|source| Observable::<u32, ()>::from_iter((0..250).map(move |n| source * 1000 + n).collect::<Vec<_>>())
                                                 .subscribe_on(scheduler.clone()));
        let recorder = Recorder::new();
        Observable::merge_all(sources).subscribe(recorder.observer());
        recorder.wait_for_termination(Duration::from_secs(5)).await;
        let mut items = recorder.items();
        assert_eq!(items.len(), 1000);
        items.sort_unstable();
        items.dedup();
        assert_eq!(items.len(), 1000, "no item should have been duplicated");
    }
}
