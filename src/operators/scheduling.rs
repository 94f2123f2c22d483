//! `subscribe_on()` & `observe_on()`: moving work between [Scheduler]s

use crate::{
    config::{ConstConfig, DrainModes, OverflowStrategies, DEFAULT_CONFIG},
    observable::Observable,
    observer::{Observer, Subscriber},
    schedulers::Scheduler,
    types::Notification,
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use log::warn;


impl<T: Send + 'static, E: Send + 'static> Observable<T, E> {

    /// Performs the upstream subscription on `scheduler` -- and, with it, any synchronous
    /// emissions the upstream producer makes while being subscribed.\
    /// Disposing before the scheduled subscription runs cancels it.
    pub fn subscribe_on<S: Scheduler + Clone>(&self, scheduler: S) -> Self {
        let source = self.clone();
        Observable::create(move |downstream: Subscriber<T, E>| {
            let source = source.clone();
            let upstream_subscription = downstream.child_subscription();
            let forward_to = downstream.clone();
            let scheduled = scheduler.schedule(Box::new(move || source.subscribe_in(forward_to, upstream_subscription)));
            downstream.add(scheduled);
        })
    }

    /// Delivers every notification downstream from `scheduler`, preserving their order and never overlapping
    /// deliveries, using [DEFAULT_CONFIG] -- see [Self::observe_on_configured()]
    pub fn observe_on<S: Scheduler + Clone>(&self, scheduler: S) -> Self {
        self.observe_on_configured::<DEFAULT_CONFIG, S>(scheduler)
    }

    /// Same as [Self::observe_on()], with the queue between the producer & the `scheduler` configured by `CONFIG`
    /// -- see [ConstConfig] for the buffer size, overflow strategy & drain mode options.\
    /// Terminal notifications are never dropped.
    pub fn observe_on_configured<const CONFIG: u64, S: Scheduler + Clone>(&self, scheduler: S) -> Self {
        let source = self.clone();
        Observable::create(move |downstream: Subscriber<T, E>| {
            let observer = ObserveOnObserver::<CONFIG, T, E, S> {
                shared: Arc::new(ObserveOnShared {
                    downstream: downstream.clone(),
                    scheduler:  scheduler.clone(),
                    queue:      Mutex::new(DrainQueue { notifications: VecDeque::new(), draining: false }),
                }),
            };
            source.subscribe_for(&downstream, observer);
        })
    }
}


struct DrainQueue<T, E> {
    notifications: VecDeque<Notification<T, E>>,
    /// `true` while a drain task is scheduled or running
    draining:      bool,
}

struct ObserveOnShared<T, E, S> {
    downstream: Subscriber<T, E>,
    scheduler:  S,
    queue:      Mutex<DrainQueue<T, E>>,
}

impl<T, E, S> ObserveOnShared<T, E, S> {
    fn lock_queue(&self) -> MutexGuard<'_, DrainQueue<T, E>> {
        self.queue.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct ObserveOnObserver<const CONFIG: u64, T, E, S> {
    shared: Arc<ObserveOnShared<T, E, S>>,
}

impl<const CONFIG: u64,
     T: Send + 'static,
     E: Send + 'static,
     S: Scheduler>
ObserveOnObserver<CONFIG, T, E, S> {

    /// The instance config this generic implementation adheres to
    const CONST_CONFIG: ConstConfig = ConstConfig::from(CONFIG);

    fn enqueue(&self, notification: Notification<T, E>) {
        let capacity = Self::CONST_CONFIG.observe_on_buffer as usize;
        let mut queue = self.shared.lock_queue();
        if !notification.is_terminal() && queue.notifications.len() >= capacity {
            match Self::CONST_CONFIG.overflow_strategy {
                OverflowStrategies::Unbounded => (),
                OverflowStrategies::DropNewest => {
                    warn!("`observe_on({})`: queue full ({capacity} notifications) -- dropping the newest item", self.shared.scheduler.name());
                    return
                },
                OverflowStrategies::DropOldest => {
                    warn!("`observe_on({})`: queue full ({capacity} notifications) -- dropping the oldest item", self.shared.scheduler.name());
                    queue.notifications.pop_front();
                },
                OverflowStrategies::WaitForUpToMillis(millis) => {
                    drop(queue);
                    queue = match self.wait_for_room(capacity, Duration::from_millis(millis as u64)) {
                        Some(queue) => queue,
                        None => {
                            warn!("`observe_on({})`: queue still full ({capacity} notifications) after waiting for {millis}ms -- dropping the newest item", self.shared.scheduler.name());
                            return
                        },
                    };
                },
            }
        }
        queue.notifications.push_back(notification);
        let schedule_drain = !queue.draining;
        queue.draining = true;
        drop(queue);
        if schedule_drain {
            Self::schedule_drain(Arc::clone(&self.shared));
        }
    }

    /// Yields the producer's thread until the queue has room (returning it locked) or `timeout` elapses
    fn wait_for_room(&self, capacity: usize, timeout: Duration) -> Option<MutexGuard<'_, DrainQueue<T, E>>> {
        let deadline = Instant::now() + timeout;
        loop {
            std::thread::yield_now();
            let queue = self.shared.lock_queue();
            if queue.notifications.len() < capacity {
                return Some(queue)
            }
            if Instant::now() >= deadline {
                return None
            }
        }
    }

    fn schedule_drain(shared: Arc<ObserveOnShared<T, E, S>>) {
        let task_shared = Arc::clone(&shared);
        // no need to keep the returned subscription: the drain task checks the downstream by itself
        let _ = shared.scheduler.schedule(Box::new(move || Self::drain(task_shared)));
    }

    fn drain(shared: Arc<ObserveOnShared<T, E, S>>) {
        loop {
            let notification = {
                let mut queue = shared.lock_queue();
                if shared.downstream.is_closed() {
                    queue.notifications.clear();
                }
                match queue.notifications.pop_front() {
                    Some(notification) => notification,
                    None => {
                        queue.draining = false;
                        return
                    },
                }
            };
            notification.deliver_to(&shared.downstream);
            if Self::CONST_CONFIG.drain_mode == DrainModes::PerItem {
                let mut queue = shared.lock_queue();
                if queue.notifications.is_empty() {
                    queue.draining = false;
                } else {
                    drop(queue);
                    Self::schedule_drain(shared);
                }
                return
            }
        }
    }
}

impl<const CONFIG: u64,
     T: Send + 'static,
     E: Send + 'static,
     S: Scheduler>
Observer<T, E> for ObserveOnObserver<CONFIG, T, E, S> {

    fn on_next(&self, item: T) {
        self.enqueue(Notification::Next(item))
    }
    fn on_error(&self, error: E) {
        self.enqueue(Notification::Error(error))
    }
    fn on_completed(&self) {
        self.enqueue(Notification::Completed)
    }
}


/// Unit tests the [scheduling](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use crate::disposable::Disposable;
    use crate::schedulers::{CurrentThreadScheduler, TokioScheduler};
    use crate::subjects::PublishSubject;
    use crate::unit_test_utils::Recorder;
    use std::thread::{self, ThreadId};

    #[cfg_attr(not(doc),tokio::test(flavor = "multi_thread"))]
    async fn subscribe_on_moves_the_subscription() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let caller_thread = thread::current().id();
        let recorder = Recorder::<ThreadId, ()>::new();
        Observable::<ThreadId, ()>::create(|subscriber| {
            subscriber.on_next(thread::current().id());
            subscriber.on_completed();
        }).subscribe_on(scheduler)
          .subscribe(recorder.observer());
        recorder.wait_for_termination(Duration::from_secs(5)).await;
        let producer_thread = recorder.items()[0];
        assert_ne!(producer_thread, caller_thread);
    }

    #[cfg_attr(not(doc),tokio::test)]
    async fn subscribe_on_may_be_cancelled() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let recorder = Recorder::<u32, ()>::new();
        // the current-thread runtime won't run the scheduled subscription before we yield
        let subscription = Observable::just(1).subscribe_on(scheduler).subscribe(recorder.observer());
        subscription.dispose();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(recorder.notifications().is_empty());
    }

    #[cfg_attr(not(doc),tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn observe_on_preserves_order() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let recorder = Recorder::<u32, ()>::new();
        const CONFIG: u64 = ConstConfig { overflow_strategy: OverflowStrategies::Unbounded, ..ConstConfig::default() }.into();
        Observable::from_iter(0..10_000)
            .observe_on_configured::<CONFIG, _>(scheduler)
            .subscribe(recorder.observer());
        recorder.wait_for_termination(Duration::from_secs(5)).await;
        assert_eq!(recorder.items(), (0..10_000).collect::<Vec<_>>());
        assert!(recorder.is_completed());
    }

    #[cfg_attr(not(doc),tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn observe_on_per_item_draining() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let recorder = Recorder::<u32, ()>::new();
        const CONFIG: u64 = ConstConfig { drain_mode: DrainModes::PerItem, overflow_strategy: OverflowStrategies::Unbounded, ..ConstConfig::default() }.into();
        Observable::from_iter(0..500)
            .observe_on_configured::<CONFIG, _>(scheduler)
            .subscribe(recorder.observer());
        recorder.wait_for_termination(Duration::from_secs(5)).await;
        assert_eq!(recorder.items(), (0..500).collect::<Vec<_>>());
    }

    #[cfg_attr(not(doc),test)]
    fn observe_on_the_current_thread_delivers_inline() {
        let recorder = Recorder::<u32, ()>::new();
        Observable::from_iter(1..=3)
            .observe_on(CurrentThreadScheduler::new())
            .subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Next(1), Notification::Next(2), Notification::Next(3), Notification::Completed]);
    }

    /// Fills the queue while the drain task can't run -- the producer being itself a trampolined task
    /// of the same current-thread scheduler -- then checks which items survived the overflow
    fn overflow_survivors<const CONFIG: u64>() -> Vec<Notification<u32, ()>> {
        let scheduler = CurrentThreadScheduler::new();
        let recorder = Recorder::<u32, ()>::new();
        let subject = PublishSubject::<u32, ()>::new();
        subject.as_observable()
            .observe_on_configured::<CONFIG, _>(scheduler)
            .subscribe(recorder.observer());
        scheduler.schedule(Box::new(move || {
            (1..=6).for_each(|n| subject.on_next(n));
            subject.on_completed();
        }));
        recorder.notifications()
    }

    #[cfg_attr(not(doc),test)]
    fn observe_on_overflow_strategies() {
        const DROP_NEWEST: u64 = ConstConfig { observe_on_buffer: 4, overflow_strategy: OverflowStrategies::DropNewest, ..ConstConfig::default() }.into();
        const DROP_OLDEST: u64 = ConstConfig { observe_on_buffer: 4, overflow_strategy: OverflowStrategies::DropOldest, ..ConstConfig::default() }.into();
        const WAIT:        u64 = ConstConfig { observe_on_buffer: 4, overflow_strategy: OverflowStrategies::WaitForUpToMillis(1), ..ConstConfig::default() }.into();
        const UNBOUNDED:   u64 = ConstConfig { observe_on_buffer: 4, overflow_strategy: OverflowStrategies::Unbounded, ..ConstConfig::default() }.into();
        let items = |notifications: Vec<Notification<u32, ()>>| {
            assert_eq!(notifications.last(), Some(&Notification::Completed), "terminal notifications must never be dropped");
            notifications.into_iter()
                .filter_map(|notification| if let Notification::Next(n) = notification { Some(n) } else { None })
                .collect::<Vec<_>>()
        };
        assert_eq!(items(overflow_survivors::<DROP_NEWEST>()), vec![1, 2, 3, 4]);
        assert_eq!(items(overflow_survivors::<DROP_OLDEST>()), vec![3, 4, 5, 6]);
        assert_eq!(items(overflow_survivors::<WAIT>()),        vec![1, 2, 3, 4]);
        assert_eq!(items(overflow_survivors::<UNBOUNDED>()),   vec![1, 2, 3, 4, 5, 6]);
    }

    /// A producer faster than the consumer, with a tiny queue: waiting for room must lose nothing
    /// as long as the consumer frees a slot within the wait window
    #[cfg_attr(not(doc),tokio::test(flavor = "multi_thread", worker_threads = 2))]
    async fn observe_on_waits_for_a_slow_consumer() {
        const CONFIG: u64 = ConstConfig { observe_on_buffer: 4, overflow_strategy: OverflowStrategies::WaitForUpToMillis(200), ..ConstConfig::default() }.into();
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let recorder = Recorder::<u32, ()>::new();
        let subject = PublishSubject::<u32, ()>::new();
        subject.as_observable()
            .observe_on_configured::<CONFIG, _>(scheduler)
            .do_on_next(|_| std::thread::sleep(Duration::from_millis(1)))
            .subscribe(recorder.observer());
        let producer = subject.clone();
        tokio::task::spawn_blocking(move || {
            (1..=50).for_each(|n| producer.on_next(n));
            producer.on_completed();
        }).await.expect("the producer shouldn't panic");
        recorder.wait_for_termination(Duration::from_secs(10)).await;
        assert_eq!(recorder.items(), (1..=50).collect::<Vec<_>>());
    }

    #[cfg_attr(not(doc),tokio::test(flavor = "multi_thread"))]
    async fn observe_on_stops_delivering_after_dispose() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let recorder = Recorder::<u32, ()>::new();
        let subject = PublishSubject::<u32, ()>::new();
        let subscription = subject.as_observable()
            .observe_on(scheduler)
            .subscribe(recorder.observer());
        subject.on_next(1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        subscription.dispose();
        subject.on_next(2);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(recorder.items(), vec![1]);
        assert!(!subject.has_observers());
    }
}
