//! Resting place for [TokioScheduler]

use super::Scheduler;
use crate::{
    disposable::{Disposable, Subscription},
    error::SchedulerError,
    types::{PeriodicTask, Task},
};
use std::{
    fmt::{Debug, Formatter},
    future::Future,
    sync::Arc,
    time::Duration,
};
use tokio::{
    runtime::{Builder, Handle, Runtime},
    time::{Instant, MissedTickBehavior},
};
use once_cell::sync::Lazy;
use log::{debug, trace};


/// A process-wide runtime, for users that don't run one of their own
static SHARED_RUNTIME: Lazy<Result<Runtime, String>> = Lazy::new(|| {
    debug!("TokioScheduler: building the shared multi-threaded runtime");
    Builder::new_multi_thread()
        .enable_all()
        .thread_name("reactive-observables")
        .build()
        .map_err(|err| err.to_string())
});


/// Runs tasks on a tokio runtime -- each task becomes a tokio task, so tasks
/// scheduled in sequence may run in parallel on a multi-threaded runtime.\
/// Disposing the returned subscriptions aborts the underlying tokio tasks.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
    name:   Arc<str>,
}

impl TokioScheduler {

    /// Uses the runtime we are currently running in
    pub fn current() -> Result<Self, SchedulerError> {
        Ok(Self::from_handle(Handle::try_current()?))
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self::named(handle, "tokio")
    }

    /// Uses a lazily built process-wide multi-threaded runtime
    pub fn shared() -> Result<Self, SchedulerError> {
        SHARED_RUNTIME.as_ref()
            .map(|runtime| Self::named(runtime.handle().clone(), "tokio-shared"))
            .map_err(|reason| SchedulerError::SharedRuntimeUnavailable { reason: reason.clone() })
    }

    pub fn named(handle: Handle, name: impl Into<Arc<str>>) -> Self {
        Self { handle, name: name.into() }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawns `job(guard)`, tying the tokio task's lifetime to the returned subscription
    fn spawn<Job, Fut>(&self, job: Job) -> Subscription
                      where Job: FnOnce(Subscription) -> Fut,
                            Fut: Future<Output=()> + Send + 'static {
        let subscription = Subscription::new();
        let join_handle = self.handle.spawn(job(subscription.clone()));
        trace!("{}: spawned task for {:?}", self.name, subscription);
        let abort_handle = join_handle.abort_handle();
        subscription.add_teardown(move || abort_handle.abort());
        subscription
    }
}

impl Scheduler for TokioScheduler {

    fn schedule(&self, task: Task) -> Subscription {
        self.spawn(|guard| async move {
            if !guard.is_disposed() {
                task();
                guard.dispose();
            }
        })
    }

    fn schedule_after(&self, delay: Duration, task: Task) -> Subscription {
        self.spawn(move |guard| async move {
            tokio::time::sleep(delay).await;
            if !guard.is_disposed() {
                task();
                guard.dispose();
            }
        })
    }

    fn schedule_periodic(&self, period: Duration, mut task: PeriodicTask) -> Subscription {
        self.spawn(move |guard| async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if guard.is_disposed() || task().is_break() {
                    break
                }
            }
            guard.dispose();
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Debug for TokioScheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokioScheduler {{name: '{}', runtime: {:?}}}", self.name, self.handle.runtime_flavor())
    }
}


/// Unit tests the [tokio_scheduler](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use std::{
        ops::ControlFlow,
        sync::atomic::{AtomicU32, Ordering::Relaxed},
    };

    #[cfg_attr(not(doc),test)]
    fn current_requires_a_runtime() {
        match TokioScheduler::current() {
            Err(SchedulerError::NoCurrentRuntime(_)) => (),
            other => panic!("expected `NoCurrentRuntime`, got {other:?}"),
        }
    }

    #[cfg_attr(not(doc),test)]
    fn shared_runtime_runs_tasks() {
        let scheduler = TokioScheduler::shared().expect("the shared runtime should be buildable");
        let (sender, receiver) = std::sync::mpsc::channel();
        let caller_thread = std::thread::current().id();
        scheduler.schedule(Box::new(move || sender.send(std::thread::current().id()).expect("receiver alive")));
        let task_thread = receiver.recv_timeout(Duration::from_secs(5)).expect("the task should have run");
        assert_ne!(task_thread, caller_thread);
        assert_eq!(scheduler.name(), "tokio-shared");
    }

    #[cfg_attr(not(doc),tokio::test)]
    async fn delayed_tasks_may_be_cancelled() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let runs = Arc::new(AtomicU32::new(0));
        let (runs_a, runs_b) = (Arc::clone(&runs), Arc::clone(&runs));
        let kept      = scheduler.schedule_after(Duration::from_millis(10), Box::new(move || { runs_a.fetch_add(1, Relaxed); }));
        let cancelled = scheduler.schedule_after(Duration::from_millis(10), Box::new(move || { runs_b.fetch_add(10, Relaxed); }));
        cancelled.dispose();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Relaxed), 1);
        assert!(kept.is_disposed(), "finished tasks report their subscriptions as disposed");
    }

    #[cfg_attr(not(doc),tokio::test)]
    async fn periodic_tasks() {
        let scheduler = TokioScheduler::current().expect("inside a runtime");
        let runs = Arc::new(AtomicU32::new(0));
        let runs_ref = Arc::clone(&runs);
        let subscription = scheduler.schedule_periodic(Duration::from_millis(2), Box::new(move || {
            if runs_ref.fetch_add(1, Relaxed) + 1 == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Relaxed), 3);
        assert!(subscription.is_disposed());
    }
}
