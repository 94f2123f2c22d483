//! Resting place for [CurrentThreadScheduler]

use super::Scheduler;
use crate::{
    disposable::{Disposable, Subscription},
    types::{PeriodicTask, Task},
};
use std::{
    cell::RefCell,
    collections::VecDeque,
    time::Duration,
};
use log::trace;


thread_local! {
    /// `Some` while a trampoline is draining on this thread
    static TRAMPOLINE: RefCell<Option<VecDeque<(Task, Subscription)>>> = const { RefCell::new(None) };
}


/// Runs tasks on the calling thread, trampolining nested schedules:
///   - called from outside any task of this scheduler, the task runs right away;
///   - called from inside one, the task is queued, to be run (in FIFO order) once the current task returns.
///
/// This keeps the stack flat when tasks schedule other tasks.\
/// Delayed & periodic tasks block the thread running them. A periodic loop ends when the task breaks
/// or when its subscription is disposed: scheduled from within a task, the handle is returned before the loop
/// starts (it runs once the current task returns), so it may be disposed early or handed to another thread.
/// Scheduled from outside any task, the loop runs before returning, leaving `ControlFlow::Break` as the only exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentThreadScheduler;

impl CurrentThreadScheduler {

    pub fn new() -> Self {
        Self
    }

    /// Tells if the calling thread is currently running tasks from this scheduler
    pub fn is_trampolining() -> bool {
        TRAMPOLINE.with(|trampoline| trampoline.borrow().is_some())
    }

    /// Runs `task` right away if no trampoline is active on this thread -- or queues it on the active one.\
    /// `subscription` is disposed once the task finishes; if it gets disposed before the task starts, the task is skipped
    fn run_or_enqueue(task: Task, subscription: Subscription) {
        let pending = TRAMPOLINE.with(|trampoline| {
            let mut trampoline = trampoline.borrow_mut();
            match trampoline.as_mut() {
                Some(queue) => {
                    queue.push_back((task, subscription));
                    trace!("CurrentThreadScheduler: task queued behind {} others", queue.len()-1);
                    None
                },
                None => {
                    *trampoline = Some(VecDeque::new());
                    Some((task, subscription))
                },
            }
        });
        if let Some((task, subscription)) = pending {
            Self::drain(task, subscription);
        }
    }

    fn drain(first: Task, first_subscription: Subscription) {
        let _guard = TrampolineGuard;
        let mut next = Some((first, first_subscription));
        while let Some((task, subscription)) = next {
            if !subscription.is_disposed() {
                task();
                subscription.dispose();
            }
            next = TRAMPOLINE.with(|trampoline| {
                let mut trampoline = trampoline.borrow_mut();
                let next = trampoline.as_mut().and_then(VecDeque::pop_front);
                if next.is_none() {
                    *trampoline = None;
                }
                next
            });
        }
    }
}

/// Tears the trampoline down if a task panics, so the thread isn't left queueing tasks no one will run
struct TrampolineGuard;

impl Drop for TrampolineGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            TRAMPOLINE.with(|trampoline| *trampoline.borrow_mut() = None);
        }
    }
}

impl Scheduler for CurrentThreadScheduler {

    fn schedule(&self, task: Task) -> Subscription {
        let subscription = Subscription::new();
        Self::run_or_enqueue(task, subscription.clone());
        subscription
    }

    fn schedule_after(&self, delay: Duration, task: Task) -> Subscription {
        std::thread::sleep(delay);
        self.schedule(task)
    }

    fn schedule_periodic(&self, period: Duration, mut task: PeriodicTask) -> Subscription {
        let subscription = Subscription::new();
        let cancellation = subscription.clone();
        Self::run_or_enqueue(Box::new(move || {
            loop {
                std::thread::sleep(period);
                if cancellation.is_disposed() || task().is_break() {
                    break
                }
            }
        }), subscription.clone());
        subscription
    }

    fn name(&self) -> &str {
        "current-thread"
    }
}


/// Unit tests the [current_thread_scheduler](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use std::{ops::ControlFlow, sync::{Arc, Mutex, atomic::{AtomicU32, Ordering::Relaxed}}};

    #[cfg_attr(not(doc),test)]
    fn runs_inline_when_idle() {
        let ran = Arc::new(Mutex::new(false));
        let ran_ref = Arc::clone(&ran);
        let subscription = CurrentThreadScheduler::new().schedule(Box::new(move || *ran_ref.lock().unwrap() = true));
        assert!(*ran.lock().unwrap());
        assert!(subscription.is_disposed(), "a finished task should report its subscription as disposed");
        assert!(!CurrentThreadScheduler::is_trampolining());
    }

    #[cfg_attr(not(doc),test)]
    fn nested_tasks_are_trampolined() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = CurrentThreadScheduler::new();
        let outer_log = Arc::clone(&log);
        scheduler.schedule(Box::new(move || {
            outer_log.lock().unwrap().push("outer: start");
            for name in ["first nested", "second nested"] {
                let nested_log = Arc::clone(&outer_log);
                scheduler.schedule(Box::new(move || nested_log.lock().unwrap().push(name)));
            }
            outer_log.lock().unwrap().push("outer: end");
        }));
        assert_eq!(*log.lock().unwrap(), vec!["outer: start", "outer: end", "first nested", "second nested"]);
    }

    #[cfg_attr(not(doc),test)]
    fn disposed_queued_tasks_are_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = CurrentThreadScheduler::new();
        let outer_log = Arc::clone(&log);
        scheduler.schedule(Box::new(move || {
            let nested_log = Arc::clone(&outer_log);
            let nested = scheduler.schedule(Box::new(move || nested_log.lock().unwrap().push("nested")));
            nested.dispose();
            outer_log.lock().unwrap().push("outer");
        }));
        assert_eq!(*log.lock().unwrap(), vec!["outer"]);
    }

    #[cfg_attr(not(doc),test)]
    fn periodic_tasks_scheduled_from_a_task_may_be_stopped_from_another_thread() {
        let ticks = Arc::new(AtomicU32::new(0));
        let ticks_ref = Arc::clone(&ticks);
        let scheduler = CurrentThreadScheduler::new();
        scheduler.schedule(Box::new(move || {
            let periodic = scheduler.schedule_periodic(Duration::from_millis(1), Box::new(move || {
                ticks_ref.fetch_add(1, Relaxed);
                ControlFlow::Continue(())
            }));
            assert!(!periodic.is_disposed(), "the loop only starts once this task returns");
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                periodic.dispose();
            });
        }));
        // reaching here means the never-breaking loop was stopped by the disposal
        assert!(ticks.load(Relaxed) > 0);
        assert!(!CurrentThreadScheduler::is_trampolining());
    }

    #[cfg_attr(not(doc),test)]
    fn periodic_tasks_disposed_before_starting_never_run() {
        let ticks = Arc::new(AtomicU32::new(0));
        let ticks_ref = Arc::clone(&ticks);
        let scheduler = CurrentThreadScheduler::new();
        scheduler.schedule(Box::new(move || {
            scheduler.schedule_periodic(Duration::from_millis(1), Box::new(move || {
                ticks_ref.fetch_add(1, Relaxed);
                ControlFlow::Continue(())
            })).dispose();
        }));
        assert_eq!(ticks.load(Relaxed), 0);
    }

    #[cfg_attr(not(doc),test)]
    fn periodic_tasks_break() {
        let counter = Arc::new(Mutex::new(0));
        let counter_ref = Arc::clone(&counter);
        CurrentThreadScheduler::new().schedule_periodic(Duration::from_millis(1), Box::new(move || {
            let mut counter = counter_ref.lock().unwrap();
            *counter += 1;
            if *counter == 5 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        }));
        assert_eq!(*counter.lock().unwrap(), 5);
    }
}
