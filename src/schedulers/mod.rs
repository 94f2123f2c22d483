//! Schedulers decide where & when work runs -- used by `subscribe_on()`, `observe_on()`,
//! `Observable::interval()` & friends

mod current_thread_scheduler;
mod tokio_scheduler;

pub use current_thread_scheduler::CurrentThreadScheduler;
pub use tokio_scheduler::TokioScheduler;

use crate::{
    disposable::Subscription,
    types::{PeriodicTask, Task},
};
use std::time::Duration;


/// An execution context for tasks.\
/// Every method returns a [Subscription]: disposing it before the task starts prevents it from running
/// -- and, for periodic tasks, stops any further repetitions.
pub trait Scheduler: Send + Sync + 'static {

    /// Runs `task` as soon as possible
    fn schedule(&self, task: Task) -> Subscription;

    /// Runs `task` after `delay` has elapsed
    fn schedule_after(&self, delay: Duration, task: Task) -> Subscription;

    /// Runs `task` once every `period` (the first run happening after one `period`),
    /// until it returns `ControlFlow::Break` or the returned subscription is disposed
    fn schedule_periodic(&self, period: Duration, task: PeriodicTask) -> Subscription;

    /// For logs & diagnostics
    fn name(&self) -> &str;
}
