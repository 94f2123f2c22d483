//! Errors for the few fallible setup operations of this crate.\
//! Errors flowing through observables are user typed and travel through `Observer::on_error()` instead.

use thiserror::Error;


#[derive(Debug, Error)]
pub enum SchedulerError {

    #[error("No tokio runtime is running in this context -- use `TokioScheduler::from_handle()` or `TokioScheduler::shared()` instead")]
    NoCurrentRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Couldn't build the shared tokio runtime: {reason}")]
    SharedRuntimeUnavailable { reason: String },
}
