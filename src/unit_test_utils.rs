//! Common code used across unit tests

use crate::{
    observer::Observer,
    types::Notification,
};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};


/// Records every event it observes, so tests may assert on what was delivered -- and in which order.\
/// Clones share the same record.
pub struct Recorder<T, E> {
    notifications: Arc<Mutex<Vec<Notification<T, E>>>>,
}

impl<T, E> Clone for Recorder<T, E> {
    fn clone(&self) -> Self {
        Self { notifications: Arc::clone(&self.notifications) }
    }
}

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> Recorder<T, E> {

    pub fn new() -> Self {
        Self { notifications: Arc::new(Mutex::new(Vec::new())) }
    }

    /// An observer feeding this recorder
    pub fn observer(&self) -> Self {
        self.clone()
    }

    pub fn notifications(&self) -> Vec<Notification<T, E>> {
        self.lock().clone()
    }

    /// The `on_next()` payloads only
    pub fn items(&self) -> Vec<T> {
        self.lock().iter()
            .filter_map(|notification| match notification {
                Notification::Next(item) => Some(item.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.lock().last(), Some(Notification::Completed))
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().last().map_or(false, Notification::is_terminal)
    }

    /// Polls until a terminal event is recorded, panicking if it doesn't happen within `timeout`
    pub async fn wait_for_termination(&self, timeout: Duration) {
        let start = Instant::now();
        while !self.is_terminated() {
            assert!(start.elapsed() < timeout, "Recorder: no terminal event after {timeout:?}. Got {} events so far", self.lock().len());
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification<T, E>>> {
        self.notifications.lock().expect("Recorder: poisoned mutex")
    }
}

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> Observer<T, E> for Recorder<T, E> {
    fn on_next(&self, item: T) {
        self.lock().push(Notification::Next(item))
    }
    fn on_error(&self, error: E) {
        self.lock().push(Notification::Error(error))
    }
    fn on_completed(&self) {
        self.lock().push(Notification::Completed)
    }
}

/// Automatically executed once, when the test binary starts
#[ctor::ctor]
fn suite_setup() {
    simple_logger::SimpleLogger::new().with_utc_timestamps().init().unwrap_or_else(|_| eprintln!("--> LOGGER WAS ALREADY STARTED"));
}
