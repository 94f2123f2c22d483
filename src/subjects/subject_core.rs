//! The machinery shared by all subjects: a registry of subscribers, termination tracking
//! & a pluggable [ReplayPolicy] deciding what newcomers get before the live events

use crate::{
    observer::{Observer, Subscriber},
    types::Terminal,
};
use std::{
    collections::VecDeque,
    mem,
    sync::{Arc, Mutex, MutexGuard},
};
use log::{debug, trace, warn};


/// Decides which past items a new subscriber receives before the live ones
pub(crate) trait ReplayPolicy<T>: Send + 'static {
    /// If `true`, subscribers arriving after termination still get the replay, followed by the terminal event.
    /// Otherwise, they get just the terminal event
    const REPLAYS_AFTER_TERMINATION: bool;
    /// Called, under the registry lock, for every item emitted while live
    fn record(&mut self, item: &T);
    /// What a new subscriber should receive first
    fn replay(&self) -> Vec<T>;
    /// Called, under the registry lock, when the subject terminates
    fn on_terminated(&mut self) {}
}

/// Publish semantics: no history at all
pub(crate) struct NoReplay;

impl<T> ReplayPolicy<T> for NoReplay {
    const REPLAYS_AFTER_TERMINATION: bool = false;
    fn record(&mut self, _item: &T) {}
    fn replay(&self) -> Vec<T> {
        Vec::new()
    }
}

/// Behavior semantics: only the latest item, forgotten on termination
pub(crate) struct LatestValue<T>(pub(crate) Option<T>);

impl<T: Clone + Send + 'static> ReplayPolicy<T> for LatestValue<T> {
    const REPLAYS_AFTER_TERMINATION: bool = false;
    fn record(&mut self, item: &T) {
        self.0 = Some(item.clone());
    }
    fn replay(&self) -> Vec<T> {
        self.0.iter().cloned().collect()
    }
    fn on_terminated(&mut self) {
        self.0 = None;
    }
}

/// Replay semantics: all items, or the most recent `capacity` ones
pub(crate) struct ReplayBuffer<T> {
    pub(crate) items:    VecDeque<T>,
    pub(crate) capacity: Option<usize>,
}

impl<T: Clone + Send + 'static> ReplayPolicy<T> for ReplayBuffer<T> {
    const REPLAYS_AFTER_TERMINATION: bool = true;
    fn record(&mut self, item: &T) {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return
            }
            while self.items.len() >= capacity {
                self.items.pop_front();
            }
        }
        self.items.push_back(item.clone());
    }
    fn replay(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}


/// A registered subscriber.\
/// `delivery` serializes the deliveries to it, so live events wait for the replay to finish
struct ObserverEntry<T, E> {
    id:         u64,
    subscriber: Subscriber<T, E>,
    delivery:   Mutex<()>,
}

pub(crate) struct SubjectState<T, E, R> {
    entries:           Vec<Arc<ObserverEntry<T, E>>>,
    terminal:          Option<Terminal<E>>,
    pub(crate) replay: R,
    next_id:           u64,
}

impl<T, E, R> SubjectState<T, E, R> {
    pub(crate) fn is_terminated(&self) -> bool {
        self.terminal.is_some()
    }
}

/// Shared core of every subject.\
/// Events are never delivered while holding the registry lock: observers may subscribe to,
/// or dispose from, the very same subject inside their callbacks.
/// Emitting into a subject from inside one of its own deliveries is not supported, though.
pub(crate) struct SubjectCore<T, E, R> {
    name:  &'static str,
    state: Mutex<SubjectState<T, E, R>>,
}

fn lock<Guarded>(mutex: &Mutex<Guarded>) -> MutexGuard<'_, Guarded> {
    mutex.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: Clone + Send + 'static,
     E: Clone + Send + 'static,
     R: ReplayPolicy<T>>
SubjectCore<T, E, R> {

    pub(crate) fn new(name: &'static str, replay: R) -> Arc<Self> {
        Arc::new(Self {
            name,
            state: Mutex::new(SubjectState {
                entries:  Vec::new(),
                terminal: None,
                replay,
                next_id:  0,
            }),
        })
    }

    /// Gives `inspector` a look into the state -- for queries like `BehaviorSubject::value()`
    pub(crate) fn inspect<Ret>(&self, inspector: impl FnOnce(&SubjectState<T, E, R>) -> Ret) -> Ret {
        inspector(&lock(&self.state))
    }

    pub(crate) fn observer_count(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub(crate) fn emit_next(&self, item: T) {
        let entries = {
            let mut state = lock(&self.state);
            if state.terminal.is_some() {
                return
            }
            state.replay.record(&item);
            state.entries.clone()
        };
        for entry in entries {
            let _delivery = lock(&entry.delivery);
            entry.subscriber.on_next(item.clone());
        }
    }

    pub(crate) fn emit_terminal(&self, terminal: Terminal<E>) {
        let entries = {
            let mut state = lock(&self.state);
            if state.terminal.is_some() {
                warn!("{}: ignoring a terminal event received after termination", self.name);
                return
            }
            state.terminal = Some(terminal.clone());
            state.replay.on_terminated();
            mem::take(&mut state.entries)
        };
        debug!("{}: terminating {} subscribers", self.name, entries.len());
        for entry in entries {
            let _delivery = lock(&entry.delivery);
            terminal.clone().deliver_to(&entry.subscriber);
        }
    }

    /// Adds `subscriber` to the registry, delivering it the replay first
    /// -- or, if already terminated, whatever the [ReplayPolicy] dictates plus the terminal event
    pub(crate) fn register(self: &Arc<Self>, subscriber: Subscriber<T, E>) {
        let mut state = lock(&self.state);

        let terminal = state.terminal.clone();
        if let Some(terminal) = terminal {
            let replay = if R::REPLAYS_AFTER_TERMINATION { state.replay.replay() } else { Vec::new() };
            drop(state);
            for item in replay {
                subscriber.on_next(item);
            }
            terminal.deliver_to(&subscriber);
            return
        }

        let id = state.next_id;
        state.next_id += 1;
        let entry = Arc::new(ObserverEntry { id, subscriber: subscriber.clone(), delivery: Mutex::new(()) });
        // taken before releasing the registry, so no live event may overtake the replay
        let delivery = lock(&entry.delivery);
        state.entries.push(Arc::clone(&entry));
        let replay = state.replay.replay();
        drop(state);
        trace!("{}: registered subscriber #{id}, replaying {} items", self.name, replay.len());

        for item in replay {
            subscriber.on_next(item);
        }
        drop(delivery);

        let core = Arc::downgrade(self);
        subscriber.add_teardown(move || {
            if let Some(core) = core.upgrade() {
                core.unregister(id);
            }
        });
    }

    fn unregister(&self, id: u64) {
        lock(&self.state).entries.retain(|entry| entry.id != id);
        trace!("{}: unregistered subscriber #{id}", self.name);
    }
}
