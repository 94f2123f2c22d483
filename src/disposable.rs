//! Resting place for [Subscription] & [DisposeBag] -- the cancellation handles of this crate

use std::{
    fmt::{Debug, Formatter},
    mem,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering::{Relaxed, AcqRel, Acquire, Release}},
    },
};
use log::trace;


static SUBSCRIPTION_COUNTER: AtomicU64 = AtomicU64::new(0);
pub type SubscriptionId = u64;


/// Something that may be cancelled -- releasing whatever resources it holds
pub trait Disposable: Send + Sync {

    /// Cancels the underlying work. Calling it more than once has no further effect
    fn dispose(&self);

    /// Tells if [Self::dispose()] was already called
    fn is_disposed(&self) -> bool;
}

/// Cleanup actions attached to a [Subscription]
enum Teardown {
    Action(Box<dyn FnOnce() + Send + 'static>),
    Disposable(Box<dyn Disposable + 'static>),
}

impl Teardown {
    fn run(self) {
        match self {
            Teardown::Action(action)         => action(),
            Teardown::Disposable(disposable) => disposable.dispose(),
        }
    }
}

struct SubscriptionInner {
    id:        SubscriptionId,
    disposed:  AtomicBool,
    teardowns: Mutex<Vec<Teardown>>,
}


/// The handle returned by `Observable::subscribe()`, through which the subscription may be cancelled.\
/// Clones share the same state: disposing any of them disposes all.\
/// Dropping a `Subscription` does not dispose it -- see [DisposeBag] for scope-bound subscriptions.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {

    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                id:        SUBSCRIPTION_COUNTER.fetch_add(1, Relaxed),
                disposed:  AtomicBool::new(false),
                teardowns: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A subscription that starts out disposed -- for producers that finish synchronously
    pub fn disposed() -> Self {
        let subscription = Self::new();
        subscription.inner.disposed.store(true, Relaxed);
        subscription
    }

    pub fn id(&self) -> SubscriptionId {
        self.inner.id
    }

    /// Registers `action` to be run when this subscription gets disposed.\
    /// If it already is, `action` runs right away
    pub fn add_teardown(&self, action: impl FnOnce() + Send + 'static) {
        self.push_teardown(Teardown::Action(Box::new(action)));
    }

    /// Ties `disposable` to this subscription, so disposing us disposes it as well
    pub fn add(&self, disposable: impl Disposable + 'static) {
        self.push_teardown(Teardown::Disposable(Box::new(disposable)));
    }

    /// Creates a new subscription that will be disposed together with this one
    /// (but that may also be disposed on its own)
    pub fn child(&self) -> Subscription {
        let child = Subscription::new();
        self.add(child.clone());
        child
    }

    fn push_teardown(&self, teardown: Teardown) {
        if !self.inner.disposed.load(Acquire) {
            let mut teardowns = self.inner.teardowns.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // re-check under the lock: `dispose()` sets the flag before draining the list
            if !self.inner.disposed.load(Acquire) {
                teardowns.push(teardown);
                return
            }
        }
        teardown.run();
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl Disposable for Subscription {

    fn dispose(&self) {
        if self.inner.disposed.swap(true, AcqRel) {
            return
        }
        let teardowns = {
            let mut teardowns = self.inner.teardowns.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            mem::take(&mut *teardowns)
        };
        trace!("Disposing subscription #{} ({} teardowns)", self.inner.id, teardowns.len());
        for teardown in teardowns {
            teardown.run();
        }
    }

    #[inline(always)]
    fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Acquire)
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription {{id: {}, disposed: {}}}", self.inner.id, self.is_disposed())
    }
}


/// Collects subscriptions, disposing all of them when the bag itself is disposed or dropped.\
/// Tie a bag to the lifetime of whatever owns the subscriptions.
#[derive(Default)]
pub struct DisposeBag {
    subscriptions: Mutex<Vec<Box<dyn Disposable>>>,
    disposed:      AtomicBool,
}

impl DisposeBag {

    pub fn new() -> Self {
        Self::default()
    }

    /// Holds `disposable` until the bag is disposed -- or disposes it immediately if that already happened
    pub fn insert(&self, disposable: impl Disposable + 'static) {
        {
            let mut subscriptions = self.subscriptions.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !self.disposed.load(Acquire) {
                subscriptions.push(Box::new(disposable));
                return
            }
        }
        disposable.dispose();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Disposable for DisposeBag {

    fn dispose(&self) {
        let subscriptions = {
            let mut subscriptions = self.subscriptions.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // set under the lock, so `insert()` never adds to an already drained bag
            self.disposed.store(true, Release);
            mem::take(&mut *subscriptions)
        };
        for subscription in subscriptions {
            subscription.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Acquire)
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Extension to place subscriptions into a [DisposeBag] fluently
pub trait DisposedBy {
    fn disposed_by(self, bag: &DisposeBag);
}

impl<D: Disposable + 'static> DisposedBy for D {
    fn disposed_by(self, bag: &DisposeBag) {
        bag.insert(self);
    }
}


/// Unit tests the [disposable](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[cfg_attr(not(doc),test)]
    fn teardowns_run_once_and_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let subscription = Subscription::new();
        for n in 0..3 {
            let log = Arc::clone(&log);
            subscription.add_teardown(move || log.lock().unwrap().push(n));
        }
        subscription.dispose();
        subscription.dispose();
        assert!(subscription.is_disposed());
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[cfg_attr(not(doc),test)]
    fn late_teardowns_run_immediately() {
        let ran = Arc::new(AtomicBool::new(false));
        let subscription = Subscription::disposed();
        let ran_ref = Arc::clone(&ran);
        subscription.add_teardown(move || ran_ref.store(true, Relaxed));
        assert!(ran.load(Relaxed), "a teardown added to a disposed subscription must run right away");
    }

    #[cfg_attr(not(doc),test)]
    fn children_follow_their_parent() {
        let parent = Subscription::new();
        let child = parent.child();
        let grandchild = child.child();
        assert!(!grandchild.is_disposed());
        parent.dispose();
        assert!(child.is_disposed());
        assert!(grandchild.is_disposed());

        // but not the other way around
        let parent = Subscription::new();
        let child = parent.child();
        child.dispose();
        assert!(!parent.is_disposed());
    }

    #[cfg_attr(not(doc),test)]
    fn clones_share_state() {
        let subscription = Subscription::new();
        let clone = subscription.clone();
        clone.dispose();
        assert!(subscription.is_disposed());
        assert_eq!(subscription.id(), clone.id());
    }

    #[cfg_attr(not(doc),test)]
    fn dispose_bag_disposes_on_drop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let subscriptions: Vec<Subscription> = (0..4).map(|_| Subscription::new()).collect();
        {
            let bag = DisposeBag::new();
            for subscription in &subscriptions {
                let counter = Arc::clone(&counter);
                subscription.add_teardown(move || { counter.fetch_add(1, Relaxed); });
                subscription.clone().disposed_by(&bag);
            }
            assert_eq!(bag.len(), 4);
            assert_eq!(counter.load(Relaxed), 0);
        }
        assert_eq!(counter.load(Relaxed), 4);
        assert!(subscriptions.iter().all(|subscription| subscription.is_disposed()));
    }

    #[cfg_attr(not(doc),test)]
    fn disposed_bag_rejects_newcomers() {
        let bag = DisposeBag::new();
        bag.dispose();
        let subscription = Subscription::new();
        bag.insert(subscription.clone());
        assert!(subscription.is_disposed());
        assert!(bag.is_empty());
    }
}
