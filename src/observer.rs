//! The consuming side of the protocol: the [Observer] trait, closure-based observers & the [Subscriber],
//! which guards observers against protocol violations from producers

use crate::disposable::{Disposable, Subscription};
use std::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering::AcqRel, Ordering::Acquire},
    },
};


/// A passive consumer of the events pushed by an `Observable`.\
/// Events follow the grammar `on_next* (on_error | on_completed)?`
/// -- which [Subscriber] enforces before they reach here.\
/// Methods take `&self` so a single observer may be shared between threads:
/// implementors needing mutable state should use interior mutability.
pub trait Observer<T, E>: Send + Sync {
    fn on_next(&self, item: T);
    fn on_error(&self, error: E);
    fn on_completed(&self);
}

impl<T, E, O: Observer<T, E> + ?Sized> Observer<T, E> for Arc<O> {
    #[inline(always)]
    fn on_next(&self, item: T) {
        (**self).on_next(item)
    }
    #[inline(always)]
    fn on_error(&self, error: E) {
        (**self).on_error(error)
    }
    #[inline(always)]
    fn on_completed(&self) {
        (**self).on_completed()
    }
}

impl<T, E, O: Observer<T, E> + ?Sized> Observer<T, E> for Box<O> {
    #[inline(always)]
    fn on_next(&self, item: T) {
        (**self).on_next(item)
    }
    #[inline(always)]
    fn on_error(&self, error: E) {
        (**self).on_error(error)
    }
    #[inline(always)]
    fn on_completed(&self) {
        (**self).on_completed()
    }
}


/// An [Observer] built out of closures
pub struct FnObserver<T, E, OnNext, OnError, OnCompleted> {
    on_next:      OnNext,
    on_error:     OnError,
    on_completed: OnCompleted,
    _phantom:     PhantomData<fn(T, E)>,
}

impl<T, E,
     OnNext:      Fn(T) + Send + Sync,
     OnError:     Fn(E) + Send + Sync,
     OnCompleted: Fn()  + Send + Sync>
FnObserver<T, E, OnNext, OnError, OnCompleted> {

    pub fn new(on_next: OnNext, on_error: OnError, on_completed: OnCompleted) -> Self {
        Self { on_next, on_error, on_completed, _phantom: PhantomData }
    }
}

impl<T, E,
     OnNext:      Fn(T) + Send + Sync,
     OnError:     Fn(E) + Send + Sync,
     OnCompleted: Fn()  + Send + Sync>
Observer<T, E> for
FnObserver<T, E, OnNext, OnError, OnCompleted> {

    #[inline(always)]
    fn on_next(&self, item: T) {
        (self.on_next)(item)
    }
    #[inline(always)]
    fn on_error(&self, error: E) {
        (self.on_error)(error)
    }
    #[inline(always)]
    fn on_completed(&self) {
        (self.on_completed)()
    }
}


struct SubscriberInner<T, E> {
    observer:     Box<dyn Observer<T, E>>,
    stopped:      AtomicBool,
    subscription: Subscription,
}

/// The producer-facing side of a subscription: wraps the user's [Observer] and its [Subscription],
/// dropping any events that would violate the protocol:
///   - nothing gets through after a terminal event (`on_error` / `on_completed`);
///   - nothing gets through after the subscription is disposed.
///
/// Delivering a terminal event disposes the subscription, running all its teardowns.\
/// Cloning is cheap and clones share the same state -- so producers may move copies into other threads or tasks.
pub struct Subscriber<T, E> {
    inner: Arc<SubscriberInner<T, E>>,
}

impl<T, E> Clone for Subscriber<T, E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: 'static, E: 'static> Subscriber<T, E> {

    pub fn new(observer: impl Observer<T, E> + 'static, subscription: Subscription) -> Self {
        Self {
            inner: Arc::new(SubscriberInner {
                observer: Box::new(observer),
                stopped:  AtomicBool::new(false),
                subscription,
            }),
        }
    }

    /// Producers should check this to stop emitting early:
    /// `true` after a terminal event was delivered or after the subscription got disposed
    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.inner.stopped.load(Acquire) || self.inner.subscription.is_disposed()
    }

    pub fn subscription(&self) -> &Subscription {
        &self.inner.subscription
    }

    /// See [Subscription::add_teardown()]
    pub fn add_teardown(&self, action: impl FnOnce() + Send + 'static) {
        self.inner.subscription.add_teardown(action)
    }

    /// See [Subscription::add()]
    pub fn add(&self, disposable: impl Disposable + 'static) {
        self.inner.subscription.add(disposable)
    }

    /// Creates a subscription disposed together with ours -- operators subscribe upstream with it,
    /// so a downstream disposal reaches the upstream producer even while it is still
    /// emitting synchronously (before `subscribe()` returned any handle)
    pub fn child_subscription(&self) -> Subscription {
        self.inner.subscription.child()
    }

    /// Delivers the terminal event (if allowed) & releases the subscription resources
    fn terminate(&self, deliver: impl FnOnce(&dyn Observer<T, E>)) {
        if self.inner.stopped.swap(true, AcqRel) {
            return
        }
        if !self.inner.subscription.is_disposed() {
            deliver(self.inner.observer.as_ref());
        }
        self.inner.subscription.dispose();
    }
}

impl<T: 'static, E: 'static> Observer<T, E> for Subscriber<T, E> {

    #[inline(always)]
    fn on_next(&self, item: T) {
        if !self.is_closed() {
            self.inner.observer.on_next(item);
        }
    }

    fn on_error(&self, error: E) {
        self.terminate(|observer| observer.on_error(error));
    }

    fn on_completed(&self) {
        self.terminate(|observer| observer.on_completed());
    }
}

impl<T, E> Debug for Subscriber<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscriber {{stopped: {}, subscription: {:?}}}", self.inner.stopped.load(Acquire), self.inner.subscription)
    }
}


/// Unit tests the [observer](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;

    #[cfg_attr(not(doc),test)]
    fn nothing_after_a_terminal_event() {
        let recorder = Recorder::<u32, String>::new();
        let subscriber = Subscriber::new(recorder.observer(), Subscription::new());
        subscriber.on_next(1);
        subscriber.on_completed();
        subscriber.on_next(2);
        subscriber.on_error("too late".to_string());
        subscriber.on_completed();
        assert_eq!(recorder.notifications(), vec![Notification::Next(1), Notification::Completed]);
        assert!(subscriber.is_closed());
        assert!(subscriber.subscription().is_disposed(), "terminal events must dispose the subscription");
    }

    #[cfg_attr(not(doc),test)]
    fn nothing_after_disposal() {
        let recorder = Recorder::<u32, String>::new();
        let subscription = Subscription::new();
        let subscriber = Subscriber::new(recorder.observer(), subscription.clone());
        subscriber.on_next(1);
        subscription.dispose();
        subscriber.on_next(2);
        subscriber.on_error("ignored".to_string());
        assert_eq!(recorder.notifications(), vec![Notification::Next(1)]);
    }

    #[cfg_attr(not(doc),test)]
    fn terminal_events_run_teardowns() {
        let recorder = Recorder::<u32, String>::new();
        let subscriber = Subscriber::new(recorder.observer(), Subscription::new());
        let torn_down = Arc::new(AtomicBool::new(false));
        let torn_down_ref = Arc::clone(&torn_down);
        subscriber.add_teardown(move || torn_down_ref.store(true, std::sync::atomic::Ordering::Relaxed));
        subscriber.on_error("boom".to_string());
        assert!(torn_down.load(std::sync::atomic::Ordering::Relaxed));
        assert_eq!(recorder.notifications(), vec![Notification::Error("boom".to_string())]);
    }

    #[cfg_attr(not(doc),test)]
    fn closure_observers() {
        let sum = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let sum_ref = Arc::clone(&sum);
        let observer = FnObserver::new(move |item: u32| { sum_ref.fetch_add(item, std::sync::atomic::Ordering::Relaxed); },
                                       |_: ()| {},
                                       || {});
        let subscriber = Subscriber::new(observer, Subscription::new());
        (1..=4).for_each(|item| subscriber.on_next(item));
        assert_eq!(sum.load(std::sync::atomic::Ordering::Relaxed), 10);
    }
}
