//! Resting place for [Observable], the push-based sequence of items, errors & completion signals.\
//! Sources (constructors) live in [sources] and the `futures` bridge in [stream];
//! operators are spread through [crate::operators].

pub mod sources;
pub mod stream;

use crate::{
    disposable::Subscription,
    observer::{FnObserver, Observer, Subscriber},
};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};
use log::trace;


type SubscribeFn<T, E> = dyn Fn(Subscriber<T, E>) + Send + Sync + 'static;

/// A push-based sequence of `T` items, ending either in an `E` error or in a completion signal.\
/// An `Observable` is just a cheap-to-clone handle to a "subscribe function": nothing happens until
/// [Self::subscribe()] is called -- and every subscription runs that function anew (cold semantics).
/// For hot, shared sequences, see [crate::subjects].
pub struct Observable<T, E> {
    on_subscribe: Arc<SubscribeFn<T, E>>,
}

impl<T, E> Clone for Observable<T, E> {
    fn clone(&self) -> Self {
        Self { on_subscribe: Arc::clone(&self.on_subscribe) }
    }
}

impl<T: Send + 'static, E: Send + 'static> Observable<T, E> {

    /// Builds an observable out of a custom producer: `on_subscribe` is called once per subscription
    /// and should push events into the given [Subscriber], checking [Subscriber::is_closed()]
    /// to stop early and using [Subscriber::add_teardown()] to release whatever it acquired.
    /// ```nocompile
    ///     let numbers = Observable::<u32, String>::create(|subscriber| {
    ///         subscriber.on_next(1);
    ///         subscriber.on_next(2);
    ///         subscriber.on_completed();
    ///     });
    pub fn create(on_subscribe: impl Fn(Subscriber<T, E>) + Send + Sync + 'static) -> Self {
        Self { on_subscribe: Arc::new(on_subscribe) }
    }

    /// Starts a new subscription, pushing events into `observer`.\
    /// The returned handle may be used to cancel it
    pub fn subscribe(&self, observer: impl Observer<T, E> + 'static) -> Subscription {
        let subscription = Subscription::new();
        self.subscribe_in(observer, subscription.clone());
        subscription
    }

    /// Subscribes with a closure for items only -- errors & completion are ignored
    pub fn subscribe_next(&self, on_next: impl Fn(T) + Send + Sync + 'static) -> Subscription {
        self.subscribe(FnObserver::new(on_next, |_: E| {}, || {}))
    }

    /// Subscribes with one closure per event kind
    pub fn subscribe_all(&self,
                         on_next:      impl Fn(T) + Send + Sync + 'static,
                         on_error:     impl Fn(E) + Send + Sync + 'static,
                         on_completed: impl Fn()  + Send + Sync + 'static)
                        -> Subscription {
        self.subscribe(FnObserver::new(on_next, on_error, on_completed))
    }

    /// Subscribes `observer` under an existing `subscription` -- the building block of operators,
    /// which pass a child of the downstream subscription here
    pub(crate) fn subscribe_in(&self, observer: impl Observer<T, E> + 'static, subscription: Subscription) {
        trace!("Subscribing under {:?}", subscription);
        let subscriber = Subscriber::new(observer, subscription);
        (self.on_subscribe)(subscriber);
    }

    /// Operators' helper: subscribes upstream (`self`) with the `observer` built for the `downstream`,
    /// tying the upstream subscription to the downstream one
    #[inline(always)]
    pub(crate) fn subscribe_for<D: Send + 'static, F: Send + 'static>
                               (&self,
                                downstream: &Subscriber<D, F>,
                                observer:   impl Observer<T, E> + 'static) {
        self.subscribe_in(observer, downstream.child_subscription());
    }
}

impl<T, E> Debug for Observable<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Observable<{}, {}>", std::any::type_name::<T>(), std::any::type_name::<E>())
    }
}


/// Unit tests the [observable](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use crate::disposable::Disposable;
    use crate::types::Notification;
    use crate::unit_test_utils::Recorder;
    use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

    #[cfg_attr(not(doc),test)]
    fn cold_observables_run_once_per_subscription() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_ref = Arc::clone(&runs);
        let observable = Observable::<usize, ()>::create(move |subscriber| {
            let run = runs_ref.fetch_add(1, Relaxed);
            subscriber.on_next(run);
            subscriber.on_completed();
        });
        let first = Recorder::new();
        let second = Recorder::new();
        observable.subscribe(first.observer());
        observable.clone().subscribe(second.observer());
        assert_eq!(runs.load(Relaxed), 2);
        assert_eq!(first.notifications(),  vec![Notification::Next(0), Notification::Completed]);
        assert_eq!(second.notifications(), vec![Notification::Next(1), Notification::Completed]);
    }

    #[cfg_attr(not(doc),test)]
    fn producers_may_not_violate_the_protocol() {
        let observable = Observable::<u8, &'static str>::create(|subscriber| {
            subscriber.on_next(1);
            subscriber.on_error("failed");
            subscriber.on_next(2);
            subscriber.on_completed();
        });
        let recorder = Recorder::new();
        let subscription = observable.subscribe(recorder.observer());
        assert_eq!(recorder.notifications(), vec![Notification::Next(1), Notification::Error("failed")]);
        assert!(subscription.is_disposed());
    }

    #[cfg_attr(not(doc),test)]
    fn teardowns_run_on_dispose() {
        let released = Arc::new(AtomicUsize::new(0));
        let released_ref = Arc::clone(&released);
        let observable = Observable::<u8, ()>::create(move |subscriber| {
            let released = Arc::clone(&released_ref);
            subscriber.add_teardown(move || { released.fetch_add(1, Relaxed); });
        });
        let subscription = observable.subscribe_next(|_| {});
        assert_eq!(released.load(Relaxed), 0);
        subscription.dispose();
        subscription.dispose();
        assert_eq!(released.load(Relaxed), 1);
    }

    #[cfg_attr(not(doc),test)]
    fn closure_subscriptions() {
        let completed = Arc::new(AtomicUsize::new(0));
        let completed_ref = Arc::clone(&completed);
        let items = Arc::new(AtomicUsize::new(0));
        let items_ref = Arc::clone(&items);
        Observable::<u8, ()>::create(|subscriber| {
            subscriber.on_next(7);
            subscriber.on_next(8);
            subscriber.on_completed();
        }).subscribe_all(move |_| { items_ref.fetch_add(1, Relaxed); },
                         |_| panic!("no errors expected"),
                         move || { completed_ref.fetch_add(1, Relaxed); });
        assert_eq!(items.load(Relaxed), 2);
        assert_eq!(completed.load(Relaxed), 1);
    }
}
