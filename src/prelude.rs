//! Re-exports of types useful for users of this crate:
//! `use reactive_observables::prelude::*;` brings in everything needed to build, subscribe & dispose pipelines

pub use crate::{
    config::{ConstConfig, OverflowStrategies, DrainModes, DEFAULT_CONFIG},
    disposable::{Disposable, Subscription, DisposeBag, DisposedBy},
    observer::{Observer, FnObserver, Subscriber},
    observable::{Observable, stream::ObservableStream},
    subjects::{PublishSubject, BehaviorSubject, ReplaySubject, PublishRelay, BehaviorRelay},
    schedulers::{Scheduler, CurrentThreadScheduler, TokioScheduler},
    types::Notification,
    error::SchedulerError,
};
