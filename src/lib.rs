#![doc = include_str!("../README.md")]


pub mod types;
pub mod config;
pub mod error;
pub mod disposable;
pub mod observer;
pub mod observable;
pub mod operators;
pub mod subjects;
pub mod schedulers;
pub mod prelude;

pub use types::{Notification, Task, PeriodicTask};
pub use config::{ConstConfig, OverflowStrategies, DrainModes, DEFAULT_CONFIG};
pub use error::SchedulerError;
pub use disposable::{Disposable, Subscription, SubscriptionId, DisposeBag, DisposedBy};
pub use observer::{Observer, FnObserver, Subscriber};
pub use observable::{Observable, stream::ObservableStream};
pub use subjects::{PublishSubject, BehaviorSubject, ReplaySubject, PublishRelay, BehaviorRelay};
pub use schedulers::{Scheduler, CurrentThreadScheduler, TokioScheduler};

#[cfg(any(test,doc))]
mod unit_test_utils;
