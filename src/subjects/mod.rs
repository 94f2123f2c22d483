//! Subjects: hot, multicasting hybrids of observer & observable.\
//! Feed them through their [crate::Observer] implementation (directly or by subscribing them to an upstream)
//! and hand out `as_observable()` to consumers.\
//! Relays are subjects that can never terminate -- they only `accept()` items.

mod subject_core;
mod publish_subject;
mod behavior_subject;
mod replay_subject;
mod relays;

pub use publish_subject::PublishSubject;
pub use behavior_subject::BehaviorSubject;
pub use replay_subject::ReplaySubject;
pub use relays::{PublishRelay, BehaviorRelay};
