//! Operators: functions taking an [crate::Observable] and returning another one.\
//! They are all exposed as methods of [crate::Observable] and follow the same recipe:
//! nothing happens until the resulting observable is subscribed -- then, for each downstream subscriber,
//! the upstream gets subscribed with an operator-specific observer, under a child of the downstream subscription
//! (so disposals flow upstream). Per-subscription state lives in that observer.

mod transforming;
mod filtering;
mod combining;
mod utility;
mod scheduling;
