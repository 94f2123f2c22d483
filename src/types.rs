//! Common types used across this crate

use crate::observer::Observer;
use std::ops::ControlFlow;


/// A unit of work handed over to a [crate::schedulers::Scheduler], to be run once
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work to be run repeatedly by a [crate::schedulers::Scheduler] -- returning [ControlFlow::Break] stops the repetitions
pub type PeriodicTask = Box<dyn FnMut() -> ControlFlow<()> + Send + 'static>;


/// Materialized form of the events an [Observer] may receive.\
/// Used whenever events must be stored before being delivered (queues, replay buffers, test recorders)
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<T, E> {
    Next(T),
    Error(E),
    Completed,
}

impl<T, E> Notification<T, E> {

    /// Replays this notification onto `observer`
    #[inline(always)]
    pub fn deliver_to<O: Observer<T, E> + ?Sized>(self, observer: &O) {
        match self {
            Notification::Next(item)   => observer.on_next(item),
            Notification::Error(error) => observer.on_error(error),
            Notification::Completed    => observer.on_completed(),
        }
    }

    /// `true` for [Self::Error] & [Self::Completed]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Next(_))
    }
}


/// The two ways a sequence may end
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Terminal<E> {
    Error(E),
    Completed,
}

impl<E> Terminal<E> {
    pub(crate) fn deliver_to<T, O: Observer<T, E> + ?Sized>(self, observer: &O) {
        match self {
            Terminal::Error(error) => observer.on_error(error),
            Terminal::Completed    => observer.on_completed(),
        }
    }
}
