//! Inbound game events and the "first of several signals" wait.

mod combinator;
mod event;
mod hub;
mod signal;

pub use combinator::{SignalCombinator, WaitOutcome};
pub use event::GameEvent;
pub use hub::EventHub;
pub use signal::Signal;
