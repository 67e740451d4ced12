use std::future;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use super::event::GameEvent;
use super::hub::EventHub;
use super::signal::Signal;
use crate::state_machine::{Epoch, Snapshot, StateMachine};

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// One of the requested signals fired first.
    Matched { signal: String, event: GameEvent },
    /// The epoch moved on (or the session is shutting down).
    Cancelled,
    /// The deadline passed before anything else happened.
    TimedOut,
}

impl WaitOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, WaitOutcome::Matched { .. })
    }

    /// Name of the signal that resolved the wait, if any.
    pub fn matched_signal(&self) -> Option<&str> {
        match self {
            WaitOutcome::Matched { signal, .. } => Some(signal),
            _ => None,
        }
    }
}

/// Waits for the first of several signals, an epoch change, or a timeout.
#[derive(Debug, Clone)]
pub struct SignalCombinator {
    machine: StateMachine,
    hub: EventHub,
}

impl SignalCombinator {
    pub fn new(machine: StateMachine, hub: EventHub) -> Self {
        Self { machine, hub }
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Resolve with whichever comes first: a matching event for one of
    /// `signals`, the epoch moving past `epoch`, or `timeout` elapsing.
    ///
    /// A stale `epoch` resolves as cancelled before anything is registered.
    /// However the wait ends, all of its listeners, its epoch subscription
    /// and its timer are gone by the time this returns.
    pub async fn await_first(
        &self,
        epoch: Epoch,
        signals: Vec<Signal>,
        timeout: Option<Duration>,
    ) -> WaitOutcome {
        if !self.machine.is_current(epoch) {
            debug!(%epoch, live = %self.machine.epoch(), "wait skipped, epoch already stale");
            return WaitOutcome::Cancelled;
        }

        let Some((registration, fired)) = self.hub.register(signals) else {
            return WaitOutcome::Cancelled;
        };
        let mut epochs = self.machine.watch();
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            biased;
            fired = fired => match fired {
                Ok(fired) => WaitOutcome::Matched {
                    signal: fired.signal,
                    event: fired.event,
                },
                // Hub closed underneath us.
                Err(_) => WaitOutcome::Cancelled,
            },
            () = until_stale(&mut epochs, epoch) => WaitOutcome::Cancelled,
            () = deadline => WaitOutcome::TimedOut,
        };

        drop(registration);
        drop(epochs);

        match &outcome {
            WaitOutcome::Matched { signal, .. } => debug!(%epoch, %signal, "wait matched"),
            WaitOutcome::Cancelled => debug!(%epoch, "wait cancelled"),
            WaitOutcome::TimedOut => debug!(%epoch, ?timeout, "wait timed out"),
        }
        outcome
    }
}

/// Completes once the observed epoch differs from `epoch`.
async fn until_stale(epochs: &mut watch::Receiver<Snapshot>, epoch: Epoch) {
    loop {
        if epochs.borrow_and_update().epoch != epoch {
            return;
        }
        if epochs.changed().await.is_err() {
            return;
        }
    }
}
