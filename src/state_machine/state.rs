use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use super::epoch::Epoch;
use crate::sync::lock;

/// Number of transitions kept for diagnostics.
const HISTORY_CAPACITY: usize = 64;

/// The high-level activity the bot is engaged in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomationState {
    #[default]
    Idle,
    Fishing,
    SolvingChallenge,
    ClearingInventory,
    Purchasing,
}

impl fmt::Display for AutomationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomationState::Idle => write!(f, "IDLE"),
            AutomationState::Fishing => write!(f, "FISHING"),
            AutomationState::SolvingChallenge => write!(f, "SOLVING_CHALLENGE"),
            AutomationState::ClearingInventory => write!(f, "CLEARING_INVENTORY"),
            AutomationState::Purchasing => write!(f, "PURCHASING"),
        }
    }
}

/// State and epoch as one value, so readers never see a torn pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub epoch: Epoch,
    pub state: AutomationState,
    /// The state that was current before the last transition.
    pub previous: AutomationState,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            epoch: Epoch::ZERO,
            state: AutomationState::Idle,
            previous: AutomationState::Idle,
        }
    }
}

/// One entry of the transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: AutomationState,
    pub to: AutomationState,
    /// Epoch that became live with this transition.
    pub epoch: Epoch,
    pub at: DateTime<Utc>,
}

/// Owner of the epoch and the automation state.
///
/// [`set_state`](StateMachine::set_state) is the only mutator. Cloning is
/// cheap and every clone observes the same session.
#[derive(Debug, Clone)]
pub struct StateMachine {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cell: watch::Sender<Snapshot>,
    history: Mutex<VecDeque<TransitionRecord>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        let (cell, _) = watch::channel(Snapshot::default());
        Self {
            inner: Arc::new(Inner {
                cell,
                history: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
            }),
        }
    }

    /// Transition to `next` and return the epoch that is now live.
    ///
    /// Always bumps the epoch, even when `next` equals the current state:
    /// re-entering a state is a new reason for acting. Every pending wait
    /// subscribed to the machine is notified in the same step.
    pub fn set_state(&self, next: AutomationState) -> Epoch {
        // History is locked across the bump so records stay in epoch order.
        let mut history = lock(&self.inner.history);
        let mut applied = Snapshot::default();
        self.inner.cell.send_modify(|snap| {
            snap.previous = snap.state;
            snap.epoch = snap.epoch.next();
            snap.state = next;
            applied = *snap;
        });
        if history.len() == HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(TransitionRecord {
            from: applied.previous,
            to: applied.state,
            epoch: applied.epoch,
            at: Utc::now(),
        });
        drop(history);

        info!(
            from = %applied.previous,
            to = %applied.state,
            epoch = applied.epoch.value(),
            "state transition"
        );
        applied.epoch
    }

    /// Return to the state that was current before the last transition.
    ///
    /// This is an ordinary transition and bumps the epoch.
    pub fn resume_previous(&self) -> Epoch {
        let previous = self.snapshot().previous;
        self.set_state(previous)
    }

    pub fn epoch(&self) -> Epoch {
        self.inner.cell.borrow().epoch
    }

    pub fn current_state(&self) -> AutomationState {
        self.inner.cell.borrow().state
    }

    pub fn previous_state(&self) -> AutomationState {
        self.inner.cell.borrow().previous
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.inner.cell.borrow()
    }

    /// Whether `epoch` is still the live epoch.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.epoch() == epoch
    }

    /// Transitions performed so far, oldest first (bounded).
    pub fn history(&self) -> Vec<TransitionRecord> {
        lock(&self.inner.history).iter().cloned().collect()
    }

    /// Subscribe to epoch-changed notifications.
    pub(crate) fn watch(&self) -> watch::Receiver<Snapshot> {
        self.inner.cell.subscribe()
    }

    /// Number of live epoch-change subscriptions.
    pub fn watcher_count(&self) -> usize {
        self.inner.cell.receiver_count()
    }
}
