use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::debug;

use super::event::GameEvent;
use super::signal::Signal;
use crate::sync::lock;

/// The event that resolved a wait, tagged with the signal that matched.
#[derive(Debug)]
pub(crate) struct Fired {
    pub signal: String,
    pub event: GameEvent,
}

/// Fan-out point for inbound events.
///
/// Each pending wait owns one listener per signal it asked for. The first
/// matching event detaches all of that wait's listeners at once and hands
/// the event over; listeners of other waits are unaffected.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    registry: Arc<Mutex<Registry>>,
}

#[derive(Debug, Default)]
struct Registry {
    next_wait: u64,
    closed: bool,
    listeners: Vec<Listener>,
    waits: HashMap<u64, oneshot::Sender<Fired>>,
}

#[derive(Debug)]
struct Listener {
    wait: u64,
    signal: Signal,
}

impl Registry {
    /// Remove every listener belonging to `wait` and return its sender.
    fn detach(&mut self, wait: u64) -> Option<oneshot::Sender<Fired>> {
        self.listeners.retain(|listener| listener.wait != wait);
        self.waits.remove(&wait)
    }
}

/// Detaches a wait's listeners when dropped, whichever way the wait ended.
#[derive(Debug)]
pub(crate) struct Registration {
    registry: Arc<Mutex<Registry>>,
    wait: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        lock(&self.registry).detach(self.wait);
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every wait with a matching signal.
    ///
    /// Returns the number of waits resolved by this event. Within one wait,
    /// signals are tried in the order they were requested.
    pub fn emit(&self, event: &GameEvent) -> usize {
        let mut registry = lock(&self.registry);
        let mut winners: Vec<(u64, String)> = Vec::new();
        for listener in &registry.listeners {
            if winners.iter().any(|(wait, _)| *wait == listener.wait) {
                continue;
            }
            if listener.signal.matches(event) {
                winners.push((listener.wait, listener.signal.name().to_owned()));
            }
        }

        let mut resolved = 0;
        for (wait, signal) in winners {
            if let Some(sender) = registry.detach(wait) {
                debug!(wait, %signal, event = event.kind(), "signal matched");
                if sender
                    .send(Fired {
                        signal,
                        event: event.clone(),
                    })
                    .is_ok()
                {
                    resolved += 1;
                }
            }
        }
        resolved
    }

    /// Register one listener per signal under a fresh wait.
    ///
    /// Returns `None` once the hub is closed.
    pub(crate) fn register(
        &self,
        signals: Vec<Signal>,
    ) -> Option<(Registration, oneshot::Receiver<Fired>)> {
        let mut registry = lock(&self.registry);
        if registry.closed {
            return None;
        }
        let wait = registry.next_wait;
        registry.next_wait += 1;

        let (sender, receiver) = oneshot::channel();
        registry.waits.insert(wait, sender);
        registry
            .listeners
            .extend(signals.into_iter().map(|signal| Listener { wait, signal }));

        let registration = Registration {
            registry: Arc::clone(&self.registry),
            wait,
        };
        Some((registration, receiver))
    }

    /// Drop every listener and refuse new ones. Pending waits resolve as
    /// cancelled.
    pub fn close(&self) {
        let mut registry = lock(&self.registry);
        registry.closed = true;
        registry.listeners.clear();
        let pending = registry.waits.len();
        registry.waits.clear();
        debug!(pending, "event hub closed");
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.registry).closed
    }

    /// Number of live signal listeners across all pending waits.
    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }

    /// Number of pending waits.
    pub fn pending_waits(&self) -> usize {
        lock(&self.registry).waits.len()
    }
}
