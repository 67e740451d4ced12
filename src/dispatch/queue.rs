use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{Instrument, Span, debug, warn};

use super::transport::{QueueKind, Transport};
use crate::error::TransportError;
use crate::state_machine::{Epoch, StateMachine};
use crate::sync::lock;

/// What happened to an enqueued action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport.
    Sent,
    /// Dropped unsent: its epoch went stale or the session shut down.
    Discarded,
    /// The transport refused it. Still counts towards pacing.
    Failed(TransportError),
}

/// Running totals for one queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub sent: u64,
    pub discarded: u64,
    pub failed: u64,
}

#[derive(Debug)]
struct QueuedAction {
    payload: String,
    epoch: Epoch,
    completion: oneshot::Sender<Delivery>,
}

/// Handle to one paced FIFO queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    kind: QueueKind,
    cooldown: Duration,
    sender: mpsc::UnboundedSender<QueuedAction>,
    stats: Arc<Mutex<QueueStats>>,
}

impl DispatchQueue {
    /// Start the drain loop for a queue and return its handle.
    ///
    /// The loop stops when `shutdown` flips to `true` or every handle is
    /// dropped; entries still queued at that point resolve as discarded.
    pub fn spawn(
        kind: QueueKind,
        cooldown: Duration,
        machine: StateMachine,
        transport: Arc<dyn Transport>,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(QueueStats::default()));
        let drain = Drain {
            kind,
            cooldown,
            machine,
            transport,
            stats: Arc::clone(&stats),
            receiver,
            shutdown,
        };
        // The drain keeps the caller's span, so its logs carry the session.
        let handle = tokio::spawn(drain.run().instrument(Span::current()));
        let queue = Self {
            kind,
            cooldown,
            sender,
            stats,
        };
        (queue, handle)
    }

    /// Queue `payload` under `epoch` and wait until it is sent or dropped.
    pub async fn enqueue(&self, epoch: Epoch, payload: impl Into<String>) -> Delivery {
        let (completion, done) = oneshot::channel();
        let action = QueuedAction {
            payload: payload.into(),
            epoch,
            completion,
        };
        if self.sender.send(action).is_err() {
            return Delivery::Discarded;
        }
        done.await.unwrap_or(Delivery::Discarded)
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn stats(&self) -> QueueStats {
        *lock(&self.stats)
    }
}

struct Drain {
    kind: QueueKind,
    cooldown: Duration,
    machine: StateMachine,
    transport: Arc<dyn Transport>,
    stats: Arc<Mutex<QueueStats>>,
    receiver: mpsc::UnboundedReceiver<QueuedAction>,
    shutdown: watch::Receiver<bool>,
}

impl Drain {
    async fn run(mut self) {
        let mut last_sent: Option<Instant> = None;

        loop {
            let action = tokio::select! {
                biased;
                () = stopped(&mut self.shutdown) => break,
                next = self.receiver.recv() => match next {
                    Some(action) => action,
                    None => break,
                },
            };

            if let Some(at) = last_sent {
                tokio::select! {
                    biased;
                    () = stopped(&mut self.shutdown) => {
                        self.discard(action);
                        break;
                    }
                    () = sleep_until(at + self.cooldown) => {}
                }
            }

            // Stale entries cost no cooldown.
            let live = self.machine.epoch();
            if action.epoch != live {
                debug!(
                    queue = %self.kind,
                    entry_epoch = %action.epoch,
                    live_epoch = %live,
                    "discarding stale action"
                );
                self.discard(action);
                continue;
            }

            let result = self.transport.send(self.kind, &action.payload);
            last_sent = Some(Instant::now());
            let delivery = match result {
                Ok(()) => {
                    debug!(queue = %self.kind, payload = %action.payload, "sent");
                    lock(&self.stats).sent += 1;
                    Delivery::Sent
                }
                Err(err) => {
                    warn!(queue = %self.kind, error = %err, "transport send failed");
                    lock(&self.stats).failed += 1;
                    Delivery::Failed(err)
                }
            };
            let _ = action.completion.send(delivery);
        }

        self.receiver.close();
        let mut dropped = 0;
        while let Ok(action) = self.receiver.try_recv() {
            self.discard(action);
            dropped += 1;
        }
        debug!(queue = %self.kind, dropped, "drain loop stopped");
    }

    fn discard(&self, action: QueuedAction) {
        lock(&self.stats).discarded += 1;
        let _ = action.completion.send(Delivery::Discarded);
    }
}

/// Completes once shutdown is requested or the controller is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::RecordingTransport;
    use crate::state_machine::AutomationState;

    const COOLDOWN: Duration = Duration::from_millis(1500);

    struct Harness {
        queue: DispatchQueue,
        machine: StateMachine,
        transport: Arc<RecordingTransport>,
        stop: watch::Sender<bool>,
        handle: JoinHandle<()>,
    }

    fn harness(kind: QueueKind) -> Harness {
        let machine = StateMachine::new();
        let transport = Arc::new(RecordingTransport::default());
        let (stop, shutdown) = watch::channel(false);
        let (queue, handle) = DispatchQueue::spawn(
            kind,
            COOLDOWN,
            machine.clone(),
            transport.clone(),
            shutdown,
        );
        Harness {
            queue,
            machine,
            transport,
            stop,
            handle,
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            lock(&self.0).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn drain_logs_carry_the_spawning_span() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let machine = StateMachine::new();
        let stale = machine.epoch();
        machine.set_state(AutomationState::Fishing);
        let (_stop, shutdown) = watch::channel(false);
        let (queue, _handle) = {
            let _span = tracing::info_span!("session", id = 7).entered();
            DispatchQueue::spawn(
                QueueKind::Command,
                COOLDOWN,
                machine.clone(),
                Arc::new(RecordingTransport::default()),
                shutdown,
            )
        };

        assert_eq!(queue.enqueue(stale, "/rod reel").await, Delivery::Discarded);

        let output = String::from_utf8(lock(&logs.0).clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("discarding stale action"))
            .unwrap();
        assert!(line.contains("session{id=7}"), "{line}");
    }

    #[tokio::test(start_paused = true)]
    async fn sends_in_order_and_respects_cooldown() {
        let h = harness(QueueKind::Chat);
        let epoch = h.machine.epoch();

        let results = tokio::join!(
            h.queue.enqueue(epoch, "one"),
            h.queue.enqueue(epoch, "two"),
            h.queue.enqueue(epoch, "three"),
            h.queue.enqueue(epoch, "four"),
        );
        assert_eq!(
            results,
            (
                Delivery::Sent,
                Delivery::Sent,
                Delivery::Sent,
                Delivery::Sent
            )
        );

        let sent = h.transport.sent();
        let payloads: Vec<&str> = sent.iter().map(|(_, p, _)| p.as_str()).collect();
        assert_eq!(payloads, ["one", "two", "three", "four"]);
        for pair in sent.windows(2) {
            assert!(pair[1].2.duration_since(pair[0].2) >= COOLDOWN);
        }
        assert_eq!(h.queue.stats().sent, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn first_send_is_immediate() {
        let h = harness(QueueKind::Command);
        let started = Instant::now();
        assert_eq!(
            h.queue.enqueue(h.machine.epoch(), "/sell all").await,
            Delivery::Sent
        );
        assert_eq!(Instant::now(), started);
        assert_eq!(h.transport.payloads(QueueKind::Command), ["/sell all"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_is_never_sent_but_resolves() {
        let h = harness(QueueKind::Command);
        let epoch = h.machine.epoch();
        assert_eq!(h.queue.enqueue(epoch, "/fish").await, Delivery::Sent);

        // The next entry has to wait out the cooldown; the state changes
        // while it waits.
        let pending = tokio::spawn({
            let queue = h.queue.clone();
            async move { queue.enqueue(epoch, "/sell").await }
        });
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        h.machine.set_state(AutomationState::SolvingChallenge);

        assert_eq!(pending.await.unwrap(), Delivery::Discarded);
        assert_eq!(h.transport.payloads(QueueKind::Command), ["/fish"]);
        assert_eq!(h.queue.stats().discarded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_do_not_consume_cooldown() {
        let h = harness(QueueKind::Chat);
        let old = h.machine.epoch();
        let live = h.machine.set_state(AutomationState::Fishing);

        let started = Instant::now();
        let results = tokio::join!(
            h.queue.enqueue(live, "a"),
            h.queue.enqueue(old, "stale 1"),
            h.queue.enqueue(old, "stale 2"),
            h.queue.enqueue(live, "b"),
        );
        assert_eq!(
            results,
            (
                Delivery::Sent,
                Delivery::Discarded,
                Delivery::Discarded,
                Delivery::Sent
            )
        );

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 2);
        // "b" goes out exactly one cooldown after "a".
        assert_eq!(sent[1].2.duration_since(started), COOLDOWN);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_is_reported_and_paced() {
        let h = harness(QueueKind::Chat);
        h.transport.reject_with("muted");
        let epoch = h.machine.epoch();

        let (first, second) = tokio::join!(h.queue.enqueue(epoch, "hi"), h.queue.enqueue(epoch, "hi"));
        assert_eq!(
            first,
            Delivery::Failed(TransportError::Rejected("muted".into()))
        );
        assert!(matches!(second, Delivery::Failed(_)));

        let sent = h.transport.sent();
        assert!(sent[1].2.duration_since(sent[0].2) >= COOLDOWN);
        assert_eq!(h.queue.stats().failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_resolves_everything_still_queued() {
        let h = harness(QueueKind::Chat);
        let epoch = h.machine.epoch();
        assert_eq!(h.queue.enqueue(epoch, "first").await, Delivery::Sent);

        let queued: Vec<_> = (0..3)
            .map(|i| {
                let queue = h.queue.clone();
                tokio::spawn(async move { queue.enqueue(epoch, format!("later {i}")).await })
            })
            .collect();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        h.stop.send_replace(true);
        for task in queued {
            assert_eq!(task.await.unwrap(), Delivery::Discarded);
        }
        h.handle.await.unwrap();

        assert_eq!(h.transport.payloads(QueueKind::Chat), ["first"]);
        assert_eq!(h.queue.enqueue(epoch, "after").await, Delivery::Discarded);
    }

    #[tokio::test(start_paused = true)]
    async fn queues_pace_independently() {
        let machine = StateMachine::new();
        let transport = Arc::new(RecordingTransport::default());
        let (_stop, shutdown) = watch::channel(false);
        let (commands, _) = DispatchQueue::spawn(
            QueueKind::Command,
            Duration::from_millis(1000),
            machine.clone(),
            transport.clone(),
            shutdown.clone(),
        );
        let (chat, _) = DispatchQueue::spawn(
            QueueKind::Chat,
            Duration::from_millis(5000),
            machine.clone(),
            transport.clone(),
            shutdown,
        );
        let epoch = machine.epoch();

        let started = Instant::now();
        tokio::join!(
            async {
                chat.enqueue(epoch, "hello").await;
                chat.enqueue(epoch, "again").await;
            },
            async {
                commands.enqueue(epoch, "/a").await;
                commands.enqueue(epoch, "/b").await;
            },
        );

        let sent = transport.sent();
        let at = |payload: &str| {
            sent.iter()
                .find(|(_, p, _)| p == payload)
                .map(|(_, _, t)| t.duration_since(started))
                .unwrap()
        };
        assert_eq!(at("/b"), Duration::from_millis(1000));
        assert_eq!(at("again"), Duration::from_millis(5000));
    }
}
