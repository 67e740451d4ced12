//! The kernel as seen by workflow code: one [`Session`] per bot connection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::captcha::{ChallengeOutcome, ChallengeSolver, Raster, decode};
use crate::config::AnglerConfig;
use crate::dispatch::{Delivery, DispatchQueue, QueueKind, Transport};
use crate::error::AnglerError;
use crate::signals::{EventHub, GameEvent, Signal, SignalCombinator, WaitOutcome};
use crate::state_machine::{AutomationState, Epoch, Snapshot, StateMachine, TransitionRecord};
use crate::sync::lock;

/// Builds a [`Session`]. A transport is mandatory.
pub struct SessionBuilder {
    config: AnglerConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl SessionBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Start both drain loops. Must be called inside a tokio runtime.
    pub fn start(self) -> Result<Session, AnglerError> {
        self.config.validate()?;
        let transport = self.transport.ok_or(AnglerError::MissingTransport)?;

        let id = Uuid::new_v4();
        let _span = info_span!("session", %id).entered();

        let machine = StateMachine::new();
        let hub = EventHub::new();
        let combinator = SignalCombinator::new(machine.clone(), hub.clone());
        let (stop, shutdown) = watch::channel(false);

        let (commands, command_drain) = DispatchQueue::spawn(
            QueueKind::Command,
            self.config.command_cooldown(),
            machine.clone(),
            Arc::clone(&transport),
            shutdown.clone(),
        );
        let (chat, chat_drain) = DispatchQueue::spawn(
            QueueKind::Chat,
            self.config.chat_cooldown(),
            machine.clone(),
            transport,
            shutdown,
        );

        info!(
            command_cooldown_ms = self.config.command_cooldown_ms,
            chat_cooldown_ms = self.config.chat_cooldown_ms,
            "session started"
        );

        Ok(Session {
            id,
            solver: ChallengeSolver::from_config(&self.config),
            config: self.config,
            machine,
            hub,
            combinator,
            commands,
            chat,
            stop,
            drains: Mutex::new(vec![command_drain, chat_drain]),
        })
    }
}

/// One bot session's epoch, state, queues and event waits.
pub struct Session {
    id: Uuid,
    config: AnglerConfig,
    machine: StateMachine,
    hub: EventHub,
    combinator: SignalCombinator,
    solver: ChallengeSolver,
    commands: DispatchQueue,
    chat: DispatchQueue,
    stop: watch::Sender<bool>,
    drains: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    pub fn builder(config: AnglerConfig) -> SessionBuilder {
        SessionBuilder {
            config,
            transport: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &AnglerConfig {
        &self.config
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn combinator(&self) -> &SignalCombinator {
        &self.combinator
    }

    pub fn queue(&self, kind: QueueKind) -> &DispatchQueue {
        match kind {
            QueueKind::Command => &self.commands,
            QueueKind::Chat => &self.chat,
        }
    }

    // --- outbound ---

    /// Send a player command through the command queue.
    pub async fn command(&self, epoch: Epoch, text: impl Into<String>) -> Delivery {
        self.commands.enqueue(epoch, text).await
    }

    /// Send a chat message through the chat queue.
    pub async fn chat(&self, epoch: Epoch, text: impl Into<String>) -> Delivery {
        self.chat.enqueue(epoch, text).await
    }

    // --- inbound ---

    /// Feed an event from the transport. Returns how many waits it resolved.
    pub fn emit(&self, event: &GameEvent) -> usize {
        self.hub.emit(event)
    }

    pub async fn await_first(
        &self,
        epoch: Epoch,
        signals: Vec<Signal>,
        timeout: Option<Duration>,
    ) -> WaitOutcome {
        self.combinator.await_first(epoch, signals, timeout).await
    }

    // --- state ---

    pub fn set_state(&self, next: AutomationState) -> Epoch {
        self.machine.set_state(next)
    }

    pub fn resume_previous(&self) -> Epoch {
        self.machine.resume_previous()
    }

    pub fn current_state(&self) -> AutomationState {
        self.machine.current_state()
    }

    pub fn epoch(&self) -> Epoch {
        self.machine.epoch()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    pub fn history(&self) -> Vec<TransitionRecord> {
        self.machine.history()
    }

    // --- challenge ---

    /// Decode a raster with the configured ink bytes.
    pub fn decode(&self, raster: &Raster) -> Vec<char> {
        decode(raster, self.config.ink_values)
    }

    /// Wait for rasters under `epoch` until one yields a full code.
    pub async fn solve_challenge(&self, epoch: Epoch) -> ChallengeOutcome {
        self.solver.solve(&self.combinator, epoch).await
    }

    /// Resolve every pending wait and queued action, then stop the drain
    /// loops.
    pub async fn shutdown(&self) {
        self.hub.close();
        self.stop.send_replace(true);
        let drains: Vec<JoinHandle<()>> = lock(&self.drains).drain(..).collect();
        for drain in drains {
            let _ = drain.await;
        }
        info!(id = %self.id, "session stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::render;
    use crate::dispatch::testing::RecordingTransport;

    fn config() -> AnglerConfig {
        AnglerConfig {
            command_cooldown_ms: 200,
            chat_cooldown_ms: 1000,
            ..Default::default()
        }
    }

    fn start() -> (Session, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let session = Session::builder(config())
            .transport(transport.clone())
            .start()
            .unwrap();
        (session, transport)
    }

    #[tokio::test]
    async fn start_requires_transport() {
        let result = Session::builder(AnglerConfig::default()).start();
        assert!(matches!(result, Err(AnglerError::MissingTransport)));
    }

    #[tokio::test]
    async fn start_rejects_invalid_config() {
        let bad = AnglerConfig {
            code_length: 0,
            ..Default::default()
        };
        let result = Session::builder(bad)
            .transport(Arc::new(RecordingTransport::default()))
            .start();
        assert!(matches!(result, Err(AnglerError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn routes_commands_and_chat_to_their_queues() {
        let (session, transport) = start();
        let epoch = session.set_state(AutomationState::Purchasing);

        let (command, chat) = tokio::join!(
            session.command(epoch, "/shop"),
            session.chat(epoch, "hello"),
        );
        assert_eq!(command, Delivery::Sent);
        assert_eq!(chat, Delivery::Sent);
        assert_eq!(transport.payloads(QueueKind::Command), ["/shop"]);
        assert_eq!(transport.payloads(QueueKind::Chat), ["hello"]);
        assert_eq!(session.queue(QueueKind::Chat).stats().sent, 1);
        assert_eq!(
            session.queue(QueueKind::Command).cooldown(),
            Duration::from_millis(200)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn challenge_interrupts_fishing_and_resumes() {
        let (session, transport) = start();
        let session = Arc::new(session);
        let fishing = session.set_state(AutomationState::Fishing);

        // A fishing wait that will be invalidated by the challenge.
        let bite = tokio::spawn({
            let session = Arc::clone(&session);
            async move {
                session
                    .await_first(
                        fishing,
                        vec![Signal::sound("bite", "entity.fishing_bobber.splash")],
                        Some(Duration::from_secs(60)),
                    )
                    .await
            }
        });
        while session.hub().pending_waits() == 0 {
            tokio::task::yield_now().await;
        }

        let solving = session.set_state(AutomationState::SolvingChallenge);
        assert_eq!(bite.await.unwrap(), WaitOutcome::Cancelled);
        // Anything still tagged with the fishing epoch is dropped.
        assert_eq!(session.command(fishing, "/reel").await, Delivery::Discarded);

        let solver = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.solve_challenge(solving).await }
        });
        while session.hub().pending_waits() == 0 {
            tokio::task::yield_now().await;
        }
        session.emit(&GameEvent::Raster(render("Q4ZT8", [34, 119], 5)));
        let code = match solver.await.unwrap() {
            ChallengeOutcome::Solved(code) => code,
            other => panic!("expected a solved challenge, got {other:?}"),
        };
        assert_eq!(code, "Q4ZT8");
        assert_eq!(session.chat(solving, code).await, Delivery::Sent);

        let resumed = session.resume_previous();
        assert_eq!(session.current_state(), AutomationState::Fishing);
        assert_eq!(resumed.value(), 3);
        assert_eq!(transport.payloads(QueueKind::Chat), ["Q4ZT8"]);
        assert!(transport.payloads(QueueKind::Command).is_empty());

        let history: Vec<AutomationState> = session.history().iter().map(|r| r.to).collect();
        assert_eq!(
            history,
            [
                AutomationState::Fishing,
                AutomationState::SolvingChallenge,
                AutomationState::Fishing
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_resolves_pending_work() {
        let (session, transport) = start();
        let session = Arc::new(session);
        let epoch = session.epoch();
        assert_eq!(session.chat(epoch, "first").await, Delivery::Sent);

        let wait = tokio::spawn({
            let session = Arc::clone(&session);
            async move {
                session
                    .await_first(epoch, vec![Signal::window_opened("shop")], None)
                    .await
            }
        });
        let queued = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.chat(epoch, "second").await }
        });
        while session.hub().pending_waits() == 0 {
            tokio::task::yield_now().await;
        }

        session.shutdown().await;
        assert_eq!(wait.await.unwrap(), WaitOutcome::Cancelled);
        assert_eq!(queued.await.unwrap(), Delivery::Discarded);
        assert_eq!(session.command(epoch, "/late").await, Delivery::Discarded);
        assert_eq!(
            session.await_first(epoch, Vec::new(), None).await,
            WaitOutcome::Cancelled
        );
        assert_eq!(transport.payloads(QueueKind::Chat), ["first"]);
    }

    #[tokio::test]
    async fn decode_uses_configured_ink() {
        let (session, _) = start();
        let raster = render("ABC12", [34, 119], 5);
        assert_eq!(session.decode(&raster), vec!['A', 'B', 'C', '1', '2']);
    }
}
