use std::time::Duration;

use tracing::{debug, info};

use super::decoder::decode;
use crate::config::AnglerConfig;
use crate::signals::{GameEvent, Signal, SignalCombinator, WaitOutcome};
use crate::state_machine::Epoch;

/// Result of trying to read a challenge code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// A full-length code was read.
    Solved(String),
    /// The epoch moved on while waiting.
    Cancelled,
    /// No raster arrived in time.
    TimedOut,
    /// Every attempt produced a short read; `best` is the longest one.
    Exhausted { best: String },
}

/// Waits for challenge rasters and decodes them until one is legible.
#[derive(Debug, Clone)]
pub struct ChallengeSolver {
    ink: [u8; 2],
    code_length: usize,
    timeout: Duration,
    max_attempts: u32,
}

impl ChallengeSolver {
    pub fn new(ink: [u8; 2], code_length: usize, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            ink,
            code_length,
            timeout,
            max_attempts,
        }
    }

    pub fn from_config(config: &AnglerConfig) -> Self {
        Self::new(
            config.ink_values,
            config.code_length,
            config.challenge_timeout(),
            config.max_decode_attempts,
        )
    }

    /// Read the next legible challenge code seen under `epoch`.
    ///
    /// Short reads are not authoritative; the solver waits for the next
    /// raster, up to `max_attempts` rasters in total.
    pub async fn solve(&self, combinator: &SignalCombinator, epoch: Epoch) -> ChallengeOutcome {
        let mut best = String::new();
        for attempt in 1..=self.max_attempts {
            let outcome = combinator
                .await_first(epoch, vec![Signal::raster("raster")], Some(self.timeout))
                .await;
            let raster = match outcome {
                WaitOutcome::Matched {
                    event: GameEvent::Raster(raster),
                    ..
                } => raster,
                WaitOutcome::Matched { .. } => continue,
                WaitOutcome::Cancelled => return ChallengeOutcome::Cancelled,
                WaitOutcome::TimedOut => return ChallengeOutcome::TimedOut,
            };

            let code: String = decode(&raster, self.ink).into_iter().collect();
            if code.chars().count() == self.code_length {
                info!(attempt, %epoch, "challenge code read");
                return ChallengeOutcome::Solved(code);
            }
            debug!(
                attempt,
                read = code.chars().count(),
                expected = self.code_length,
                "short challenge read, waiting for next raster"
            );
            if code.len() > best.len() {
                best = code;
            }
        }
        ChallengeOutcome::Exhausted { best }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::{Raster, render};
    use crate::signals::EventHub;
    use crate::state_machine::{AutomationState, StateMachine};

    const INK: [u8; 2] = [34, 119];

    fn setup() -> (SignalCombinator, StateMachine, EventHub) {
        let machine = StateMachine::new();
        let hub = EventHub::new();
        (
            SignalCombinator::new(machine.clone(), hub.clone()),
            machine,
            hub,
        )
    }

    async fn feed(hub: &EventHub, raster: Raster) {
        while hub.pending_waits() == 0 {
            tokio::task::yield_now().await;
        }
        hub.emit(&GameEvent::Raster(raster));
    }

    #[tokio::test]
    async fn retries_until_full_length() {
        let (combinator, machine, hub) = setup();
        let solver = ChallengeSolver::new(INK, 5, Duration::from_secs(5), 3);
        let epoch = machine.epoch();

        let task = tokio::spawn(async move { solver.solve(&combinator, epoch).await });
        feed(&hub, render("AB3", INK, 5)).await;
        feed(&hub, render("X7K2P", INK, 5)).await;

        assert_eq!(
            task.await.unwrap(),
            ChallengeOutcome::Solved("X7K2P".into())
        );
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let (combinator, machine, hub) = setup();
        let solver = ChallengeSolver::new(INK, 5, Duration::from_secs(5), 2);
        let epoch = machine.epoch();

        let task = tokio::spawn(async move { solver.solve(&combinator, epoch).await });
        feed(&hub, render("AB", INK, 5)).await;
        feed(&hub, render("ABC", INK, 5)).await;

        assert_eq!(
            task.await.unwrap(),
            ChallengeOutcome::Exhausted { best: "ABC".into() }
        );
    }

    #[tokio::test]
    async fn state_change_cancels_solving() {
        let (combinator, machine, hub) = setup();
        let solver = ChallengeSolver::new(INK, 5, Duration::from_secs(5), 10);
        let epoch = machine.set_state(AutomationState::SolvingChallenge);

        let task = tokio::spawn(async move { solver.solve(&combinator, epoch).await });
        while hub.pending_waits() == 0 {
            tokio::task::yield_now().await;
        }
        machine.set_state(AutomationState::Idle);

        assert_eq!(task.await.unwrap(), ChallengeOutcome::Cancelled);
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_times_out() {
        let (combinator, machine, _hub) = setup();
        let solver = ChallengeSolver::from_config(&AnglerConfig::default());

        let outcome = solver.solve(&combinator, machine.epoch()).await;
        assert_eq!(outcome, ChallengeOutcome::TimedOut);
    }
}
