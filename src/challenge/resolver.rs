//! Challenge resolver.
//!
//! Runs one challenge session for a chosen action and reports success or
//! failure. Three futures race inside a single `tokio::select!`:
//!
//! - the action's own time budget, measured from activation,
//! - the match clock leaving `playing`,
//! - the answer loop over the fetched challenge items.
//!
//! Whichever finishes first decides the outcome, so a timeout preempts any
//! further input even in the middle of a sequence.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::game::{ActionConfig, ChallengeOutcome, ClockSnapshot};
use crate::observability::metrics;

use super::{Challenge, ChallengeProvider, fetch_or_fallback};

/// One input from the player during a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// Raw answer text for the current item.
    Answer(String),
    /// Abandon the challenge.
    Cancel,
}

/// Where attempts come from.
#[async_trait::async_trait]
pub trait AnswerSource: Send {
    /// Waits for the next attempt. `None` means input is closed.
    async fn next_attempt(&mut self) -> Option<Attempt>;
}

#[async_trait::async_trait]
impl AnswerSource for mpsc::Receiver<Attempt> {
    async fn next_attempt(&mut self) -> Option<Attempt> {
        self.recv().await
    }
}

#[async_trait::async_trait]
impl AnswerSource for mpsc::UnboundedReceiver<Attempt> {
    async fn next_attempt(&mut self) -> Option<Attempt> {
        self.recv().await
    }
}

/// Observer for presenting a challenge session.
///
/// All methods default to no-ops.
pub trait ChallengeDisplay: Send {
    /// Items are being fetched for `action`.
    fn loading(&mut self, _action: &ActionConfig) {}

    /// Item `index` (0-based) of `total` is now current.
    fn show(&mut self, _index: usize, _total: usize, _challenge: &Challenge, _time_left: Duration) {}

    /// The answer for item `index` was wrong; the item stays current.
    fn wrong(&mut self, _index: usize) {}
}

/// Display that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplay;

impl ChallengeDisplay for NoDisplay {}

/// Why a challenge session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionReason {
    /// Every item answered correctly.
    Solved,
    /// The action's time budget ran out.
    BudgetExpired,
    /// The match clock reached zero.
    MatchEnded,
    /// The player abandoned the challenge.
    Cancelled,
    /// The answer source closed.
    InputClosed,
}

impl ResolutionReason {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solved => "solved",
            Self::BudgetExpired => "budget_expired",
            Self::MatchEnded => "match_ended",
            Self::Cancelled => "cancelled",
            Self::InputClosed => "input_closed",
        }
    }
}

/// Result of one challenge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeReport {
    /// Success only when every item was solved in time.
    pub outcome: ChallengeOutcome,
    /// What ended the session.
    pub reason: ResolutionReason,
    /// Items answered correctly.
    pub solved: usize,
    /// Time from activation to resolution.
    pub elapsed: Duration,
}

/// Runs challenge sessions against a provider.
#[derive(Clone)]
pub struct ChallengeResolver {
    provider: Arc<dyn ChallengeProvider>,
    per_action: usize,
}

impl ChallengeResolver {
    /// Resolver fetching `per_action` items per session from `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn ChallengeProvider>, per_action: usize) -> Self {
        Self {
            provider,
            per_action,
        }
    }

    /// Number of items per session.
    #[must_use]
    pub const fn per_action(&self) -> usize {
        self.per_action
    }

    /// Runs one session for `action`.
    ///
    /// The budget clock starts on entry, so fetching items counts against it.
    pub async fn run(
        &self,
        action: &ActionConfig,
        answers: &mut dyn AnswerSource,
        mut clock: watch::Receiver<ClockSnapshot>,
        display: &mut dyn ChallengeDisplay,
    ) -> ChallengeReport {
        let started = Instant::now();
        let deadline = started + action.time_budget();
        let mut solved = 0;

        let reason = tokio::select! {
            biased;
            _ = clock.wait_for(|snap| !snap.is_playing()) => ResolutionReason::MatchEnded,
            () = tokio::time::sleep_until(deadline) => ResolutionReason::BudgetExpired,
            reason = self.answer_loop(action, answers, display, deadline, &mut solved) => reason,
        };

        let elapsed = started.elapsed();
        let outcome = ChallengeOutcome::from_success(reason == ResolutionReason::Solved);
        metrics::record_challenge(action.kind(), outcome, elapsed);
        info!(
            action = %action,
            outcome = outcome.as_str(),
            reason = reason.as_str(),
            solved,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "challenge resolved"
        );

        ChallengeReport {
            outcome,
            reason,
            solved,
            elapsed,
        }
    }

    async fn answer_loop(
        &self,
        action: &ActionConfig,
        answers: &mut dyn AnswerSource,
        display: &mut dyn ChallengeDisplay,
        deadline: Instant,
        solved: &mut usize,
    ) -> ResolutionReason {
        display.loading(action);
        let items = fetch_or_fallback(self.provider.as_ref(), self.per_action).await;
        let total = items.len();

        for (index, challenge) in items.iter().enumerate() {
            display.show(
                index,
                total,
                challenge,
                deadline.saturating_duration_since(Instant::now()),
            );
            loop {
                match answers.next_attempt().await {
                    None => return ResolutionReason::InputClosed,
                    Some(Attempt::Cancel) => return ResolutionReason::Cancelled,
                    Some(Attempt::Answer(answer)) if challenge.accepts(&answer) => {
                        *solved += 1;
                        break;
                    }
                    Some(Attempt::Answer(_)) => {
                        debug!(index, "wrong answer");
                        display.wrong(index);
                    }
                }
            }
        }

        ResolutionReason::Solved
    }
}

impl std::fmt::Debug for ChallengeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeResolver")
            .field("provider", &self.provider.name())
            .field("per_action", &self.per_action)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::error::ProviderError;
    use crate::game::{ActionCatalog, ActionKind, DifficultyTier, MatchId, MatchState, SharedMatch};

    struct Counting;

    #[async_trait::async_trait]
    impl ChallengeProvider for Counting {
        async fn fetch_challenges(&self, count: usize) -> Result<Vec<Challenge>, ProviderError> {
            Ok((1..=count)
                .map(|i| Challenge::new(format!("item {i}"), i64::try_from(i).unwrap()))
                .collect())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[derive(Default)]
    struct Recorder {
        shown: Vec<usize>,
        wrong: Vec<usize>,
    }

    impl ChallengeDisplay for Recorder {
        fn show(&mut self, index: usize, _total: usize, _c: &Challenge, _left: Duration) {
            self.shown.push(index);
        }

        fn wrong(&mut self, index: usize) {
            self.wrong.push(index);
        }
    }

    fn playing_match() -> SharedMatch {
        let shared = SharedMatch::new(MatchState::new(MatchId::default(), 180));
        shared.update(|m| m.start(Utc::now(), 180));
        shared
    }

    fn resolver() -> ChallengeResolver {
        ChallengeResolver::new(Arc::new(Counting), 3)
    }

    fn easy_pass() -> ActionConfig {
        ActionCatalog::default().get(ActionKind::GroundPass, DifficultyTier::Easy)
    }

    fn scripted(
        attempts: &[&str],
    ) -> (
        mpsc::UnboundedSender<Attempt>,
        mpsc::UnboundedReceiver<Attempt>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        for a in attempts {
            let attempt = if *a == "cancel" {
                Attempt::Cancel
            } else {
                Attempt::Answer((*a).to_owned())
            };
            tx.send(attempt).unwrap();
        }
        (tx, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn all_correct_succeeds() {
        let shared = playing_match();
        let (_tx, mut answers) = scripted(&["1", "2", "3"]);
        let mut display = Recorder::default();
        let report = resolver()
            .run(&easy_pass(), &mut answers, shared.subscribe(), &mut display)
            .await;
        assert_eq!(report.outcome, ChallengeOutcome::Success);
        assert_eq!(report.reason, ResolutionReason::Solved);
        assert_eq!(report.solved, 3);
        assert_eq!(display.shown, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_answer_keeps_progress() {
        let shared = playing_match();
        let (_tx, mut answers) = scripted(&["1", "9", "two", "2", "3"]);
        let mut display = Recorder::default();
        let report = resolver()
            .run(&easy_pass(), &mut answers, shared.subscribe(), &mut display)
            .await;
        assert_eq!(report.outcome, ChallengeOutcome::Success);
        assert_eq!(display.wrong, vec![1, 1]);
        assert_eq!(display.shown, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_expiry_fails_mid_sequence() {
        let shared = playing_match();
        let (_tx, mut answers) = scripted(&["1"]);
        let hard = ActionCatalog::default().get(ActionKind::LobPass, DifficultyTier::Hard);
        let report = resolver()
            .run(&hard, &mut answers, shared.subscribe(), &mut NoDisplay)
            .await;
        assert_eq!(report.outcome, ChallengeOutcome::Failure);
        assert_eq!(report.reason, ResolutionReason::BudgetExpired);
        assert_eq!(report.solved, 1);
        assert!(report.elapsed >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_failure() {
        let shared = playing_match();
        let (_tx, mut answers) = scripted(&["1", "cancel"]);
        let report = resolver()
            .run(&easy_pass(), &mut answers, shared.subscribe(), &mut NoDisplay)
            .await;
        assert_eq!(report.outcome, ChallengeOutcome::Failure);
        assert_eq!(report.reason, ResolutionReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_is_failure() {
        let shared = playing_match();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Attempt::Answer("1".into())).unwrap();
        drop(tx);
        let report = resolver()
            .run(&easy_pass(), &mut rx, shared.subscribe(), &mut NoDisplay)
            .await;
        assert_eq!(report.reason, ResolutionReason::InputClosed);
        assert_eq!(report.outcome, ChallengeOutcome::Failure);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_match_fails_immediately() {
        let shared = playing_match();
        shared.update(|m| {
            m.seconds_remaining = 1;
            m.tick()
        });
        let (_tx, mut answers) = scripted(&["1", "2", "3"]);
        let report = resolver()
            .run(&easy_pass(), &mut answers, shared.subscribe(), &mut NoDisplay)
            .await;
        assert_eq!(report.reason, ResolutionReason::MatchEnded);
        assert!(report.elapsed < Duration::from_secs(1));
    }
}
