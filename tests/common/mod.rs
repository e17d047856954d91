#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use attackline::challenge::{AnswerSource, Attempt, Challenge, ChallengeProvider};
use attackline::commentary::CannedCommentary;
use attackline::config::MatchConfig;
use attackline::error::ProviderError;
use attackline::game::{ActionConfig, ChallengeOutcome, PlayerId};
use attackline::session::{SessionCoordinator, SessionEvent, SessionUpdate};
use attackline::transport::LocalHub;

/// Provider returning the same items every time, counting fetches.
pub struct FixedProvider {
    items: Vec<Challenge>,
    fetches: AtomicUsize,
}

impl FixedProvider {
    pub fn new(solutions: &[i64]) -> Arc<Self> {
        Arc::new(Self {
            items: solutions
                .iter()
                .map(|&s| Challenge::new(format!("what is {s}?"), s))
                .collect(),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChallengeProvider for FixedProvider {
    async fn fetch_challenges(&self, _count: usize) -> Result<Vec<Challenge>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Answers played back in order, each after its own delay.
///
/// Once the script runs out the source stays open and silent.
pub struct ScriptedAnswers {
    script: VecDeque<(Duration, Attempt)>,
}

impl ScriptedAnswers {
    pub fn immediate(answers: &[&str]) -> Self {
        Self::paced(Duration::ZERO, answers)
    }

    pub fn paced(delay: Duration, answers: &[&str]) -> Self {
        Self {
            script: answers
                .iter()
                .map(|a| (delay, Attempt::Answer((*a).to_owned())))
                .collect(),
        }
    }

    pub fn then(mut self, delay: Duration, attempt: Attempt) -> Self {
        self.script.push_back((delay, attempt));
        self
    }
}

#[async_trait::async_trait]
impl AnswerSource for ScriptedAnswers {
    async fn next_attempt(&mut self) -> Option<Attempt> {
        match self.script.pop_front() {
            Some((delay, attempt)) => {
                tokio::time::sleep(delay).await;
                Some(attempt)
            }
            None => std::future::pending().await,
        }
    }
}

pub fn config_with_duration(secs: u32) -> MatchConfig {
    MatchConfig {
        match_duration_secs: secs,
        ..MatchConfig::default()
    }
}

pub fn session_on(hub: &LocalHub, config: &MatchConfig) -> Arc<SessionCoordinator> {
    Arc::new(SessionCoordinator::new(
        config,
        Arc::new(hub.connect()),
        Arc::new(CannedCommentary),
    ))
}

/// Joined and started alone.
pub async fn solo_session(name: &str, config: &MatchConfig) -> Arc<SessionCoordinator> {
    let session = session_on(&LocalHub::default(), config);
    session
        .handle(SessionEvent::Join { name: name.into() })
        .await
        .expect("join should succeed");
    session
        .handle(SessionEvent::StartSolo)
        .await
        .expect("solo start should succeed");
    session
}

pub fn local_id(session: &SessionCoordinator) -> PlayerId {
    session.local_id().cloned().expect("session should have joined")
}

pub fn current_phase(session: &SessionCoordinator) -> u8 {
    session
        .local_player()
        .expect("session should have joined")
        .phase
        .get()
}

/// Picks the 1-based menu option for the player's current phase.
pub fn pick(session: &SessionCoordinator, choice: usize) -> ActionConfig {
    session
        .selector()
        .pick(current_phase(session), choice)
        .expect("menu option should exist")
}

pub async fn commit(
    session: &SessionCoordinator,
    action: ActionConfig,
    outcome: ChallengeOutcome,
) -> SessionUpdate {
    session
        .handle(SessionEvent::ActionResolved { action, outcome })
        .await
        .expect("commit should succeed")
}

/// Waits for the first update matching `pred`, failing after `within`.
pub async fn expect_update(
    rx: &mut mpsc::UnboundedReceiver<SessionUpdate>,
    within: Duration,
    pred: impl Fn(&SessionUpdate) -> bool,
) -> SessionUpdate {
    tokio::time::timeout(within, async {
        loop {
            let update = rx.recv().await.expect("peer pump should still be running");
            if pred(&update) {
                return update;
            }
        }
    })
    .await
    .expect("expected update did not arrive in time")
}

/// Polls `check` until it holds, failing after `within`.
pub async fn eventually(within: Duration, check: impl Fn() -> bool) {
    tokio::time::timeout(within, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition did not hold in time");
}

/// Runs the `attackline` binary to completion with stdin closed.
pub fn run_cli(args: &[&str]) -> std::process::Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_attackline"))
        .args(args)
        .env_remove("ATTACKLINE_CONFIG")
        .env_remove("ATTACKLINE_NAME")
        .env_remove("ATTACKLINE_BIND")
        .env_remove("ATTACKLINE_METRICS_PORT")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to spawn attackline")
}
