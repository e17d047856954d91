mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use attackline::challenge::{
    ArithmeticProvider, Attempt, ChallengeResolver, FALLBACK_SOLUTION, NoDisplay, ResolutionReason,
};
use attackline::game::{
    ActionKind, ChallengeOutcome, DifficultyTier, MatchStatus, Phase, resolve,
};
use attackline::session::{SessionEvent, SessionUpdate};

use common::{FixedProvider, ScriptedAnswers, config_with_duration, pick, solo_session};

#[tokio::test(start_paused = true)]
async fn clock_expiry_fails_a_challenge_with_budget_left() {
    // Two seconds of match left, the easy ground pass has thirty.
    let session = solo_session("Alice", &config_with_duration(2)).await;
    let action = pick(&session, 1);
    assert_eq!(action.tier(), DifficultyTier::Easy);
    session.begin_action(&action).unwrap();

    let resolver = ChallengeResolver::new(FixedProvider::new(&[1, 2, 3]), 3);
    let mut answers = ScriptedAnswers::immediate(&["1"]);

    let started = Instant::now();
    let report = resolver
        .run(&action, &mut answers, session.shared().subscribe(), &mut NoDisplay)
        .await;

    assert_eq!(report.outcome, ChallengeOutcome::Failure);
    assert_eq!(report.reason, ResolutionReason::MatchEnded);
    assert_eq!(report.solved, 1);
    assert!(action.time_budget() - started.elapsed() >= Duration::from_secs(8));
    assert_eq!(session.shared().clock().status, MatchStatus::Finished);

    let r = resolve(Phase::INITIAL, action.kind(), report.outcome).unwrap();
    assert_eq!(r.next_phase, Phase::INITIAL);

    let update = session
        .handle(SessionEvent::ActionResolved {
            action,
            outcome: report.outcome,
        })
        .await
        .unwrap();
    assert_eq!(update, SessionUpdate::Discarded);
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn budget_preempts_a_slow_answer() {
    let session = solo_session("Alice", &config_with_duration(180)).await;
    let lob = pick(&session, 3);
    assert_eq!(lob.tier(), DifficultyTier::Hard);

    let resolver = ChallengeResolver::new(FixedProvider::new(&[4, 5, 6]), 3);
    let mut answers = ScriptedAnswers::paced(Duration::from_secs(4), &["4", "5", "6"]);

    let report = resolver
        .run(&lob, &mut answers, session.shared().subscribe(), &mut NoDisplay)
        .await;

    assert_eq!(report.reason, ResolutionReason::BudgetExpired);
    assert_eq!(report.outcome, ChallengeOutcome::Failure);
    assert_eq!(report.solved, 2);
    assert!(report.elapsed >= Duration::from_secs(10));
    assert!(report.elapsed < Duration::from_secs(11));
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn wrong_answers_keep_progress_and_success_commits() {
    let session = solo_session("Alice", &config_with_duration(180)).await;
    let ground = pick(&session, 1);

    let resolver = ChallengeResolver::new(FixedProvider::new(&[7, 8, 9]), 3);
    let mut answers = ScriptedAnswers::immediate(&["7", "nope", "80", "8", "9"]);
    let report = resolver
        .run(&ground, &mut answers, session.shared().subscribe(), &mut NoDisplay)
        .await;

    assert_eq!(report.reason, ResolutionReason::Solved);
    assert_eq!(report.solved, 3);

    let update = session
        .handle(SessionEvent::ActionResolved {
            action: ground,
            outcome: report.outcome,
        })
        .await
        .unwrap();
    let SessionUpdate::Resolved(report) = update else {
        panic!("expected commit, got {update:?}");
    };
    assert_eq!(report.resolution.next_phase.get(), 2);
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancel_abandons_the_attempt() {
    let session = solo_session("Alice", &config_with_duration(180)).await;
    let action = pick(&session, 2);
    assert_eq!(action.kind(), ActionKind::ThroughPass);

    let resolver = ChallengeResolver::new(FixedProvider::new(&[1, 1, 1]), 3);
    let mut answers = ScriptedAnswers::immediate(&["1"]).then(Duration::ZERO, Attempt::Cancel);
    let report = resolver
        .run(&action, &mut answers, session.shared().subscribe(), &mut NoDisplay)
        .await;

    assert_eq!(report.reason, ResolutionReason::Cancelled);
    assert_eq!(report.outcome, ChallengeOutcome::Failure);
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn each_attempt_fetches_a_fresh_batch() {
    let session = solo_session("Alice", &config_with_duration(180)).await;
    let provider = FixedProvider::new(&[2, 2]);
    let resolver = ChallengeResolver::new(provider.clone(), 2);

    for _ in 0..2 {
        let mut answers = ScriptedAnswers::immediate(&["2", "2"]);
        let report = resolver
            .run(&pick(&session, 1), &mut answers, session.shared().subscribe(), &mut NoDisplay)
            .await;
        assert!(report.outcome.is_success());
    }
    assert_eq!(provider.fetches(), 2);
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn short_batch_is_replaced_by_placeholders() {
    let session = solo_session("Alice", &config_with_duration(180)).await;
    let resolver = ChallengeResolver::new(FixedProvider::new(&[1]), 3);
    let placeholder = FALLBACK_SOLUTION.to_string();
    let p = placeholder.as_str();
    let mut answers = ScriptedAnswers::immediate(&[p, p, p]);

    let report = resolver
        .run(&pick(&session, 1), &mut answers, session.shared().subscribe(), &mut NoDisplay)
        .await;
    assert_eq!(report.reason, ResolutionReason::Solved);
    session.shutdown().await;
}

#[tokio::test]
async fn offline_provider_with_closed_input() {
    let session = solo_session("Alice", &config_with_duration(180)).await;
    let provider = Arc::new(ArithmeticProvider);
    let items = attackline::challenge::fetch_or_fallback(provider.as_ref(), 3).await;
    assert_eq!(items.len(), 3);

    let resolver = ChallengeResolver::new(provider, 3);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Attempt>();
    drop(tx);
    let report = resolver
        .run(&pick(&session, 1), &mut rx, session.shared().subscribe(), &mut NoDisplay)
        .await;
    assert_eq!(report.reason, ResolutionReason::InputClosed);
    session.shutdown().await;
}
