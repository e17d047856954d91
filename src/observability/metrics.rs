//! Prometheus metrics.
//!
//! Recording functions are always safe to call: the `metrics` macros no-op
//! until [`init_metrics`] installs a recorder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::AttacklineError;
use crate::game::{ActionKind, ChallengeOutcome};
use crate::transport::MessageType;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Reasons a peer message may be dropped. Anything else is bucketed as
/// `"__unknown__"` to keep label cardinality bounded.
const KNOWN_DROP_REASONS: [&str; 7] = [
    "loopback",
    "malformed",
    "unknown_sender",
    "late_join",
    "stale_state",
    "lagged",
    "not_playing",
];

/// Sanitizes a drop reason for use as a metrics label.
#[must_use]
pub fn sanitize_drop_reason(reason: &str) -> &str {
    if KNOWN_DROP_REASONS.contains(&reason) {
        reason
    } else {
        "__unknown__"
    }
}

/// Installs the global recorder.
///
/// With `port`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. Later calls are no-ops.
///
/// # Errors
///
/// Returns `AttacklineError::Io` if the recorder or listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), AttacklineError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| AttacklineError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "attackline_actions_total",
        "Resolved actions by kind and outcome"
    );
    describe_counter!("attackline_goals_total", "Goals scored by the local player");
    describe_counter!(
        "attackline_peer_messages_total",
        "Peer messages sent and received by type"
    );
    describe_counter!(
        "attackline_peer_messages_dropped_total",
        "Peer messages discarded by reason"
    );
    describe_gauge!(
        "attackline_seconds_remaining",
        "Seconds left on the match clock"
    );
    describe_histogram!(
        "attackline_challenge_duration_seconds",
        "Time from action activation to resolution"
    );
    describe_counter!(
        "attackline_provider_fallbacks_total",
        "Provider failures replaced by fallback content"
    );
}

/// Records a resolved challenge.
pub fn record_challenge(kind: ActionKind, outcome: ChallengeOutcome, elapsed: Duration) {
    counter!(
        "attackline_actions_total",
        "kind" => kind.as_str(),
        "outcome" => outcome.as_str(),
    )
    .increment(1);
    histogram!("attackline_challenge_duration_seconds", "kind" => kind.as_str())
        .record(elapsed.as_secs_f64());
}

/// Records a goal by the local player.
pub fn record_goal() {
    counter!("attackline_goals_total").increment(1);
}

/// Records a peer message; `direction` is `"in"` or `"out"`.
pub fn record_peer_message(kind: MessageType, direction: &'static str) {
    counter!(
        "attackline_peer_messages_total",
        "type" => kind.as_str(),
        "direction" => direction,
    )
    .increment(1);
}

/// Records a discarded peer message.
pub fn record_peer_message_dropped(reason: &str) {
    counter!(
        "attackline_peer_messages_dropped_total",
        "reason" => sanitize_drop_reason(reason).to_owned()
    )
    .increment(1);
}

/// Sets the match clock gauge.
pub fn record_seconds_remaining(seconds: u32) {
    gauge!("attackline_seconds_remaining").set(f64::from(seconds));
}

/// Records a provider failure that fell back to stock content.
pub fn record_provider_fallback(provider: &'static str) {
    counter!("attackline_provider_fallbacks_total", "provider" => provider).increment(1);
}
