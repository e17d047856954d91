//! Match clock.
//!
//! Background task ticking once per second while the match is playing: an
//! interval raced against a cancellation token inside `tokio::select!`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::observability::metrics;

use super::shared::SharedMatch;
use super::state::{MatchState, TickOutcome};

/// Real-time length of one clock tick.
pub const TICK: Duration = Duration::from_secs(1);

/// Handle to a running match clock.
#[derive(Debug)]
pub struct MatchClock {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl MatchClock {
    /// Spawns the clock for `shared`.
    ///
    /// The first tick fires one [`TICK`] after the call. The task exits on
    /// cancellation, on the tick that finishes the match, or on the first
    /// tick that finds the match no longer playing.
    #[must_use]
    pub fn start(shared: SharedMatch, cancel: CancellationToken) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!("match clock cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        match shared.update(MatchState::tick) {
                            TickOutcome::Running(remaining) => {
                                metrics::record_seconds_remaining(remaining);
                            }
                            TickOutcome::Finished => {
                                metrics::record_seconds_remaining(0);
                                info!("match clock expired");
                                break;
                            }
                            TickOutcome::Idle => {
                                debug!("match no longer playing; clock stopped");
                                break;
                            }
                        }
                    }
                }
            }
        });
        Self { cancel, handle }
    }

    /// Stops the clock without waiting for the task.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the clock and waits for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::game::state::{MatchId, MatchState, MatchStatus};

    fn playing(duration: u32) -> SharedMatch {
        let shared = SharedMatch::new(MatchState::new(MatchId::default(), duration));
        shared.update(|m| m.start(Utc::now(), duration));
        shared
    }

    #[tokio::test(start_paused = true)]
    async fn runs_down_full_match() {
        let shared = playing(180);
        let clock = MatchClock::start(shared.clone(), CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(90) + Duration::from_millis(500)).await;
        assert_eq!(shared.clock().seconds_remaining, 90);
        assert!(shared.clock().is_playing());

        tokio::time::sleep(Duration::from_secs(91)).await;
        let snap = shared.clock();
        assert_eq!(snap.status, MatchStatus::Finished);
        assert_eq!(snap.seconds_remaining, 0);
        assert!(clock.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_while_waiting() {
        let shared = SharedMatch::new(MatchState::new(MatchId::default(), 180));
        let clock = MatchClock::start(shared.clone(), CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(shared.clock().seconds_remaining, 180);
        assert_eq!(shared.clock().status, MatchStatus::Waiting);
        assert!(clock.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticking() {
        let shared = playing(60);
        let clock = MatchClock::start(shared.clone(), CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        clock.shutdown().await;
        assert_eq!(shared.clock().seconds_remaining, 57);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(shared.clock().seconds_remaining, 57);
        assert!(shared.clock().is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn finishes_exactly_on_last_tick() {
        let shared = playing(3);
        let mut rx = shared.subscribe();
        let _clock = MatchClock::start(shared.clone(), CancellationToken::new());

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let snap = *rx.borrow_and_update();
            seen.push((snap.status, snap.seconds_remaining));
            if snap.status == MatchStatus::Finished {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                (MatchStatus::Playing, 2),
                (MatchStatus::Playing, 1),
                (MatchStatus::Finished, 0),
            ]
        );
    }
}
