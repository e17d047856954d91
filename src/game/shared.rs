//! Shared match handle.
//!
//! The clock task, the peer pump, and the challenge flow all mutate the same
//! [`MatchState`]. Every mutation goes through [`SharedMatch::update`], which
//! holds the lock for the whole read-modify-write and then publishes a
//! [`ClockSnapshot`] so waiters (e.g. a running challenge) notice status
//! changes without polling.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use super::state::{MatchState, MatchStatus};

/// Status and remaining time, as published after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    /// Match status.
    pub status: MatchStatus,
    /// Seconds left on the match clock.
    pub seconds_remaining: u32,
}

impl ClockSnapshot {
    fn of(state: &MatchState) -> Self {
        Self {
            status: state.status,
            seconds_remaining: state.seconds_remaining,
        }
    }

    /// Returns `true` while the clock is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == MatchStatus::Playing
    }
}

struct Inner {
    state: Mutex<MatchState>,
    clock: watch::Sender<ClockSnapshot>,
}

/// Cloneable handle to one match's state.
#[derive(Clone)]
pub struct SharedMatch {
    inner: Arc<Inner>,
}

impl SharedMatch {
    /// Wraps `state`.
    #[must_use]
    pub fn new(state: MatchState) -> Self {
        let (clock, _) = watch::channel(ClockSnapshot::of(&state));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                clock,
            }),
        }
    }

    /// Runs `f` on the state as one atomic step, then publishes a snapshot.
    ///
    /// `f` must not block; the lock is a plain mutex and is never held across
    /// an `.await`.
    pub fn update<R>(&self, f: impl FnOnce(&mut MatchState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut state);
            (result, ClockSnapshot::of(&state))
        };
        self.inner.clock.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        result
    }

    /// Reads the state without modifying it.
    pub fn read<R>(&self, f: impl FnOnce(&MatchState) -> R) -> R {
        let state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Clones the full state.
    #[must_use]
    pub fn snapshot(&self) -> MatchState {
        self.read(Clone::clone)
    }

    /// Latest published clock snapshot.
    #[must_use]
    pub fn clock(&self) -> ClockSnapshot {
        *self.inner.clock.borrow()
    }

    /// Subscribes to clock snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ClockSnapshot> {
        self.inner.clock.subscribe()
    }
}

impl std::fmt::Debug for SharedMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.clock();
        f.debug_struct("SharedMatch")
            .field("status", &clock.status)
            .field("seconds_remaining", &clock.seconds_remaining)
            .finish_non_exhaustive()
    }
}
