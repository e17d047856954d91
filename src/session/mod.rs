//! Session coordination.
//!
//! The [`SessionCoordinator`] owns the local view of the match and is the
//! only place that turns joins, peer messages, and resolved challenges into
//! state changes. Everything it is told arrives as a [`SessionEvent`];
//! everything it decides comes back as a [`SessionUpdate`].

pub mod coordinator;
pub mod merge;

pub use coordinator::SessionCoordinator;
pub use merge::{MergeRejection, SyncMerge, merge_sync};

use crate::game::{ActionConfig, AttackResolution, ChallengeOutcome, Phase, PlayerId};
use crate::transport::PeerMessage;

/// Input to [`SessionCoordinator::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The local player joins under `name`.
    Join {
        /// Display name.
        name: String,
    },
    /// Start the clock without waiting for an opponent.
    StartSolo,
    /// A message from the peer transport.
    Peer(PeerMessage),
    /// A challenge for `action` finished with `outcome`.
    ActionResolved {
        /// The action that was attempted.
        action: ActionConfig,
        /// Whether the challenge was solved.
        outcome: ChallengeOutcome,
    },
    /// Broadcast the full local state.
    ResyncRequested,
}

/// A committed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    /// The action that was attempted.
    pub action: ActionConfig,
    /// Challenge outcome.
    pub outcome: ChallengeOutcome,
    /// Phase before the action.
    pub from_phase: Phase,
    /// Transition applied.
    pub resolution: AttackResolution,
    /// Local goal count after the action.
    pub goals: u32,
    /// Commentary line for the transition.
    pub commentary: String,
}

/// Result of [`SessionCoordinator::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The local player joined.
    Joined {
        /// Assigned id.
        player_id: PlayerId,
        /// Whether the join started the match.
        started: bool,
    },
    /// The match clock started.
    Started,
    /// A peer joined or re-announced themselves.
    PeerJoined {
        /// Peer id.
        player_id: PlayerId,
        /// Peer display name.
        name: String,
        /// Whether this join started the match.
        started: bool,
    },
    /// A peer's goal count went up.
    ScoreUpdated {
        /// Peer id.
        player_id: PlayerId,
        /// New goal count.
        goals: u32,
    },
    /// A full-state sync was merged.
    StateSynced {
        /// Whether the merge started the match.
        started: bool,
    },
    /// The local action was committed.
    Resolved(Box<ActionReport>),
    /// The action finished after the match ended; nothing was applied.
    Discarded,
    /// The full local state was broadcast.
    ResyncSent,
    /// A peer message was dropped.
    Dropped {
        /// Drop reason label.
        reason: &'static str,
    },
    /// Valid input that changed nothing.
    Unchanged,
}

impl SessionUpdate {
    /// Returns `true` if the update started the match clock.
    #[must_use]
    pub const fn started_match(&self) -> bool {
        matches!(
            self,
            Self::Started
                | Self::Joined { started: true, .. }
                | Self::PeerJoined { started: true, .. }
                | Self::StateSynced { started: true }
        )
    }
}
