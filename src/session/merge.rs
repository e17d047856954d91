//! Reconciliation of a full-state sync with the local view.

use crate::game::{MatchState, MatchStatus, PlayerId};

/// Why an incoming state was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRejection {
    /// Belongs to a different match.
    OtherMatch,
    /// Would move the status backwards.
    StatusRegression,
    /// Claims to be playing with no time left.
    Inconsistent,
}

impl MergeRejection {
    /// Drop-reason label for metrics and events.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::OtherMatch | Self::StatusRegression => "stale_state",
            Self::Inconsistent => "malformed",
        }
    }
}

/// Result of an accepted sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMerge {
    /// The merge moved the match from waiting to playing.
    pub started: bool,
    /// Players the incoming state tried to add after the match left waiting.
    pub late_joins: Vec<PlayerId>,
}

/// Replaces `current` with `incoming`, keeping local guarantees.
///
/// - status never moves backwards and match ids must agree,
/// - the local player's phase, last outcome, and name stay as they are,
/// - nobody's goal count drops,
/// - players known locally but missing from `incoming` are kept,
/// - once the match has left waiting no new players are added,
/// - a running clock never goes up and a finished clock stays frozen.
///
/// # Errors
///
/// Returns a [`MergeRejection`] and leaves `current` untouched when the
/// incoming state cannot be adopted.
pub fn merge_sync(
    current: &mut MatchState,
    mut incoming: MatchState,
    local: Option<&PlayerId>,
) -> Result<SyncMerge, MergeRejection> {
    if incoming.id != current.id {
        return Err(MergeRejection::OtherMatch);
    }
    if incoming.status < current.status {
        return Err(MergeRejection::StatusRegression);
    }
    if incoming.status == MatchStatus::Playing && incoming.seconds_remaining == 0 {
        return Err(MergeRejection::Inconsistent);
    }

    let mut late_joins = Vec::new();
    if current.status != MatchStatus::Waiting {
        incoming.players.retain(|id, _| {
            let known = current.players.contains_key(id);
            if !known {
                late_joins.push(id.clone());
            }
            known
        });
        incoming.seconds_remaining = match current.status {
            MatchStatus::Finished => current.seconds_remaining,
            _ => incoming.seconds_remaining.min(current.seconds_remaining),
        };
    }

    for (id, known) in &current.players {
        let entry = incoming
            .players
            .entry(id.clone())
            .or_insert_with(|| known.clone());
        entry.goals = entry.goals.max(known.goals);
        if Some(id) == local {
            entry.phase = known.phase;
            entry.last_outcome = known.last_outcome;
            entry.name.clone_from(&known.name);
        }
    }

    let started = current.status == MatchStatus::Waiting && incoming.is_playing();
    *current = incoming;
    Ok(SyncMerge {
        started,
        late_joins,
    })
}
