//! Match and player state.
//!
//! Plain data plus the transition methods that keep its invariants:
//! status only moves forward, the clock is frozen once finished, goal
//! counts never go down, and players only join while waiting.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attack::{AttackResolution, ChallengeOutcome, Phase};

/// Identifier of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a `PlayerId` from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Generates a fresh id of the form `player_xxxxxxxxx`.
    #[must_use]
    pub fn generate() -> Self {
        let raw = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("player_{}", &raw[..9]))
    }

    /// String form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a match session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl Default for MatchId {
    fn default() -> Self {
        Self("match_1".to_owned())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-player progress within a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Player identity.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Goals scored this match.
    pub goals: u32,
    /// Current attack phase.
    #[serde(rename = "currentStep")]
    pub phase: Phase,
    /// Outcome of the most recent action.
    #[serde(rename = "lastStepResult")]
    pub last_outcome: Option<ChallengeOutcome>,
}

impl PlayerState {
    /// Fresh player at phase 1 with no goals.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            goals: 0,
            phase: Phase::INITIAL,
            last_outcome: None,
        }
    }

    /// Applies a resolved action to this player.
    pub fn apply(&mut self, resolution: &AttackResolution, outcome: ChallengeOutcome) {
        self.phase = resolution.next_phase;
        self.goals = self.goals.saturating_add(resolution.score_delta);
        self.last_outcome = Some(outcome);
    }

    /// Raises the goal count to `goals`. Lower values are ignored.
    ///
    /// Returns `true` if the count changed.
    pub fn raise_goals(&mut self, goals: u32) -> bool {
        if goals > self.goals {
            self.goals = goals;
            true
        } else {
            false
        }
    }
}

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Gathering players.
    #[default]
    Waiting,
    /// Clock running.
    Playing,
    /// Clock expired.
    Finished,
}

impl MatchStatus {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of adding a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// New entry created.
    Added,
    /// Existing entry replaced.
    Replaced,
    /// Match already under way; player not admitted.
    RejectedLate,
}

/// Result of one clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; nothing changed.
    Idle,
    /// One second elapsed.
    Running(u32),
    /// Final tick; the match is now finished.
    Finished,
}

/// Canonical view of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    /// Match identifier.
    pub id: MatchId,
    /// Wall-clock start, set when play begins.
    #[serde(rename = "startTime")]
    pub started_at: Option<DateTime<Utc>>,
    /// Seconds left on the match clock.
    #[serde(rename = "timeLeft")]
    pub seconds_remaining: u32,
    /// Participants keyed by id.
    pub players: HashMap<PlayerId, PlayerState>,
    /// Lifecycle status.
    pub status: MatchStatus,
}

impl MatchState {
    /// Empty match waiting for players with a full clock.
    #[must_use]
    pub fn new(id: MatchId, duration_secs: u32) -> Self {
        Self {
            id,
            started_at: None,
            seconds_remaining: duration_secs,
            players: HashMap::new(),
            status: MatchStatus::Waiting,
        }
    }

    /// Returns `true` while the clock is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == MatchStatus::Playing
    }

    /// Adds or replaces a player. Only admitted while waiting.
    pub fn add_player(&mut self, player: PlayerState) -> JoinOutcome {
        if self.status != MatchStatus::Waiting {
            return JoinOutcome::RejectedLate;
        }
        match self.players.insert(player.id.clone(), player) {
            Some(_) => JoinOutcome::Replaced,
            None => JoinOutcome::Added,
        }
    }

    /// Moves from waiting to playing, resetting the clock.
    ///
    /// Returns `false` if the match was not waiting.
    pub fn start(&mut self, now: DateTime<Utc>, duration_secs: u32) -> bool {
        if self.status != MatchStatus::Waiting {
            return false;
        }
        self.status = MatchStatus::Playing;
        self.started_at = Some(now);
        self.seconds_remaining = duration_secs;
        true
    }

    /// Advances the clock by one second.
    ///
    /// The tick that reaches zero also finishes the match, so a playing match
    /// never shows zero seconds remaining.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != MatchStatus::Playing {
            return TickOutcome::Idle;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.status = MatchStatus::Finished;
            TickOutcome::Finished
        } else {
            TickOutcome::Running(self.seconds_remaining)
        }
    }

    /// Players ordered by goals (descending), then name.
    #[must_use]
    pub fn standings(&self) -> Vec<&PlayerState> {
        let mut players: Vec<_> = self.players.values().collect();
        players.sort_by(|a, b| b.goals.cmp(&a.goals).then_with(|| a.name.cmp(&b.name)));
        players
    }
}
