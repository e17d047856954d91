//! Attack state machine.
//!
//! Consumes the player's current phase, the action they attempted, and the
//! challenge outcome, and decides the next phase, the commentary event, and
//! the score change.
//!
//! # Rules
//!
//! - Any failure loses possession and resets to phase 1.
//! - A successful shot scores one goal and restarts the attack at phase 1.
//! - A successful pass advances along the adjacency table below.
//! - Any other success is rejected as an [`AttackError::InvalidTransition`],
//!   since it means the option table and this table have drifted apart.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AttackError;

use super::catalog::ActionKind;

/// A player's position in the four-stage attack progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Phase(u8);

impl Phase {
    /// Initial phase; every attack starts and restarts here.
    pub const INITIAL: Self = Self(1);

    /// Final build-up phase; only a shot is on offer.
    pub const FINAL: Self = Self(4);

    /// Returns the phase for `value`, or `None` outside 1..=4.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::INITIAL.0 && value <= Self::FINAL.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Raw phase number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Banner shown above the action menu.
    #[must_use]
    pub fn label(self) -> String {
        match self.0 {
            1 => "Phase 1: Initiation".to_owned(),
            4 => "Phase 4: Final Strike".to_owned(),
            n => format!("Phase {n}: Build Up"),
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("phase must be between 1 and 4, got {value}"))
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        phase.0
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one challenge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeOutcome {
    /// Every item answered correctly within budget.
    Success,
    /// Timed out, cancelled, or abandoned.
    Failure,
}

impl ChallengeOutcome {
    /// Maps a boolean success signal onto an outcome.
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }

    /// Returns `true` for [`ChallengeOutcome::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Lowercase label, used for logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Commentary event produced by a transition.
///
/// The commentary provider turns a tag (plus the score, for goals) into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    /// Attack broke down; back to phase 1.
    PossessionLost,
    /// Shot went in.
    GoalScored,
    /// Ground pass from phase 1 into phase 2.
    MidfieldBuildUp,
    /// Through pass from phase 1 straight to phase 3.
    PiercingBall,
    /// Lob from phase 1 straight to phase 4.
    DirectLob,
    /// Through pass from phase 2 to phase 3.
    MovementOffTheBall,
    /// Lob from phase 2 to phase 4.
    OverTheTop,
    /// Lob from phase 3 to phase 4.
    LastManBeaten,
}

impl EventTag {
    /// Short identifier sent to commentary providers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PossessionLost => "POSSESSION LOST",
            Self::GoalScored => "GOAL SCORED",
            Self::MidfieldBuildUp => "MIDFIELD BUILD UP",
            Self::PiercingBall => "PIERCING THROUGH BALL",
            Self::DirectLob => "DIRECT LOB",
            Self::MovementOffTheBall => "MOVEMENT OFF THE BALL",
            Self::OverTheTop => "OVER THE TOP",
            Self::LastManBeaten => "LAST MAN BEATEN",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of applying one action result to an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackResolution {
    /// Phase the attacker moves to.
    pub next_phase: Phase,
    /// Commentary event for this transition.
    pub event: EventTag,
    /// Goals added to the attacker's tally.
    pub score_delta: u32,
}

impl AttackResolution {
    const fn reset(event: EventTag, score_delta: u32) -> Self {
        Self {
            next_phase: Phase::INITIAL,
            event,
            score_delta,
        }
    }

    /// Returns `true` when this resolution scored.
    #[must_use]
    pub const fn is_goal(&self) -> bool {
        self.score_delta > 0
    }
}

/// Successful pass transitions: `(from, kind, to, event)`.
const ADVANCES: [(u8, ActionKind, u8, EventTag); 6] = [
    (1, ActionKind::GroundPass, 2, EventTag::MidfieldBuildUp),
    (1, ActionKind::ThroughPass, 3, EventTag::PiercingBall),
    (1, ActionKind::LobPass, 4, EventTag::DirectLob),
    (2, ActionKind::ThroughPass, 3, EventTag::MovementOffTheBall),
    (2, ActionKind::LobPass, 4, EventTag::OverTheTop),
    (3, ActionKind::LobPass, 4, EventTag::LastManBeaten),
];

/// Phases from which a shot may be attempted.
const SHOOTING_PHASES: [u8; 3] = [2, 3, 4];

/// Resolves an attempted action.
///
/// # Errors
///
/// Returns [`AttackError::InvalidTransition`] when `kind` succeeded in a phase
/// where it is never offered. Failures are never rejected.
pub fn resolve(
    current: Phase,
    kind: ActionKind,
    outcome: ChallengeOutcome,
) -> Result<AttackResolution, AttackError> {
    if !outcome.is_success() {
        return Ok(AttackResolution::reset(EventTag::PossessionLost, 0));
    }

    if kind.is_scoring() {
        if SHOOTING_PHASES.contains(&current.get()) {
            return Ok(AttackResolution::reset(EventTag::GoalScored, 1));
        }
        return Err(AttackError::InvalidTransition {
            phase: current,
            kind,
        });
    }

    ADVANCES
        .iter()
        .find(|(from, k, _, _)| *from == current.get() && *k == kind)
        .and_then(|&(_, _, to, event)| {
            Phase::new(to).map(|next_phase| AttackResolution {
                next_phase,
                event,
                score_delta: 0,
            })
        })
        .ok_or(AttackError::InvalidTransition {
            phase: current,
            kind,
        })
}
