//! Action catalog.
//!
//! Static mapping from `(ActionKind, DifficultyTier)` to an [`ActionConfig`]
//! carrying the tier's time budget. Risk labels and the special flag are
//! attached later by the option selector.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The kinds of action an attacker can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Safe pass along the ground.
    GroundPass,
    /// Pass played into space between defenders.
    ThroughPass,
    /// Lofted ball over the defence.
    LobPass,
    /// Attempt on goal; the only scoring action.
    Shoot,
}

impl ActionKind {
    /// Every action kind, in catalog order.
    pub const ALL: [Self; 4] = [Self::GroundPass, Self::ThroughPass, Self::LobPass, Self::Shoot];

    /// Returns `true` for the scoring action.
    #[must_use]
    pub const fn is_scoring(self) -> bool {
        matches!(self, Self::Shoot)
    }

    /// Snake-case name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GroundPass => "ground_pass",
            Self::ThroughPass => "through_pass",
            Self::LobPass => "lob_pass",
            Self::Shoot => "shoot",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GroundPass => "Ground Pass",
            Self::ThroughPass => "Through Pass",
            Self::LobPass => "Lob Pass",
            Self::Shoot => "Shoot",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Difficulty tier of an action. Ordered `Easy < Medium < Hard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    /// Longest time budget.
    Easy,
    /// Middle time budget.
    Medium,
    /// Shortest time budget.
    Hard,
}

impl DifficultyTier {
    /// Every tier, easiest first.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Time budget per difficulty tier, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierBudgets {
    /// Budget for [`DifficultyTier::Easy`].
    pub easy: u64,
    /// Budget for [`DifficultyTier::Medium`].
    pub medium: u64,
    /// Budget for [`DifficultyTier::Hard`].
    pub hard: u64,
}

impl Default for TierBudgets {
    fn default() -> Self {
        Self {
            easy: 30,
            medium: 20,
            hard: 10,
        }
    }
}

impl TierBudgets {
    /// Budget in seconds for `tier`.
    #[must_use]
    pub const fn seconds(&self, tier: DifficultyTier) -> u64 {
        match tier {
            DifficultyTier::Easy => self.easy,
            DifficultyTier::Medium => self.medium,
            DifficultyTier::Hard => self.hard,
        }
    }
}

/// An action as presented to the player.
///
/// Immutable once built: fields are only reachable through accessors, and the
/// risk label and special flag are attached by the option selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActionConfig {
    kind: ActionKind,
    tier: DifficultyTier,
    #[serde(rename = "timeLimit", serialize_with = "serialize_secs")]
    time_budget: Duration,
    risk: Option<&'static str>,
    #[serde(rename = "isSpecial")]
    special: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl ActionConfig {
    /// Action kind.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Difficulty tier.
    #[must_use]
    pub const fn tier(&self) -> DifficultyTier {
        self.tier
    }

    /// Time allowed to finish the whole challenge sequence.
    #[must_use]
    pub const fn time_budget(&self) -> Duration {
        self.time_budget
    }

    /// Risk label shown next to the action, if any.
    #[must_use]
    pub const fn risk(&self) -> Option<&'static str> {
        self.risk
    }

    /// Whether this is a scoring attempt highlighted in the UI.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.special
    }

    pub(crate) const fn labelled(self, risk: &'static str, special: bool) -> Self {
        Self {
            risk: Some(risk),
            special,
            ..self
        }
    }
}

impl fmt::Display for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.tier)
    }
}

/// Lookup table from `(kind, tier)` to a bare [`ActionConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionCatalog {
    budgets: TierBudgets,
}

impl ActionCatalog {
    /// Catalog with the given tier budgets.
    #[must_use]
    pub const fn new(budgets: TierBudgets) -> Self {
        Self { budgets }
    }

    /// Tier budgets backing this catalog.
    #[must_use]
    pub const fn budgets(&self) -> TierBudgets {
        self.budgets
    }

    /// Returns the unlabelled configuration for `kind` at `tier`.
    #[must_use]
    pub const fn get(&self, kind: ActionKind, tier: DifficultyTier) -> ActionConfig {
        ActionConfig {
            kind,
            tier,
            time_budget: Duration::from_secs(self.budgets.seconds(tier)),
            risk: None,
            special: false,
        }
    }
}
