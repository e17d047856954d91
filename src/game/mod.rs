//! Game core
//!
//! The attack progression rules and the match they run in.
//!
//! # Architecture
//!
//! - [`ActionCatalog`]: `(kind, tier)` to time budget
//! - [`OptionSelector`]: which actions each phase offers
//! - [`attack::resolve`]: phase transitions, goals, and commentary events
//! - [`MatchState`]: players, status, and remaining time
//! - [`SharedMatch`]: lock + watch channel shared by all tasks
//! - [`MatchClock`]: per-second countdown task

pub mod attack;
pub mod catalog;
pub mod clock;
pub mod options;
pub mod shared;
pub mod state;

pub use attack::{AttackResolution, ChallengeOutcome, EventTag, Phase, resolve};
pub use catalog::{ActionCatalog, ActionConfig, ActionKind, DifficultyTier, TierBudgets};
pub use clock::MatchClock;
pub use options::OptionSelector;
pub use shared::{ClockSnapshot, SharedMatch};
pub use state::{JoinOutcome, MatchId, MatchState, MatchStatus, PlayerId, PlayerState, TickOutcome};
