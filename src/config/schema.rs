//! Configuration schema.
//!
//! Every field is defaulted, so an absent section means "use the default"
//! and a file containing only `match_duration_secs: 60` is complete.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::challenge::DEFAULT_CHALLENGES_PER_ACTION;
use crate::challenge::banana::DEFAULT_BANANA_URL;
use crate::commentary::gemini::DEFAULT_MODEL;
use crate::game::{ActionCatalog, TierBudgets};

/// Default match length in seconds.
pub const DEFAULT_MATCH_DURATION_SECS: u32 = 180;

/// Top-level match configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// Match clock length in seconds.
    pub match_duration_secs: u32,
    /// Challenge items per action.
    pub challenges_per_action: usize,
    /// Time budget per difficulty tier.
    pub time_budgets: TierBudgets,
    /// External provider settings.
    pub providers: ProviderSettings,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_duration_secs: DEFAULT_MATCH_DURATION_SECS,
            challenges_per_action: DEFAULT_CHALLENGES_PER_ACTION,
            time_budgets: TierBudgets::default(),
            providers: ProviderSettings::default(),
        }
    }
}

impl MatchConfig {
    /// Catalog built from the configured budgets.
    #[must_use]
    pub const fn catalog(&self) -> ActionCatalog {
        ActionCatalog::new(self.time_budgets)
    }
}

/// Challenge and commentary provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSettings {
    /// Puzzle endpoint.
    pub challenge_url: String,
    /// Per-request timeout for puzzle fetches, in milliseconds.
    pub request_timeout_ms: u64,
    /// Timeout for commentary requests, in milliseconds.
    pub commentary_timeout_ms: u64,
    /// Commentary model name.
    pub commentary_model: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            challenge_url: DEFAULT_BANANA_URL.to_owned(),
            request_timeout_ms: 5000,
            commentary_timeout_ms: 5000,
            commentary_model: DEFAULT_MODEL.to_owned(),
        }
    }
}

impl ProviderSettings {
    /// Puzzle request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Commentary request timeout.
    #[must_use]
    pub const fn commentary_timeout(&self) -> Duration {
        Duration::from_millis(self.commentary_timeout_ms)
    }
}
