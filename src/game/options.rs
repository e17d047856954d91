//! Option selector.
//!
//! One table decides which actions are on offer in each attack phase.
//! Deeper phases offer fewer, higher-value options, and the shot gets
//! easier the further the build-up has progressed.

use super::catalog::{ActionCatalog, ActionConfig, ActionKind, DifficultyTier};

use ActionKind::{GroundPass, LobPass, Shoot, ThroughPass};
use DifficultyTier::{Easy, Hard, Medium};

struct OfferSpec {
    kind: ActionKind,
    tier: DifficultyTier,
    risk: &'static str,
    special: bool,
}

const fn offer(
    kind: ActionKind,
    tier: DifficultyTier,
    risk: &'static str,
    special: bool,
) -> OfferSpec {
    OfferSpec {
        kind,
        tier,
        risk,
        special,
    }
}

/// Offers for phases 1 through 4, in menu order.
const OFFER_TABLE: [&[OfferSpec]; 4] = [
    &[
        offer(GroundPass, Easy, "LOW", false),
        offer(ThroughPass, Medium, "MEDIUM", false),
        offer(LobPass, Hard, "HIGH", false),
    ],
    &[
        offer(ThroughPass, Easy, "STEADY", false),
        offer(LobPass, Medium, "BOLD", false),
        offer(Shoot, Hard, "GOAL CHANCE", true),
    ],
    &[
        offer(LobPass, Easy, "FINAL PASS", false),
        offer(Shoot, Medium, "CLOSE RANGE", true),
    ],
    &[offer(Shoot, Easy, "POINTER RANGE", true)],
];

/// Produces the selectable actions for a phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionSelector {
    catalog: ActionCatalog,
}

impl OptionSelector {
    /// Selector drawing time budgets from `catalog`.
    #[must_use]
    pub const fn new(catalog: ActionCatalog) -> Self {
        Self { catalog }
    }

    /// Returns the ordered options for `phase`.
    ///
    /// Any phase outside 1..=4 yields an empty list.
    #[must_use]
    pub fn options_for(&self, phase: u8) -> Vec<ActionConfig> {
        let Some(specs) = usize::from(phase)
            .checked_sub(1)
            .and_then(|idx| OFFER_TABLE.get(idx))
        else {
            return Vec::new();
        };

        specs
            .iter()
            .map(|spec| {
                self.catalog
                    .get(spec.kind, spec.tier)
                    .labelled(spec.risk, spec.special)
            })
            .collect()
    }

    /// Returns whether `action` is one of the options for `phase`.
    #[must_use]
    pub fn is_offered(&self, phase: u8, action: &ActionConfig) -> bool {
        self.options_for(phase).contains(action)
    }

    /// Picks an option by its 1-based menu position.
    #[must_use]
    pub fn pick(&self, phase: u8, choice: usize) -> Option<ActionConfig> {
        let idx = choice.checked_sub(1)?;
        self.options_for(phase).get(idx).copied()
    }
}
