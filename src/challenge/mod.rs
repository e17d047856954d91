//! Skill challenges.
//!
//! A challenge is a prompt with a numeric solution. Providers fetch them
//! from somewhere (an HTTP puzzle API, a local generator); the resolver runs
//! a fixed-size sequence of them against the player's answers.
//!
//! Provider failures never reach the player: [`fetch_or_fallback`]
//! substitutes placeholder items so play can continue.

pub mod arithmetic;
pub mod banana;
pub mod resolver;

pub use arithmetic::ArithmeticProvider;
pub use banana::BananaApiProvider;
pub use resolver::{
    AnswerSource, Attempt, ChallengeDisplay, ChallengeReport, ChallengeResolver, NoDisplay,
    ResolutionReason,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ProviderError;
use crate::observability::metrics;

/// Default number of challenges per action.
pub const DEFAULT_CHALLENGES_PER_ACTION: usize = 3;

/// Prompt used when the provider is unavailable.
pub const FALLBACK_PROMPT: &str = "Puzzle unavailable. Type 5 to continue.";

/// Solution of every fallback item.
pub const FALLBACK_SOLUTION: i64 = 5;

/// One challenge item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// What to show the player (text or an image URL).
    pub prompt: String,
    /// Expected numeric answer.
    pub solution: i64,
}

impl Challenge {
    /// Creates a challenge.
    #[must_use]
    pub fn new(prompt: impl Into<String>, solution: i64) -> Self {
        Self {
            prompt: prompt.into(),
            solution,
        }
    }

    /// Checks a raw answer. Non-numeric input is simply wrong.
    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        answer.trim().parse::<i64>() == Ok(self.solution)
    }
}

/// Source of challenge items.
#[async_trait::async_trait]
pub trait ChallengeProvider: Send + Sync {
    /// Fetches exactly `count` challenges.
    async fn fetch_challenges(&self, count: usize) -> Result<Vec<Challenge>, ProviderError>;

    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Placeholder items used when the provider fails.
#[must_use]
pub fn fallback_challenges(count: usize) -> Vec<Challenge> {
    (0..count)
        .map(|_| Challenge::new(FALLBACK_PROMPT, FALLBACK_SOLUTION))
        .collect()
}

/// Fetches `count` challenges, falling back to placeholders on any failure
/// or if the provider returns the wrong number of items.
pub async fn fetch_or_fallback(provider: &dyn ChallengeProvider, count: usize) -> Vec<Challenge> {
    let result = provider.fetch_challenges(count).await.and_then(|items| {
        if items.len() == count {
            Ok(items)
        } else {
            Err(ProviderError::WrongCount {
                expected: count,
                actual: items.len(),
            })
        }
    });

    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "challenge provider failed; using fallback puzzles");
            metrics::record_provider_fallback(provider.name());
            fallback_challenges(count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<usize, ()>);

    #[async_trait::async_trait]
    impl ChallengeProvider for Fixed {
        async fn fetch_challenges(&self, _count: usize) -> Result<Vec<Challenge>, ProviderError> {
            match self.0 {
                Ok(n) => Ok((0..n)
                    .map(|i| Challenge::new(format!("{i} + 1"), i64::try_from(i).unwrap() + 1))
                    .collect()),
                Err(()) => Err(ProviderError::Network("unreachable".into())),
            }
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn accepts_trimmed_numbers_only() {
        let c = Challenge::new("2 + 2", 4);
        assert!(c.accepts("4"));
        assert!(c.accepts("  4\n"));
        assert!(!c.accepts("5"));
        assert!(!c.accepts("four"));
        assert!(!c.accepts(""));
    }

    #[tokio::test]
    async fn provider_items_pass_through() {
        let items = fetch_or_fallback(&Fixed(Ok(3)), 3).await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].solution, 3);
    }

    #[tokio::test]
    async fn provider_error_falls_back() {
        let items = fetch_or_fallback(&Fixed(Err(())), 3).await;
        assert_eq!(items, fallback_challenges(3));
        assert!(items.iter().all(|c| c.accepts("5")));
    }

    #[tokio::test]
    async fn wrong_count_falls_back() {
        let items = fetch_or_fallback(&Fixed(Ok(2)), 3).await;
        assert_eq!(items, fallback_challenges(3));
    }
}
