//! Match commentary.
//!
//! Commentary is flavour: a provider turns an [`EventTag`] and the scorer's
//! goal count into a line of text. Any failure is swallowed by
//! [`narrate_or_default`] and replaced by a stock exclamation.

pub mod gemini;

pub use gemini::GeminiCommentary;

use tracing::debug;

use crate::error::ProviderError;
use crate::game::EventTag;
use crate::observability::metrics;

/// Line shown before the first action.
pub const WELCOME_LINE: &str = "Welcome to Banana Football! Let's play!";

/// Substitute when a provider fails.
pub const DEFAULT_EXCLAMATION: &str = "Goal! Unbelievable scenes!";

/// Substitute when a provider answers with nothing.
pub const EMPTY_REPLY: &str = "What a play!";

/// Source of commentary lines.
#[async_trait::async_trait]
pub trait CommentaryProvider: Send + Sync {
    /// Produces a line for `event` with the scorer's current `score`.
    async fn narrate(&self, event: EventTag, score: u32) -> Result<String, ProviderError>;

    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Calls `provider`, never failing.
pub async fn narrate_or_default(
    provider: &dyn CommentaryProvider,
    event: EventTag,
    score: u32,
) -> String {
    match provider.narrate(event, score).await {
        Ok(text) if text.trim().is_empty() => EMPTY_REPLY.to_owned(),
        Ok(text) => text.trim().to_owned(),
        Err(e) => {
            debug!(provider = provider.name(), error = %e, "commentary unavailable");
            metrics::record_provider_fallback(provider.name());
            DEFAULT_EXCLAMATION.to_owned()
        }
    }
}

/// Fixed line per event.
#[must_use]
pub const fn canned_line(event: EventTag) -> &'static str {
    match event {
        EventTag::PossessionLost => "Attack broke down! Lost possession.",
        EventTag::GoalScored => "GOOOAL! The net is bulging!",
        EventTag::MidfieldBuildUp => "Safe pass into midfield. Building up...",
        EventTag::PiercingBall => "A piercing ball through the middle! We're in business.",
        EventTag::DirectLob => "WHAT A BALL! Direct to the target man!",
        EventTag::MovementOffTheBall => "Great movement off the ball. Advancing!",
        EventTag::OverTheTop => "Over the top! The defense is scrambled.",
        EventTag::LastManBeaten => "Last man beaten! Get ready to finish!",
    }
}

/// Offline provider returning [`canned_line`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedCommentary;

#[async_trait::async_trait]
impl CommentaryProvider for CannedCommentary {
    async fn narrate(&self, event: EventTag, score: u32) -> Result<String, ProviderError> {
        let line = canned_line(event);
        if event == EventTag::GoalScored {
            Ok(format!("{line} That's {score} now!"))
        } else {
            Ok(line.to_owned())
        }
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}
