//! Structured event stream.
//!
//! Discrete, typed match events serialized as newline-delimited JSON, each
//! with a monotonically increasing sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::game::{ActionKind, ChallengeOutcome, DifficultyTier, MatchState, Phase, PlayerId};

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a match.
///
/// Serialized with a `"type"` tag so consumers can dispatch on the kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The match clock started.
    MatchStarted {
        /// When play began.
        timestamp: DateTime<Utc>,
        /// Match identifier.
        match_id: String,
        /// Number of participants at kickoff.
        players: usize,
        /// Clock value at kickoff.
        seconds_remaining: u32,
    },

    /// The local player's action was resolved and committed.
    ActionResolved {
        /// When the outcome was committed.
        timestamp: DateTime<Utc>,
        /// Acting player.
        player_id: PlayerId,
        /// Action attempted.
        kind: ActionKind,
        /// Difficulty of the attempt.
        tier: DifficultyTier,
        /// Challenge outcome.
        outcome: ChallengeOutcome,
        /// Phase before the action.
        from_phase: Phase,
        /// Phase after the action.
        to_phase: Phase,
    },

    /// The local player scored.
    GoalScored {
        /// When the goal was committed.
        timestamp: DateTime<Utc>,
        /// Scorer.
        player_id: PlayerId,
        /// Scorer's new goal count.
        goals: u32,
    },

    /// A peer message was discarded.
    PeerMessageDropped {
        /// When the message was dropped.
        timestamp: DateTime<Utc>,
        /// Wire type, if the envelope parsed.
        message_type: Option<String>,
        /// Claimed sender, if known.
        sender_id: Option<PlayerId>,
        /// Drop reason (e.g. `"unknown_sender"`).
        reason: String,
    },

    /// The match clock reached zero.
    MatchFinished {
        /// When the final tick landed.
        timestamp: DateTime<Utc>,
        /// Final standings, best first.
        standings: Vec<Standing>,
    },
}

/// One row of the final table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// Player id.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Goals scored.
    pub goals: u32,
}

impl Standing {
    /// Rows for `state`, ordered by [`MatchState::standings`].
    #[must_use]
    pub fn table(state: &MatchState) -> Vec<Self> {
        state
            .standings()
            .into_iter()
            .map(|p| Self {
                player_id: p.id.clone(),
                name: p.name.clone(),
                goals: p.goals,
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization or I/O failures are dropped; the event stream never
/// interrupts a match.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Emitter writing to `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Emitter writing to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Emitter that discards everything.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Emitter writing to a file at `path`, truncating it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Writes `event` as one JSON line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::noop()
    }
}
