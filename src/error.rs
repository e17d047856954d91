//! Error types for `attackline`
//!
//! A small hierarchy: domain errors per layer, aggregated into
//! [`AttacklineError`] which maps onto process exit codes.

use std::path::PathBuf;
use thiserror::Error;

use crate::game::{ActionKind, Phase};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `attackline` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Peer transport error (bind failed, socket closed)
    pub const TRANSPORT_ERROR: i32 = 4;

    /// Game logic error (invalid transition, action not offered)
    pub const GAME_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `attackline` operations.
#[derive(Debug, Error)]
pub enum AttacklineError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Peer transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Attack state machine rejected its input
    #[error(transparent)]
    Attack(#[from] AttackError),

    /// Session coordinator rejected an operation
    #[error(transparent)]
    Session(#[from] SessionError),

    /// External provider failure that could not be recovered
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),
}

impl AttacklineError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Transport(_) => ExitCode::TRANSPORT_ERROR,
            Self::Attack(_) | Self::Session(_) => ExitCode::GAME_ERROR,
            Self::Provider(_) => ExitCode::ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message from the parser
        message: String,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Peer transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error during transport operations
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The channel was closed and no further messages will arrive
    #[error("transport closed: {0}")]
    Closed(String),

    /// A message arrived that does not fit the envelope or its payload schema
    #[error("malformed message: {0}")]
    MalformedMessage(String),
}

// ============================================================================
// Game Errors
// ============================================================================

/// Attack state machine errors.
///
/// These indicate the option table and the transition table disagree,
/// which is a programming error rather than a gameplay outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttackError {
    /// The (phase, kind) pair has no successful transition
    #[error("invalid attack transition: {kind} succeeded at phase {phase}")]
    InvalidTransition {
        /// Phase the attacker was in
        phase: Phase,
        /// Action that was reported as successful
        kind: ActionKind,
    },
}

/// Session coordinator errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The local player has not joined the match yet
    #[error("local player has not joined the match")]
    NotJoined,

    /// The local player already joined
    #[error("local player already joined as '{0}'")]
    AlreadyJoined(String),

    /// The operation needs a running match
    #[error("match is not in progress (status: {0})")]
    NotPlaying(String),

    /// The chosen action is not on offer in the player's phase
    #[error("{action} is not offered at phase {phase}")]
    ActionNotOffered {
        /// Display form of the rejected action
        action: String,
        /// Phase the player is in
        phase: Phase,
    },

    /// Display name is empty after trimming
    #[error("player name must not be empty")]
    EmptyName,

    /// The state machine rejected the transition
    #[error(transparent)]
    Attack(#[from] AttackError),
}

// ============================================================================
// Provider Errors
// ============================================================================

/// Errors from external content providers (challenges, commentary).
///
/// Callers recover from all of these with substitute values.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded its timeout
    #[error("provider request timed out")]
    Timeout,

    /// Non-2xx HTTP status
    #[error("provider returned HTTP {0}")]
    HttpStatus(u16),

    /// The response body could not be interpreted
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The provider returned a different number of items than requested
    #[error("expected {expected} challenges, got {actual}")]
    WrongCount {
        /// Number of items requested
        expected: usize,
        /// Number of items returned
        actual: usize,
    },

    /// The provider needs an API key that is not configured
    #[error("missing API key (set {0})")]
    MissingApiKey(&'static str),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_per_variant() {
        let config = AttacklineError::Config(ConfigError::MissingFile {
            path: PathBuf::from("match.yaml"),
        });
        assert_eq!(config.exit_code(), ExitCode::CONFIG_ERROR);

        let transport = AttacklineError::Transport(TransportError::Closed("hub".into()));
        assert_eq!(transport.exit_code(), ExitCode::TRANSPORT_ERROR);

        let attack = AttacklineError::Attack(AttackError::InvalidTransition {
            phase: Phase::FINAL,
            kind: ActionKind::GroundPass,
        });
        assert_eq!(attack.exit_code(), ExitCode::GAME_ERROR);

        let usage = AttacklineError::Usage("bad flag".into());
        assert_eq!(usage.exit_code(), ExitCode::USAGE_ERROR);
    }

    #[test]
    fn invalid_transition_message_names_phase_and_kind() {
        let err = AttackError::InvalidTransition {
            phase: Phase::FINAL,
            kind: ActionKind::LobPass,
        };
        assert_eq!(
            err.to_string(),
            "invalid attack transition: Lob Pass succeeded at phase 4"
        );
    }

    #[test]
    fn session_error_wraps_attack_error() {
        let err: SessionError = AttackError::InvalidTransition {
            phase: Phase::INITIAL,
            kind: ActionKind::Shoot,
        }
        .into();
        assert!(matches!(err, SessionError::Attack(_)));
    }
}
