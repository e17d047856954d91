//! CLI argument definitions.
//!
//! All Clap derive structs for `attackline` command-line parsing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Timed, turn-based football attack game.
#[derive(Parser, Debug)]
#[command(name = "attackline", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "ATTACKLINE_COLOR")]
    pub color: ColorChoice,

    /// Log format.
    #[arg(long, default_value = "human", global = true, env = "ATTACKLINE_LOG_FORMAT")]
    pub log_format: LogFormatArg,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a match in the terminal.
    Play(PlayArgs),

    /// Print the actions offered in each attack phase.
    Options(OptionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Play Command
// ============================================================================

/// Arguments for `play`.
#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Display name.
    #[arg(short, long, env = "ATTACKLINE_NAME")]
    pub name: String,

    /// Start immediately without waiting for an opponent.
    #[arg(long)]
    pub solo: bool,

    /// Local UDP address for peer messages (e.g. `0.0.0.0:7400`).
    ///
    /// Without it the match is played solo.
    #[arg(long, env = "ATTACKLINE_BIND")]
    pub bind: Option<SocketAddr>,

    /// Peer address to send messages to. Repeatable.
    #[arg(long = "peer", requires = "bind")]
    pub peers: Vec<SocketAddr>,

    /// Use local puzzles and canned commentary; no network providers.
    #[arg(long)]
    pub offline: bool,

    /// Path to YAML match configuration.
    #[arg(short, long, env = "ATTACKLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the match length (e.g. `90s`, `3m`).
    #[arg(long, value_parser = humantime::parse_duration)]
    pub match_duration: Option<Duration>,

    /// Write the JSONL event stream to this file.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Serve Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, env = "ATTACKLINE_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

// ============================================================================
// Options Command
// ============================================================================

/// Arguments for `options`.
#[derive(Args, Debug)]
pub struct OptionsArgs {
    /// Only show this phase (1-4).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub phase: Option<u8>,

    /// Path to YAML match configuration (for time budgets).
    #[arg(short, long, env = "ATTACKLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Version Command
// ============================================================================

/// Arguments for `version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Shared Enums
// ============================================================================

/// Color output control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable lines.
    #[default]
    Human,
    /// Newline-delimited JSON.
    Json,
}
