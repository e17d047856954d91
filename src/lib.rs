//! `attackline` - timed, turn-based football attack game
//!
//! Players advance an attack through four phases by solving short skill
//! challenges against a per-action time budget, score by shooting, and
//! race a shared match clock. Two sessions keep their views in step over a
//! best-effort peer transport.

pub mod challenge;
pub mod cli;
pub mod commentary;
pub mod config;
pub mod error;
pub mod game;
pub mod observability;
pub mod session;
pub mod transport;
