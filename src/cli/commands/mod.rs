//! CLI command dispatch and handlers.

pub mod options;
pub mod play;
pub mod version;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::error::AttacklineError;

/// Dispatches a parsed CLI invocation.
///
/// # Errors
///
/// Returns an error if the dispatched command fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), AttacklineError> {
    match cli.command {
        Commands::Play(args) => play::run(&args, cancel).await,
        Commands::Options(args) => options::run(&args),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
