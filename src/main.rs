//! `attackline` command-line entry point.

use std::sync::atomic::{AtomicI32, Ordering};

use clap::Parser;
use tokio_util::sync::CancellationToken;

use attackline::cli::args::Cli;
use attackline::cli::commands;
use attackline::error::ExitCode;
use attackline::observability::init_logging;

/// Exit code used when the match ends because of a signal.
static SIGNAL_EXIT: AtomicI32 = AtomicI32::new(ExitCode::INTERRUPTED);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format.into(), cli.verbose, cli.color);
    }

    let cancel = CancellationToken::new();
    let signal = tokio::spawn(watch_signals(cancel.clone()));

    let result = commands::dispatch(cli, cancel.clone()).await;
    signal.abort();

    match result {
        Ok(()) if cancel.is_cancelled() => std::process::exit(SIGNAL_EXIT.load(Ordering::SeqCst)),
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// First Ctrl-C or SIGTERM cancels the match; a second one exits at once.
async fn watch_signals(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
            return;
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => SIGNAL_EXIT.store(ExitCode::TERMINATED, Ordering::SeqCst),
        }

        eprintln!("\nShutting down... (press Ctrl+C again to force)");
        cancel.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        eprintln!("\nShutting down... (press Ctrl+C again to force)");
        cancel.cancel();
        let _ = tokio::signal::ctrl_c().await;
        std::process::exit(ExitCode::INTERRUPTED);
    }
}
