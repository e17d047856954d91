//! `play`: a line-oriented terminal match.
//!
//! Reads commands from stdin, one per line. During a challenge the same
//! lines are answers; `cancel` abandons the challenge.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::challenge::{
    AnswerSource, ArithmeticProvider, Attempt, BananaApiProvider, Challenge, ChallengeDisplay,
    ChallengeProvider, ChallengeReport, ChallengeResolver,
};
use crate::cli::args::PlayArgs;
use crate::cli::commands::options::menu_line;
use crate::commentary::{CannedCommentary, CommentaryProvider, GeminiCommentary, WELCOME_LINE};
use crate::config::{ConfigLoader, MatchConfig};
use crate::error::AttacklineError;
use crate::game::{ActionConfig, MatchStatus};
use crate::observability::{EventEmitter, init_metrics};
use crate::session::{SessionCoordinator, SessionEvent, SessionUpdate};
use crate::transport::{LocalHub, PeerTransport, UdpTransport};

/// Longest accepted input line.
const MAX_LINE: usize = 1024;

/// Runs one match.
///
/// # Errors
///
/// Returns an error if configuration, transport setup, or a session
/// operation fails. Provider failures are recovered.
pub async fn run(args: &PlayArgs, cancel: CancellationToken) -> Result<(), AttacklineError> {
    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    let config = ConfigLoader::new()
        .with_match_duration(args.match_duration)
        .load(args.config.as_deref())?;

    let events = Arc::new(match &args.events {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    });

    let transport = build_transport(args).await?;
    let (challenges, commentary) = build_providers(args, &config)?;

    let session = Arc::new(
        SessionCoordinator::new(&config, transport, commentary)
            .with_events(events)
            .with_cancellation(cancel.child_token()),
    );
    let resolver = ChallengeResolver::new(challenges, config.challenges_per_action);

    let (update_tx, mut updates) = mpsc::unbounded_channel();
    let pump = session.spawn_peer_pump(update_tx);
    let (mut lines, input) = spawn_stdin_reader();

    let solo = args.solo || args.bind.is_none();
    let mut game = Game {
        session: &session,
        resolver: &resolver,
        lines: &mut lines,
        cancel: &cancel,
    };
    let result = game.play(&args.name, solo, &mut updates).await;

    session.shutdown().await;
    pump.abort();
    input.abort();

    print_final(&session);
    result
}

async fn build_transport(args: &PlayArgs) -> Result<Arc<dyn PeerTransport>, AttacklineError> {
    match args.bind {
        Some(addr) => {
            let transport = UdpTransport::bind(addr, args.peers.clone()).await?;
            info!(
                local = %transport.local_addr()?,
                peers = args.peers.len(),
                "listening for peer messages"
            );
            Ok(Arc::new(transport))
        }
        None => Ok(Arc::new(LocalHub::default().connect())),
    }
}

type Providers = (Arc<dyn ChallengeProvider>, Arc<dyn CommentaryProvider>);

fn build_providers(args: &PlayArgs, config: &MatchConfig) -> Result<Providers, AttacklineError> {
    if args.offline {
        return Ok((Arc::new(ArithmeticProvider), Arc::new(CannedCommentary)));
    }

    let settings = &config.providers;
    let challenges = BananaApiProvider::new(&settings.challenge_url, settings.request_timeout())?;
    let commentary: Arc<dyn CommentaryProvider> =
        match GeminiCommentary::from_env(&settings.commentary_model, settings.commentary_timeout())
        {
            Ok(gemini) => Arc::new(gemini),
            Err(e) => {
                info!(reason = %e, "using canned commentary");
                Arc::new(CannedCommentary)
            }
        };
    Ok((Arc::new(challenges), commentary))
}

fn spawn_stdin_reader() -> (mpsc::UnboundedReceiver<String>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        let mut framed =
            FramedRead::new(tokio::io::stdin(), LinesCodec::new_with_max_length(MAX_LINE));
        while let Some(line) = framed.next().await {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!(max = MAX_LINE, "input line too long; ignored");
                }
                Err(LinesCodecError::Io(e)) => {
                    warn!(error = %e, "stdin failed");
                    break;
                }
            }
        }
    });
    (rx, handle)
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Pick(usize),
    Solo,
    Sync,
    Score,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if let Ok(n) = line.parse::<usize>() {
            return Self::Pick(n);
        }
        match line.to_ascii_lowercase().as_str() {
            "solo" | "start" => Self::Solo,
            "sync" => Self::Sync,
            "score" | "s" => Self::Score,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_owned()),
        }
    }
}

struct LineAnswers<'a>(&'a mut mpsc::UnboundedReceiver<String>);

#[async_trait::async_trait]
impl AnswerSource for LineAnswers<'_> {
    async fn next_attempt(&mut self) -> Option<Attempt> {
        let line = self.0.recv().await?;
        if line.trim().eq_ignore_ascii_case("cancel") {
            Some(Attempt::Cancel)
        } else {
            Some(Attempt::Answer(line))
        }
    }
}

struct TerminalDisplay;

impl ChallengeDisplay for TerminalDisplay {
    fn loading(&mut self, action: &ActionConfig) {
        println!("{action}: fetching puzzles...");
    }

    fn show(&mut self, index: usize, total: usize, challenge: &Challenge, time_left: Duration) {
        println!(
            "Puzzle {}/{total} ({}s left): {}",
            index + 1,
            time_left.as_secs(),
            challenge.prompt
        );
        print!("> ");
        let _ = std::io::stdout().flush();
    }

    fn wrong(&mut self, _index: usize) {
        println!("Not quite. Try again, or 'cancel'.");
        print!("> ");
        let _ = std::io::stdout().flush();
    }
}

// ============================================================================
// Game loop
// ============================================================================

struct Game<'a> {
    session: &'a Arc<SessionCoordinator>,
    resolver: &'a ChallengeResolver,
    lines: &'a mut mpsc::UnboundedReceiver<String>,
    cancel: &'a CancellationToken,
}

impl Game<'_> {
    async fn play(
        &mut self,
        name: &str,
        solo: bool,
        updates: &mut mpsc::UnboundedReceiver<SessionUpdate>,
    ) -> Result<(), AttacklineError> {
        println!("{WELCOME_LINE}");
        self.session
            .handle(SessionEvent::Join {
                name: name.to_owned(),
            })
            .await?;
        if solo {
            self.session.handle(SessionEvent::StartSolo).await?;
        } else {
            println!("Waiting for an opponent... (type 'solo' to start alone)");
        }

        let mut clock = self.session.shared().subscribe();
        let mut last_status = None;
        loop {
            let status = clock.borrow_and_update().status;
            if last_status != Some(status) {
                last_status = Some(status);
                match status {
                    MatchStatus::Waiting => {}
                    MatchStatus::Playing => {
                        println!("Kick-off!");
                        self.print_menu();
                    }
                    MatchStatus::Finished => return Ok(()),
                }
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    println!("Match abandoned.");
                    return Ok(());
                }
                changed = clock.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
                Some(update) = updates.recv() => self.print_update(&update),
                line = self.lines.recv() => {
                    let Some(line) = line else {
                        debug!("input closed");
                        return Ok(());
                    };
                    if !self.command(Command::parse(&line)).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs one command. Returns `false` to leave the match.
    async fn command(&mut self, command: Command) -> Result<bool, AttacklineError> {
        match command {
            Command::Pick(choice) => self.attempt(choice).await?,
            Command::Solo => {
                if self.session.handle(SessionEvent::StartSolo).await? == SessionUpdate::Unchanged
                {
                    println!("The match is already under way.");
                }
            }
            Command::Sync => {
                self.session.handle(SessionEvent::ResyncRequested).await?;
                println!("State sent to peers.");
            }
            Command::Score => self.print_score(),
            Command::Help => {
                println!("Commands: <number> pick an action, sync, score, solo, quit");
            }
            Command::Quit => return Ok(false),
            Command::Empty => {}
            Command::Unknown(text) => println!("Unknown command '{text}'. Type 'help'."),
        }
        Ok(true)
    }

    async fn attempt(&mut self, choice: usize) -> Result<(), AttacklineError> {
        let Some(player) = self.session.local_player() else {
            return Ok(());
        };
        let Some(action) = self.session.selector().pick(player.phase.get(), choice) else {
            println!("No option {choice} in {}.", player.phase.label());
            return Ok(());
        };
        if let Err(e) = self.session.begin_action(&action) {
            println!("{e}");
            return Ok(());
        }

        let mut answers = LineAnswers(&mut *self.lines);
        let mut display = TerminalDisplay;
        let report = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            report = self.resolver.run(
                &action,
                &mut answers,
                self.session.shared().subscribe(),
                &mut display,
            ) => report,
        };
        print_report(&report);

        match self
            .session
            .handle(SessionEvent::ActionResolved {
                action,
                outcome: report.outcome,
            })
            .await?
        {
            SessionUpdate::Resolved(resolved) => {
                println!("{}", resolved.commentary);
                if resolved.resolution.is_goal() {
                    println!("GOAL! You have {}.", resolved.goals);
                }
                self.print_menu();
            }
            SessionUpdate::Discarded => println!("Full time! That one didn't count."),
            _ => {}
        }
        Ok(())
    }

    fn print_menu(&self) {
        let Some(player) = self.session.local_player() else {
            return;
        };
        let clock = self.session.shared().clock();
        println!(
            "\n{} | {}s left | Goals: {}",
            player.phase.label(),
            clock.seconds_remaining,
            player.goals
        );
        let options = self.session.options();
        for (i, action) in options.iter().enumerate() {
            println!("{}", menu_line(i + 1, action));
        }
        println!("Choose 1-{}, or type 'help'.", options.len());
    }

    fn print_update(&self, update: &SessionUpdate) {
        match update {
            SessionUpdate::PeerJoined { name, .. } => println!("{name} joined the match."),
            SessionUpdate::ScoreUpdated { player_id, goals } => {
                let name = self
                    .session
                    .shared()
                    .read(|m| m.players.get(player_id).map(|p| p.name.clone()))
                    .unwrap_or_else(|| player_id.to_string());
                println!("{name} scored! They have {goals}.");
            }
            _ => {}
        }
    }

    fn print_score(&self) {
        let clock = self.session.shared().clock();
        println!("{} | {}s left", clock.status, clock.seconds_remaining);
        for row in self.session.final_scores() {
            println!("  {:<16} {}", row.name, row.goals);
        }
    }
}

fn print_report(report: &ChallengeReport) {
    println!(
        "{} ({}, {} solved in {:.1}s)",
        if report.outcome.is_success() {
            "Success!"
        } else {
            "Failed."
        },
        report.reason.as_str().replace('_', " "),
        report.solved,
        report.elapsed.as_secs_f64()
    );
}

fn print_final(session: &SessionCoordinator) {
    let table = session.final_scores();
    println!("\nFULL TIME");
    for (i, row) in table.iter().enumerate() {
        println!("{:>2}. {:<16} {}", i + 1, row.name, row.goals);
    }
    match table.as_slice() {
        [first, second, ..] if first.goals == second.goals => println!("It's a draw!"),
        [first, _, ..] => println!("{} wins!", first.name),
        _ => {}
    }
}
