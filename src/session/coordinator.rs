//! The session coordinator.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commentary::{CommentaryProvider, narrate_or_default};
use crate::config::MatchConfig;
use crate::error::{SessionError, TransportError};
use crate::game::{
    ActionConfig, ChallengeOutcome, JoinOutcome, MatchClock, MatchId, MatchState, MatchStatus,
    OptionSelector, PlayerId, PlayerState, SharedMatch, resolve,
};
use crate::observability::events::{Event, EventEmitter, Standing};
use crate::observability::metrics;
use crate::transport::{PeerEvent, PeerMessage, PeerTransport};

use super::merge::{SyncMerge, merge_sync};
use super::{ActionReport, SessionEvent, SessionUpdate};

/// Owns the local view of one match.
///
/// All methods take `&self`; wrap the coordinator in an `Arc` to share it
/// between the peer pump and the input loop.
pub struct SessionCoordinator {
    shared: SharedMatch,
    local: OnceLock<PlayerId>,
    selector: OptionSelector,
    duration_secs: u32,
    transport: Arc<dyn PeerTransport>,
    commentary: Arc<dyn CommentaryProvider>,
    events: Arc<EventEmitter>,
    clock: Mutex<Option<MatchClock>>,
    cancel: CancellationToken,
}

impl SessionCoordinator {
    /// Coordinator for a fresh match configured by `config`.
    #[must_use]
    pub fn new(
        config: &MatchConfig,
        transport: Arc<dyn PeerTransport>,
        commentary: Arc<dyn CommentaryProvider>,
    ) -> Self {
        Self {
            shared: SharedMatch::new(MatchState::new(
                MatchId::default(),
                config.match_duration_secs,
            )),
            local: OnceLock::new(),
            selector: OptionSelector::new(config.catalog()),
            duration_secs: config.match_duration_secs,
            transport,
            commentary,
            events: Arc::new(EventEmitter::noop()),
            clock: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Sends structured events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    /// Ties background tasks to `cancel`.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle to the match state.
    #[must_use]
    pub const fn shared(&self) -> &SharedMatch {
        &self.shared
    }

    /// Option selector in use.
    #[must_use]
    pub const fn selector(&self) -> &OptionSelector {
        &self.selector
    }

    /// Local player id, once joined.
    #[must_use]
    pub fn local_id(&self) -> Option<&PlayerId> {
        self.local.get()
    }

    /// Snapshot of the local player.
    #[must_use]
    pub fn local_player(&self) -> Option<PlayerState> {
        let id = self.local.get()?;
        self.shared.read(|m| m.players.get(id).cloned())
    }

    /// Actions currently open to the local player.
    #[must_use]
    pub fn options(&self) -> Vec<ActionConfig> {
        self.local_player()
            .map(|p| self.selector.options_for(p.phase.get()))
            .unwrap_or_default()
    }

    /// Final table, best first.
    #[must_use]
    pub fn final_scores(&self) -> Vec<Standing> {
        self.shared.read(Standing::table)
    }

    /// Applies one event.
    ///
    /// Transport failures are logged, never returned; a missing peer does
    /// not stop the local game.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] for invalid local input: joining twice,
    /// acting before joining, or committing an action that was not offered.
    pub async fn handle(&self, event: SessionEvent) -> Result<SessionUpdate, SessionError> {
        match event {
            SessionEvent::Join { name } => self.join(&name).await,
            SessionEvent::StartSolo => self.start_solo().await,
            SessionEvent::Peer(message) => Ok(self.on_peer(message).await),
            SessionEvent::ActionResolved { action, outcome } => {
                self.commit(action, outcome).await
            }
            SessionEvent::ResyncRequested => self.resync().await,
        }
    }

    /// Checks that `action` may be attempted right now.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotJoined`, `SessionError::NotPlaying`, or
    /// `SessionError::ActionNotOffered`.
    pub fn begin_action(&self, action: &ActionConfig) -> Result<(), SessionError> {
        let local = self.local.get().ok_or(SessionError::NotJoined)?;
        self.shared.read(|m| {
            if !m.is_playing() {
                return Err(SessionError::NotPlaying(m.status.to_string()));
            }
            let player = m.players.get(local).ok_or(SessionError::NotJoined)?;
            if self.selector.is_offered(player.phase.get(), action) {
                Ok(())
            } else {
                Err(SessionError::ActionNotOffered {
                    action: action.to_string(),
                    phase: player.phase,
                })
            }
        })
    }

    /// Spawns a task feeding inbound peer messages into [`Self::handle`].
    ///
    /// Each resulting update is forwarded to `updates`. The task ends when
    /// the transport closes or the coordinator is shut down.
    pub fn spawn_peer_pump(
        self: &Arc<Self>,
        updates: mpsc::UnboundedSender<SessionUpdate>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    () = cancel.cancelled() => break,
                    received = this.transport.receive() => received,
                };
                match received {
                    Ok(Some(message)) => {
                        let update = this.on_peer(message).await;
                        if updates.send(update).is_err() {
                            debug!("update receiver gone; peer pump continues");
                        }
                    }
                    Ok(None) => {
                        debug!("peer transport closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "peer transport failed; no further peer updates");
                        break;
                    }
                }
            }
        })
    }

    /// Stops the clock and closes the transport.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let clock = self
            .clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(clock) = clock {
            clock.shutdown().await;
        }
        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "transport close failed");
        }
    }

    // ------------------------------------------------------------------
    // Local events
    // ------------------------------------------------------------------

    async fn join(&self, name: &str) -> Result<SessionUpdate, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if let Some(existing) = self.local_player() {
            return Err(SessionError::AlreadyJoined(existing.name));
        }

        let player = PlayerState::new(PlayerId::generate(), name);
        let player_id = player.id.clone();
        let duration = self.duration_secs;
        let joined = self.shared.update(|m| {
            if m.add_player(player.clone()) == JoinOutcome::RejectedLate {
                return Err(SessionError::NotPlaying(m.status.to_string()));
            }
            Ok(m.players.len() >= 2 && m.start(Utc::now(), duration))
        });
        let started = joined?;
        self.local
            .set(player_id.clone())
            .map_err(|_| SessionError::AlreadyJoined(name.to_owned()))?;

        info!(player_id = %player_id, name, "joined match");
        self.publish(PeerMessage::player_join(&player)).await;
        if started {
            self.on_started().await;
        }
        Ok(SessionUpdate::Joined { player_id, started })
    }

    async fn start_solo(&self) -> Result<SessionUpdate, SessionError> {
        if self.local.get().is_none() {
            return Err(SessionError::NotJoined);
        }
        let duration = self.duration_secs;
        if self.shared.update(|m| m.start(Utc::now(), duration)) {
            info!("starting solo match");
            self.on_started().await;
            Ok(SessionUpdate::Started)
        } else {
            Ok(SessionUpdate::Unchanged)
        }
    }

    async fn commit(
        &self,
        action: ActionConfig,
        outcome: ChallengeOutcome,
    ) -> Result<SessionUpdate, SessionError> {
        let local = self.local.get().ok_or(SessionError::NotJoined)?;
        let committed = self.shared.update(|m| -> Result<Option<_>, SessionError> {
            if !m.is_playing() {
                return Ok(None);
            }
            let player = m.players.get_mut(local).ok_or(SessionError::NotJoined)?;
            let from_phase = player.phase;
            if !self.selector.is_offered(from_phase.get(), &action) {
                return Err(SessionError::ActionNotOffered {
                    action: action.to_string(),
                    phase: from_phase,
                });
            }
            let resolution = resolve(from_phase, action.kind(), outcome)?;
            player.apply(&resolution, outcome);
            Ok(Some((from_phase, resolution, player.goals)))
        })?;

        let Some((from_phase, resolution, goals)) = committed else {
            info!(action = %action, outcome = outcome.as_str(), "match over; result discarded");
            return Ok(SessionUpdate::Discarded);
        };

        info!(
            player_id = %local,
            kind = action.kind().as_str(),
            outcome = outcome.as_str(),
            from = from_phase.get(),
            to = resolution.next_phase.get(),
            "action committed"
        );
        self.events.emit(Event::ActionResolved {
            timestamp: Utc::now(),
            player_id: local.clone(),
            kind: action.kind(),
            tier: action.tier(),
            outcome,
            from_phase,
            to_phase: resolution.next_phase,
        });

        if resolution.is_goal() {
            metrics::record_goal();
            self.events.emit(Event::GoalScored {
                timestamp: Utc::now(),
                player_id: local.clone(),
                goals,
            });
            self.publish(PeerMessage::update_score(local.clone(), goals))
                .await;
        }

        let commentary =
            narrate_or_default(self.commentary.as_ref(), resolution.event, goals).await;

        Ok(SessionUpdate::Resolved(Box::new(ActionReport {
            action,
            outcome,
            from_phase,
            resolution,
            goals,
            commentary,
        })))
    }

    async fn resync(&self) -> Result<SessionUpdate, SessionError> {
        let local = self.local.get().ok_or(SessionError::NotJoined)?;
        let state = self.shared.snapshot();
        self.publish(PeerMessage::sync_state(local.clone(), &state))
            .await;
        Ok(SessionUpdate::ResyncSent)
    }

    // ------------------------------------------------------------------
    // Peer events
    // ------------------------------------------------------------------

    async fn on_peer(&self, message: PeerMessage) -> SessionUpdate {
        let local = self.local.get();
        if local == Some(&message.sender_id) {
            return self.drop_message(&message, "loopback");
        }
        metrics::record_peer_message(message.kind, "in");

        let event = match message.decode() {
            Ok(event) => event,
            Err(e) => {
                debug!(sender = %message.sender_id, error = %e, "undecodable peer message");
                return self.drop_message(&message, "malformed");
            }
        };

        let sender = message.sender_id.clone();
        match event {
            PeerEvent::PlayerJoined(player) => self.on_peer_join(&message, player).await,
            PeerEvent::ScoreUpdated { goals } => {
                let known = self.shared.update(|m| {
                    m.players
                        .get_mut(&sender)
                        .map(|player| player.raise_goals(goals))
                });
                match known {
                    None => self.drop_message(&message, "unknown_sender"),
                    Some(true) => {
                        info!(player_id = %sender, goals, "peer score updated");
                        SessionUpdate::ScoreUpdated {
                            player_id: sender,
                            goals,
                        }
                    }
                    Some(false) => SessionUpdate::Unchanged,
                }
            }
            PeerEvent::MatchStarted {
                started_at,
                seconds_remaining,
            } => {
                if seconds_remaining == 0 {
                    return self.drop_message(&message, "malformed");
                }
                if self
                    .shared
                    .update(|m| m.start(started_at, seconds_remaining))
                {
                    info!(player_id = %sender, seconds_remaining, "match started by peer");
                    self.on_started().await;
                    SessionUpdate::Started
                } else {
                    SessionUpdate::Unchanged
                }
            }
            PeerEvent::StateSynced(state) => {
                match self.shared.update(|m| merge_sync(m, *state, local)) {
                    Ok(SyncMerge {
                        started,
                        late_joins,
                    }) => {
                        for player_id in &late_joins {
                            warn!(
                                player_id = %player_id,
                                sender = %sender,
                                "ignoring late player in state sync"
                            );
                            metrics::record_peer_message_dropped("late_join");
                        }
                        debug!(player_id = %sender, started, "state synced");
                        if started {
                            self.on_started().await;
                        }
                        SessionUpdate::StateSynced { started }
                    }
                    Err(rejection) => self.drop_message(&message, rejection.reason()),
                }
            }
        }
    }

    async fn on_peer_join(&self, message: &PeerMessage, player: PlayerState) -> SessionUpdate {
        let local = self.local.get();
        let duration = self.duration_secs;
        let player_id = player.id.clone();
        let name = player.name.clone();

        // A re-announcement from someone already in a running match is a
        // duplicate, not a late join.
        let outcome = self.shared.update(|m| {
            if m.status != MatchStatus::Waiting && m.players.contains_key(&player.id) {
                return None;
            }
            let outcome = m.add_player(player);
            let started = outcome != JoinOutcome::RejectedLate
                && local.is_some_and(|id| m.players.contains_key(id))
                && m.players.len() >= 2
                && m.start(Utc::now(), duration);
            Some((outcome, started))
        });

        let Some((outcome, started)) = outcome else {
            return SessionUpdate::Unchanged;
        };
        if outcome == JoinOutcome::RejectedLate {
            warn!(player_id = %player_id, name, "rejecting late join");
            return self.drop_message(message, "late_join");
        }

        info!(player_id = %player_id, name, "peer joined");
        if outcome == JoinOutcome::Added {
            if let Some(mine) = self.local_player() {
                self.publish(PeerMessage::player_join(&mine)).await;
            }
        }
        if started {
            self.on_started().await;
        }
        SessionUpdate::PeerJoined {
            player_id,
            name,
            started,
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Announces the start, starts the clock, and arms the end-of-match event.
    async fn on_started(&self) {
        let state = self.shared.snapshot();
        if let (Some(local), Some(started_at)) = (self.local.get(), state.started_at) {
            self.publish(PeerMessage::match_start(
                local.clone(),
                started_at,
                state.seconds_remaining,
            ))
            .await;
        }

        info!(
            match_id = %state.id,
            players = state.players.len(),
            seconds_remaining = state.seconds_remaining,
            "match started"
        );
        metrics::record_seconds_remaining(state.seconds_remaining);
        self.events.emit(Event::MatchStarted {
            timestamp: Utc::now(),
            match_id: state.id.to_string(),
            players: state.players.len(),
            seconds_remaining: state.seconds_remaining,
        });

        let fresh = {
            let mut slot = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                false
            } else {
                *slot = Some(MatchClock::start(
                    self.shared.clone(),
                    self.cancel.child_token(),
                ));
                true
            }
        };
        if fresh {
            self.watch_for_finish();
        }
    }

    fn watch_for_finish(&self) {
        let shared = self.shared.clone();
        let events = Arc::clone(&self.events);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut clock = shared.subscribe();
            let finished = tokio::select! {
                () = cancel.cancelled() => false,
                finished = clock.wait_for(|snap| snap.status == MatchStatus::Finished) => {
                    finished.is_ok()
                }
            };
            if finished {
                let standings = shared.read(Standing::table);
                info!(players = standings.len(), "match finished");
                events.emit(Event::MatchFinished {
                    timestamp: Utc::now(),
                    standings,
                });
            }
        });
    }

    async fn publish(&self, message: Result<PeerMessage, TransportError>) {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "failed to build peer message");
                return;
            }
        };
        match self.transport.broadcast(&message).await {
            Ok(()) => metrics::record_peer_message(message.kind, "out"),
            Err(e) => warn!(
                kind = message.kind.as_str(),
                transport = %self.transport.transport_type(),
                error = %e,
                "peer broadcast failed"
            ),
        }
    }

    fn drop_message(&self, message: &PeerMessage, reason: &'static str) -> SessionUpdate {
        debug!(
            kind = message.kind.as_str(),
            sender = %message.sender_id,
            reason,
            "dropping peer message"
        );
        metrics::record_peer_message_dropped(reason);
        if reason != "loopback" {
            self.events.emit(Event::PeerMessageDropped {
                timestamp: Utc::now(),
                message_type: Some(message.kind.as_str().to_owned()),
                sender_id: Some(message.sender_id.clone()),
                reason: reason.to_owned(),
            });
        }
        SessionUpdate::Dropped { reason }
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("local", &self.local.get())
            .field("shared", &self.shared)
            .field("transport", &self.transport.transport_type())
            .finish_non_exhaustive()
    }
}
