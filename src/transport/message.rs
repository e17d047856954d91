//! Peer message envelope.
//!
//! Wire form: `{"type": "...", "payload": {...}, "senderId": "..."}` as JSON.
//! The envelope is parsed eagerly; payloads are decoded on demand by
//! [`PeerMessage::decode`] so a bad payload only costs that one message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;
use crate::game::{MatchState, PlayerId, PlayerState};

/// Kind of peer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Sender joined; payload is their `PlayerState`.
    PlayerJoin,
    /// Sender's goal count changed.
    UpdateScore,
    /// Sender started the match.
    MatchStart,
    /// Full match state, for reconciliation.
    SyncState,
}

impl MessageType {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerJoin => "PLAYER_JOIN",
            Self::UpdateScore => "UPDATE_SCORE",
            Self::MatchStart => "MATCH_START",
            Self::SyncState => "SYNC_STATE",
        }
    }
}

/// Envelope exchanged between peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerMessage {
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Kind-specific payload.
    #[serde(default)]
    pub payload: Value,
    /// Originating participant.
    #[serde(rename = "senderId")]
    pub sender_id: PlayerId,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScorePayload {
    goals: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchStartPayload {
    start_time: DateTime<Utc>,
    time_left: u32,
}

/// Decoded payload of a [`PeerMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// The sender joined.
    PlayerJoined(PlayerState),
    /// The sender's goal count is now `goals`.
    ScoreUpdated {
        /// New goal count.
        goals: u32,
    },
    /// The sender started the match.
    MatchStarted {
        /// Wall-clock start.
        started_at: DateTime<Utc>,
        /// Clock value at start.
        seconds_remaining: u32,
    },
    /// Full match state.
    StateSynced(Box<MatchState>),
}

impl PeerMessage {
    fn new(kind: MessageType, sender_id: PlayerId, payload: Value) -> Self {
        Self {
            kind,
            payload,
            sender_id,
        }
    }

    /// Announces `player`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Json` if the state cannot be serialized.
    pub fn player_join(player: &PlayerState) -> Result<Self, TransportError> {
        Ok(Self::new(
            MessageType::PlayerJoin,
            player.id.clone(),
            serde_json::to_value(player)?,
        ))
    }

    /// Reports the sender's goal count.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Json` if the payload cannot be serialized.
    pub fn update_score(sender: PlayerId, goals: u32) -> Result<Self, TransportError> {
        Ok(Self::new(
            MessageType::UpdateScore,
            sender,
            serde_json::to_value(ScorePayload { goals })?,
        ))
    }

    /// Announces that play started.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Json` if the payload cannot be serialized.
    pub fn match_start(
        sender: PlayerId,
        started_at: DateTime<Utc>,
        seconds_remaining: u32,
    ) -> Result<Self, TransportError> {
        Ok(Self::new(
            MessageType::MatchStart,
            sender,
            serde_json::to_value(MatchStartPayload {
                start_time: started_at,
                time_left: seconds_remaining,
            })?,
        ))
    }

    /// Carries the full match state.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Json` if the state cannot be serialized.
    pub fn sync_state(sender: PlayerId, state: &MatchState) -> Result<Self, TransportError> {
        Ok(Self::new(
            MessageType::SyncState,
            sender,
            serde_json::to_value(state)?,
        ))
    }

    /// Parses an envelope from raw JSON.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::MalformedMessage` for anything that is not a
    /// well-formed envelope with a known type.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TransportError> {
        serde_json::from_slice(bytes).map_err(|e| TransportError::MalformedMessage(e.to_string()))
    }

    /// Serializes the envelope.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, TransportError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes the payload according to the message type.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::MalformedMessage` if the payload does not fit
    /// the type, or if a join announces someone other than the sender.
    pub fn decode(&self) -> Result<PeerEvent, TransportError> {
        let malformed = |e: serde_json::Error| {
            TransportError::MalformedMessage(format!("{}: {e}", self.kind.as_str()))
        };
        match self.kind {
            MessageType::PlayerJoin => {
                let player: PlayerState =
                    serde_json::from_value(self.payload.clone()).map_err(malformed)?;
                if player.id != self.sender_id {
                    return Err(TransportError::MalformedMessage(format!(
                        "join for {} sent by {}",
                        player.id, self.sender_id
                    )));
                }
                Ok(PeerEvent::PlayerJoined(player))
            }
            MessageType::UpdateScore => {
                let p: ScorePayload =
                    serde_json::from_value(self.payload.clone()).map_err(malformed)?;
                Ok(PeerEvent::ScoreUpdated { goals: p.goals })
            }
            MessageType::MatchStart => {
                let p: MatchStartPayload =
                    serde_json::from_value(self.payload.clone()).map_err(malformed)?;
                Ok(PeerEvent::MatchStarted {
                    started_at: p.start_time,
                    seconds_remaining: p.time_left,
                })
            }
            MessageType::SyncState => {
                let state: MatchState =
                    serde_json::from_value(self.payload.clone()).map_err(malformed)?;
                Ok(PeerEvent::StateSynced(Box::new(state)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::game::MatchId;

    fn alice() -> PlayerState {
        PlayerState::new(PlayerId::new("player_alice0000"), "Alice")
    }

    #[test]
    fn envelope_uses_wire_names() {
        let msg = PeerMessage::update_score(PlayerId::new("p1"), 2).unwrap();
        let json: Value = serde_json::from_slice(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "UPDATE_SCORE");
        assert_eq!(json["senderId"], "p1");
        assert_eq!(json["payload"]["goals"], 2);
    }

    #[test]
    fn join_decodes_player() {
        let msg = PeerMessage::player_join(&alice()).unwrap();
        assert_eq!(msg.decode().unwrap(), PeerEvent::PlayerJoined(alice()));
    }

    #[test]
    fn join_for_someone_else_is_malformed() {
        let mut msg = PeerMessage::player_join(&alice()).unwrap();
        msg.sender_id = PlayerId::new("mallory");
        assert!(matches!(
            msg.decode(),
            Err(TransportError::MalformedMessage(_))
        ));
    }

    #[test]
    fn match_start_decodes() {
        let now = Utc::now();
        let msg = PeerMessage::match_start(PlayerId::new("p1"), now, 180).unwrap();
        assert_eq!(
            msg.decode().unwrap(),
            PeerEvent::MatchStarted {
                started_at: now,
                seconds_remaining: 180
            }
        );
    }

    #[test]
    fn sync_state_decodes() {
        let mut state = MatchState::new(MatchId::default(), 180);
        state.add_player(alice());
        let msg = PeerMessage::sync_state(PlayerId::new("p1"), &state).unwrap();
        assert_eq!(
            msg.decode().unwrap(),
            PeerEvent::StateSynced(Box::new(state))
        );
    }

    #[test]
    fn unknown_type_is_malformed() {
        let raw = br#"{"type":"KICK_PLAYER","payload":{},"senderId":"p1"}"#;
        assert!(matches!(
            PeerMessage::from_json(raw),
            Err(TransportError::MalformedMessage(_))
        ));
    }

    #[test]
    fn missing_payload_field_is_malformed() {
        let msg = PeerMessage {
            kind: MessageType::UpdateScore,
            payload: json!({ "score": 3 }),
            sender_id: PlayerId::new("p1"),
        };
        assert!(msg.decode().is_err());

        let raw = br#"{"type":"UPDATE_SCORE","senderId":"p1"}"#;
        let parsed = PeerMessage::from_json(raw).unwrap();
        assert!(parsed.payload.is_null());
        assert!(parsed.decode().is_err());
    }

    #[test]
    fn negative_goals_rejected() {
        let msg = PeerMessage {
            kind: MessageType::UpdateScore,
            payload: json!({ "goals": -1 }),
            sender_id: PlayerId::new("p1"),
        };
        assert!(msg.decode().is_err());
    }
}
