//! WebSocket message types for relay/client communication
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Events without a payload omit `data`; inbound they may also carry `null`
//! or an empty object, which is ignored.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Renaming variants is a breaking change
//! - Legacy snake_case events stay until every client has migrated

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rinascimento_domain::{LogEntry, PlayerData, PlayerId, PlayerRecord, SessionId, SessionSummary};

use crate::legacy::{LegacyCreateSession, LegacyJoinSession, LegacyUpdatePlayer};
use crate::responses::ErrorCode;

// =============================================================================
// Client Messages (client → relay)
// =============================================================================

/// Messages from a client to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Allocate a new session
    CreateSession,
    /// Attach to a session's room as an observer
    JoinSession { session_id: SessionId },
    /// Join and claim the Game Master slot
    JoinAsGameMaster {
        session_id: SessionId,
        #[serde(default)]
        player_data: PlayerData,
    },
    /// Join as a regular player
    JoinAsPlayer {
        session_id: SessionId,
        #[serde(default)]
        player_data: PlayerData,
    },
    /// Resume a previously created identity after a reconnect
    RejoinSession {
        session_id: SessionId,
        /// Kept as a string so malformed ids surface as a rejoin failure
        player_id: String,
    },
    /// Patch the sender's character attributes
    CharacterUpdate {
        #[serde(default)]
        character: Map<String, Value>,
    },
    /// Free-form game state update (dice rolls, notes, board moves, ...)
    GameStateUpdate(Value),
    /// List sessions with someone online
    GetActiveSessions,
    /// Master-only private notes
    GmNotesUpdate {
        #[serde(default)]
        notes: Value,
    },
    /// Client acknowledges a message; echoed back
    MessageAck {
        #[serde(default)]
        message_id: Value,
    },
    Ping,
    Heartbeat,

    // Legacy request/response events
    #[serde(rename = "create_session")]
    LegacyCreateSession(LegacyCreateSession),
    #[serde(rename = "join_session")]
    LegacyJoinSession(LegacyJoinSession),
    #[serde(rename = "game_message")]
    LegacyGameMessage(Value),
    #[serde(rename = "update_player")]
    LegacyUpdatePlayer(LegacyUpdatePlayer),
}

impl ClientMessage {
    /// Parse one inbound text frame.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut frame: Value = serde_json::from_str(raw)?;
        match Self::deserialize(&frame) {
            Err(err) if has_empty_payload(&frame) => {
                if let Some(fields) = frame.as_object_mut() {
                    fields.remove("data");
                }
                Self::deserialize(&frame).map_err(|_| err)
            }
            parsed => parsed,
        }
    }

    /// Wire name of the event, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::CreateSession => "createSession",
            Self::JoinSession { .. } => "joinSession",
            Self::JoinAsGameMaster { .. } => "joinAsGameMaster",
            Self::JoinAsPlayer { .. } => "joinAsPlayer",
            Self::RejoinSession { .. } => "rejoinSession",
            Self::CharacterUpdate { .. } => "characterUpdate",
            Self::GameStateUpdate(_) => "gameStateUpdate",
            Self::GetActiveSessions => "getActiveSessions",
            Self::GmNotesUpdate { .. } => "gmNotesUpdate",
            Self::MessageAck { .. } => "messageAck",
            Self::Ping => "ping",
            Self::Heartbeat => "heartbeat",
            Self::LegacyCreateSession(_) => "create_session",
            Self::LegacyJoinSession(_) => "join_session",
            Self::LegacyGameMessage(_) => "game_message",
            Self::LegacyUpdatePlayer(_) => "update_player",
        }
    }
}

fn has_empty_payload(frame: &Value) -> bool {
    frame
        .get("data")
        .and_then(Value::as_object)
        .is_some_and(Map::is_empty)
}

// =============================================================================
// Server Messages (relay → client)
// =============================================================================

/// Messages from the relay to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    SessionCreated {
        session_id: SessionId,
        success: bool,
    },
    /// Room attached; roster and log snapshot
    JoinedSession {
        session_id: SessionId,
        players: Vec<PlayerRecord>,
        game_log: Vec<LogEntry>,
    },
    /// Sent to the joining connection with its own record
    PlayerJoined {
        player_id: PlayerId,
        player_data: PlayerRecord,
        is_master: bool,
    },
    /// Presence or profile change of one player
    PlayerUpdate { player: PlayerRecord },
    /// Relayed game-state payload
    GameStateUpdate(Value),
    ActiveSessions { sessions: Vec<SessionSummary> },
    GmNotesSaved { success: bool },
    MessageAck { message_id: Value },
    Pong,
    #[serde(rename = "heartbeat-ack")]
    HeartbeatAck { timestamp: DateTime<Utc> },
    SessionError { message: String, code: ErrorCode },

    // Legacy events
    /// Callback reply to a legacy request
    #[serde(rename = "ack")]
    Ack { request_id: String, response: Value },
    #[serde(rename = "player_joined")]
    LegacyPlayerJoined { player: PlayerRecord },
    #[serde(rename = "player_updated")]
    LegacyPlayerUpdated { player: PlayerRecord },
    #[serde(rename = "player_disconnected")]
    LegacyPlayerDisconnected {
        player_id: PlayerId,
        player_name: String,
    },
    #[serde(rename = "game_message")]
    LegacyGameMessage(Value),
}

impl ServerMessage {
    /// Build a tagged protocol error.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::SessionError {
            message: message.into(),
            code,
        }
    }
}
