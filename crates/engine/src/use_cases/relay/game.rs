//! In-game traffic: character patches, game state, GM notes and utility events.

use serde_json::{json, Map, Value};

use rinascimento_domain::PlayerRecord;
use rinascimento_shared::ServerMessage;

use super::{ConnectionBinding, Fanout, RelayEngine};

impl RelayEngine {
    /// `characterUpdate`: shallow-merge into the sender's character and relay
    /// the patch to everyone else.
    pub async fn character_update(
        &self,
        binding: &ConnectionBinding,
        character: Map<String, Value>,
    ) -> Fanout {
        let Some((session_id, player_id)) = binding.identity() else {
            tracing::debug!(connection_id = %binding.connection_id, "characterUpdate from unbound connection");
            return Fanout::new();
        };

        let now = self.now();
        let Some(mut session) = self.sessions.lock(&session_id).await else {
            return Fanout::new();
        };
        if !session.is_held_by(player_id, binding.connection_id) {
            tracing::debug!(connection_id = %binding.connection_id, "characterUpdate from superseded connection");
            return Fanout::new();
        }
        let Some(record) = session.merge_character(player_id, &character, now) else {
            return Fanout::new();
        };

        let mut fanout = Fanout::new();
        fanout.broadcast_except(
            &session_id,
            binding.connection_id,
            ServerMessage::GameStateUpdate(json!({
                "type": "characterUpdate",
                "playerId": player_id,
                "playerName": record.name(),
                "character": character,
            })),
        );
        self.deliver(binding.connection_id, fanout)
    }

    /// `gameStateUpdate`: log dice rolls and GM notes, store keyed state, and
    /// echo the payload to the whole room.
    pub async fn game_state_update(&self, binding: &ConnectionBinding, payload: Value) -> Fanout {
        let Some(session_id) = binding.session_id.clone() else {
            tracing::debug!(connection_id = %binding.connection_id, "gameStateUpdate from unbound connection");
            return Fanout::new();
        };

        let now = self.now();
        let Some(mut session) = self.sessions.lock(&session_id).await else {
            return Fanout::new();
        };
        if let Some(entry) = session.record_game_state_update(&payload, now) {
            tracing::debug!(
                session_id = %session_id,
                entry_type = ?entry.entry_type,
                author = %entry.author,
                "Log entry appended"
            );
        }

        let mut fanout = Fanout::new();
        fanout.broadcast(&session_id, ServerMessage::GameStateUpdate(payload));
        self.deliver(binding.connection_id, fanout)
    }

    /// `getActiveSessions`
    pub async fn active_sessions(&self, binding: &ConnectionBinding) -> Fanout {
        let sessions = self.sessions.list_summaries().await;
        self.reply(
            binding.connection_id,
            ServerMessage::ActiveSessions { sessions },
        )
    }

    /// `gmNotesUpdate`: only the connection holding the online master record
    /// may write; anyone else is ignored.
    pub async fn gm_notes_update(&self, binding: &ConnectionBinding, notes: Value) -> Fanout {
        let Some((session_id, player_id)) = binding.identity().filter(|_| binding.is_master()) else {
            tracing::debug!(connection_id = %binding.connection_id, "gmNotesUpdate from non-master ignored");
            return Fanout::new();
        };

        let now = self.now();
        {
            let Some(mut session) = self.sessions.lock(&session_id).await else {
                return Fanout::new();
            };
            let live_master = session.is_held_by(player_id, binding.connection_id)
                && session
                    .player(player_id)
                    .is_some_and(PlayerRecord::is_live_master);
            if !live_master {
                tracing::debug!(connection_id = %binding.connection_id, "gmNotesUpdate from superseded master ignored");
                return Fanout::new();
            }
            session.set_gm_notes(notes, now);
        }

        self.reply(
            binding.connection_id,
            ServerMessage::GmNotesSaved { success: true },
        )
    }

    /// `messageAck`
    pub fn message_ack(&self, binding: &ConnectionBinding, message_id: Value) -> Fanout {
        self.reply(binding.connection_id, ServerMessage::MessageAck { message_id })
    }

    /// `ping`
    pub fn ping(&self, binding: &ConnectionBinding) -> Fanout {
        self.reply(binding.connection_id, ServerMessage::Pong)
    }

    /// `heartbeat`
    pub fn heartbeat(&self, binding: &ConnectionBinding) -> Fanout {
        self.reply(
            binding.connection_id,
            ServerMessage::HeartbeatAck {
                timestamp: self.now(),
            },
        )
    }
}
