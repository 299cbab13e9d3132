//! Legacy request/response events.
//!
//! Older clients send snake_case events with a `requestId` and wait for one
//! `ack` carrying `{success, ...}`. These handlers drive the same session
//! mutations as the modern events and only differ in what they send back.

use serde_json::{json, Value};

use rinascimento_shared::{
    legacy_error, legacy_ok, request_id_of, LegacyCreateSession, LegacyJoinSession,
    LegacyUpdatePlayer, ServerMessage,
};

use super::join::Admission;
use super::{ConnectionBinding, Fanout, JoinError, RelayEngine};

const SESSION_NOT_FOUND: &str = "Session not found";
const NOT_IN_SESSION: &str = "Not in a session";
const NOT_A_PLAYER: &str = "Not joined as a player";

impl RelayEngine {
    /// `create_session`: allocate a session; with a `playerName` the caller
    /// also takes the Game Master seat.
    pub async fn legacy_create_session(
        &self,
        binding: &mut ConnectionBinding,
        request: LegacyCreateSession,
    ) -> Fanout {
        let session_id = self.sessions.create();

        let Some(host) = request.host_data() else {
            return self.ack(
                binding,
                request.request_id,
                legacy_ok(json!({"sessionId": session_id})),
            );
        };

        let request_id = request.request_id.clone();
        let admitted = self
            .admit(binding, &session_id, Admission::Master(host), |session, record, fanout| {
                fanout.ack(
                    request_id,
                    legacy_ok(json!({"sessionId": session.id(), "player": record})),
                );
            })
            .await;

        match admitted {
            Ok(fanout) => fanout,
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "Host join failed on a fresh session");
                self.ack(binding, request.request_id, legacy_error(err.to_string()))
            }
        }
    }

    /// `join_session`: create a player record; the master seat is granted
    /// only while nobody else holds it.
    pub async fn legacy_join_session(
        &self,
        binding: &mut ConnectionBinding,
        request: LegacyJoinSession,
    ) -> Fanout {
        let connection_id = binding.connection_id;
        let request_id = request.request_id.clone();
        let admission = Admission::MasterRequest {
            data: request.player_data(),
            wants_master: request.wants_to_be_master,
        };

        let admitted = self
            .admit(binding, &request.session_id, admission, move |session, record, fanout| {
                fanout.broadcast_except(
                    session.id(),
                    connection_id,
                    ServerMessage::LegacyPlayerJoined {
                        player: record.clone(),
                    },
                );
                fanout.broadcast_except(
                    session.id(),
                    connection_id,
                    ServerMessage::PlayerUpdate {
                        player: record.clone(),
                    },
                );
                fanout.ack(
                    request_id,
                    legacy_ok(json!({
                        "sessionId": session.id(),
                        "player": record,
                        "players": session.roster(),
                        "gameLog": session.game_log(),
                    })),
                );
            })
            .await;

        match admitted {
            Ok(fanout) => fanout,
            Err(JoinError::SessionNotFound(_)) => {
                self.ack(binding, request.request_id, legacy_error(SESSION_NOT_FOUND))
            }
            Err(err) => self.ack(binding, request.request_id, legacy_error(err.to_string())),
        }
    }

    /// `game_message`: log it and relay it to the whole room.
    pub async fn legacy_game_message(&self, binding: &ConnectionBinding, payload: Value) -> Fanout {
        let request_id = request_id_of(&payload);
        let Some(session_id) = binding.session_id.clone() else {
            tracing::debug!(connection_id = %binding.connection_id, "game_message from unbound connection");
            return self.ack(binding, request_id, legacy_error(NOT_IN_SESSION));
        };

        let now = self.now();
        let Some(mut session) = self.sessions.lock(&session_id).await else {
            return self.ack(binding, request_id, legacy_error(SESSION_NOT_FOUND));
        };
        let author = binding
            .player_id
            .filter(|player_id| session.is_held_by(*player_id, binding.connection_id))
            .and_then(|player_id| session.player(player_id))
            .map(|player| player.name().to_string());
        session.record_legacy_message(author.as_deref(), &payload, now);

        let mut fanout = Fanout::new();
        fanout.broadcast(&session_id, ServerMessage::LegacyGameMessage(payload));
        fanout.ack(request_id, legacy_ok(json!({})));
        self.deliver(binding.connection_id, fanout)
    }

    /// `update_player`: overwrite descriptive fields of the sender's record.
    pub async fn legacy_update_player(
        &self,
        binding: &ConnectionBinding,
        request: LegacyUpdatePlayer,
    ) -> Fanout {
        let Some((session_id, player_id)) = binding.identity() else {
            tracing::debug!(connection_id = %binding.connection_id, "update_player from unbound connection");
            return self.ack(binding, request.request_id, legacy_error(NOT_A_PLAYER));
        };

        let now = self.now();
        let Some(mut session) = self.sessions.lock(&session_id).await else {
            return self.ack(binding, request.request_id, legacy_error(SESSION_NOT_FOUND));
        };
        if !session.is_held_by(player_id, binding.connection_id) {
            return self.ack(binding, request.request_id, legacy_error(NOT_A_PLAYER));
        }
        let Some(record) = session.update_player_fields(player_id, request.fields, now) else {
            return self.ack(binding, request.request_id, legacy_error(NOT_A_PLAYER));
        };

        let mut fanout = Fanout::new();
        fanout.broadcast_except(
            &session_id,
            binding.connection_id,
            ServerMessage::LegacyPlayerUpdated {
                player: record.clone(),
            },
        );
        fanout.broadcast_except(
            &session_id,
            binding.connection_id,
            ServerMessage::PlayerUpdate {
                player: record.clone(),
            },
        );
        fanout.ack(request.request_id, legacy_ok(json!({"player": record})));
        self.deliver(binding.connection_id, fanout)
    }

    /// Reply with a legacy `ack`, or nothing when the request had no id.
    fn ack(&self, binding: &ConnectionBinding, request_id: Option<String>, response: Value) -> Fanout {
        let mut fanout = Fanout::new();
        fanout.ack(request_id, response);
        self.deliver(binding.connection_id, fanout)
    }
}
