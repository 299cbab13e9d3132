//! Session creation, joins, rejoins and presence.

use uuid::Uuid;

use rinascimento_domain::{
    ConnectionId, DomainError, PlayerData, PlayerId, PlayerRecord, Session, SessionId,
};
use rinascimento_shared::{ErrorCode, ServerMessage};

use super::{ConnectionBinding, Fanout, RelayEngine};

/// Why a join or rejoin was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),
    #[error("Session {0} already has a game master")]
    MasterAlreadyPresent(SessionId),
    #[error("Cannot rejoin session {session_id} as player {player_id}")]
    RejoinFailed {
        session_id: SessionId,
        player_id: String,
    },
}

impl JoinError {
    fn rejoin_failed(session_id: &SessionId, player_id: impl Into<String>) -> Self {
        Self::RejoinFailed {
            session_id: session_id.clone(),
            player_id: player_id.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SessionNotFound(_) => ErrorCode::SessionNotFound,
            Self::MasterAlreadyPresent(_) => ErrorCode::MasterAlreadyPresent,
            Self::RejoinFailed { .. } => ErrorCode::RejoinFailed,
        }
    }

    pub fn to_server_message(&self) -> ServerMessage {
        ServerMessage::error(self.code(), self.to_string())
    }
}

/// How a connection asks to be let into a session.
pub(super) enum Admission {
    Master(PlayerData),
    Player(PlayerData),
    /// Legacy join: master only if the slot is free
    MasterRequest { data: PlayerData, wants_master: bool },
    Rejoin(PlayerId),
}

impl RelayEngine {
    /// `createSession`
    pub fn create_session(&self, binding: &ConnectionBinding) -> Fanout {
        let session_id = self.sessions.create();
        self.reply(
            binding.connection_id,
            ServerMessage::SessionCreated {
                session_id,
                success: true,
            },
        )
    }

    /// `joinSession`: attach to the room and receive a snapshot. No player
    /// record is created.
    pub async fn join_session(
        &self,
        binding: &mut ConnectionBinding,
        session_id: SessionId,
    ) -> Fanout {
        let now = self.now();
        let previous = binding.clone();
        let mut fanout = {
            let Some(mut session) = self.sessions.lock(&session_id).await else {
                return self.rejected(binding, JoinError::SessionNotFound(session_id));
            };
            session.touch(now);
            if !binding.in_session(&session_id) {
                binding.attach(session_id.clone());
                self.outbox.publish(binding);
            }
            self.reply(
                binding.connection_id,
                ServerMessage::JoinedSession {
                    session_id: session_id.clone(),
                    players: session.roster(),
                    game_log: session.game_log().to_vec(),
                },
            )
        };
        tracing::info!(
            connection_id = %binding.connection_id,
            session_id = %session_id,
            "Connection attached to session"
        );

        if previous.session_id.as_ref().is_some_and(|id| *id != session_id) {
            fanout.append(self.release(&previous).await);
        }
        fanout
    }

    /// `joinAsGameMaster`
    pub async fn join_as_game_master(
        &self,
        binding: &mut ConnectionBinding,
        session_id: SessionId,
        player_data: PlayerData,
    ) -> Fanout {
        self.join_and_announce(binding, session_id, Admission::Master(player_data))
            .await
    }

    /// `joinAsPlayer`
    pub async fn join_as_player(
        &self,
        binding: &mut ConnectionBinding,
        session_id: SessionId,
        player_data: PlayerData,
    ) -> Fanout {
        self.join_and_announce(binding, session_id, Admission::Player(player_data))
            .await
    }

    /// `rejoinSession`: bring a known record back online on this connection.
    /// Safe to repeat. A connection still holding the record loses it.
    pub async fn rejoin_session(
        &self,
        binding: &mut ConnectionBinding,
        session_id: SessionId,
        player_id: String,
    ) -> Fanout {
        let Ok(uuid) = Uuid::parse_str(&player_id) else {
            return self.rejected(binding, JoinError::rejoin_failed(&session_id, player_id));
        };
        let admission = Admission::Rejoin(PlayerId::from_uuid(uuid));
        self.join_and_announce(binding, session_id, admission).await
    }

    /// Connection closed: mark the player it holds offline. Nothing is
    /// deleted, and a record another connection has rejoined stays online.
    pub async fn disconnect(&self, binding: ConnectionBinding) -> Fanout {
        self.release(&binding).await
    }

    async fn join_and_announce(
        &self,
        binding: &mut ConnectionBinding,
        session_id: SessionId,
        admission: Admission,
    ) -> Fanout {
        let connection_id = binding.connection_id;
        let admitted = self
            .admit(binding, &session_id, admission, move |session, record, fanout| {
                fanout.reply_to_sender(ServerMessage::PlayerJoined {
                    player_id: record.id(),
                    is_master: record.is_master(),
                    player_data: record.clone(),
                });
                fanout.broadcast_except(
                    session.id(),
                    connection_id,
                    ServerMessage::PlayerUpdate {
                        player: record.clone(),
                    },
                );
            })
            .await;

        match admitted {
            Ok(fanout) => fanout,
            Err(err) => self.rejected(binding, err),
        }
    }

    /// Apply an admission and bind the connection, all under the session lock.
    ///
    /// `announce` adds the caller's replies and broadcasts; the plan is
    /// delivered before the lock is released. Any identity the connection
    /// held before is released unless it is the one being (re)joined.
    pub(super) async fn admit<F>(
        &self,
        binding: &mut ConnectionBinding,
        session_id: &SessionId,
        admission: Admission,
        announce: F,
    ) -> Result<Fanout, JoinError>
    where
        F: FnOnce(&Session, &PlayerRecord, &mut Fanout),
    {
        let now = self.now();
        let previous = binding.clone();
        let mut fanout = {
            let Some(mut session) = self.sessions.lock(session_id).await else {
                return Err(match admission {
                    Admission::Rejoin(player_id) => {
                        JoinError::rejoin_failed(session_id, player_id.to_string())
                    }
                    _ => JoinError::SessionNotFound(session_id.clone()),
                });
            };

            let record = match admission {
                Admission::Master(data) => session
                    .join_as_master(data, now)
                    .map_err(|_| JoinError::MasterAlreadyPresent(session_id.clone()))?,
                Admission::Player(data) => session.join_as_player(data, now),
                Admission::MasterRequest { data, wants_master } => {
                    session.join_with_master_request(data, wants_master, now)
                }
                Admission::Rejoin(player_id) => {
                    session.rejoin(player_id, now).map_err(|err| match err {
                        DomainError::MasterAlreadyPresent { .. } => {
                            JoinError::MasterAlreadyPresent(session_id.clone())
                        }
                        DomainError::PlayerNotFound { .. } => {
                            JoinError::rejoin_failed(session_id, player_id.to_string())
                        }
                    })?
                }
            };

            let mut fanout = Fanout::new();
            if let Some((held_session, held_player)) = previous.identity() {
                if held_session == *session_id && held_player != record.id() {
                    self.release_held(&mut session, binding.connection_id, held_player, &mut fanout);
                }
            }
            session.hold(record.id(), binding.connection_id);
            binding.bind_player(session_id.clone(), record.id(), record.role());
            self.outbox.publish(binding);

            tracing::info!(
                connection_id = %binding.connection_id,
                session_id = %session_id,
                player_id = %record.id(),
                role = ?record.role(),
                "Player joined session"
            );
            announce(&session, &record, &mut fanout);
            self.deliver(binding.connection_id, fanout)
        };

        if previous.session_id.as_ref().is_some_and(|id| id != session_id) {
            fanout.append(self.release(&previous).await);
        }
        Ok(fanout)
    }

    /// Release the identity `holder` speaks for in its own session and tell
    /// the room. The binding itself is left to the caller.
    async fn release(&self, holder: &ConnectionBinding) -> Fanout {
        let Some((session_id, player_id)) = holder.identity() else {
            return Fanout::new();
        };
        let Some(mut session) = self.sessions.lock(&session_id).await else {
            return Fanout::new();
        };
        let mut fanout = Fanout::new();
        self.release_held(&mut session, holder.connection_id, player_id, &mut fanout);
        self.deliver(holder.connection_id, fanout)
    }

    /// Mark a record offline if `connection_id` still holds it and queue the
    /// presence broadcasts. Caller holds the session lock.
    fn release_held(
        &self,
        session: &mut Session,
        connection_id: ConnectionId,
        player_id: PlayerId,
        fanout: &mut Fanout,
    ) {
        let Some(record) = session.release(player_id, connection_id, self.now()) else {
            tracing::debug!(
                connection_id = %connection_id,
                session_id = %session.id(),
                player_id = %player_id,
                "Record held by a newer connection, left online"
            );
            return;
        };

        tracing::info!(
            connection_id = %connection_id,
            session_id = %session.id(),
            player_id = %player_id,
            "Player went offline"
        );
        fanout.broadcast_except(
            session.id(),
            connection_id,
            ServerMessage::PlayerUpdate {
                player: record.clone(),
            },
        );
        fanout.broadcast_except(
            session.id(),
            connection_id,
            ServerMessage::LegacyPlayerDisconnected {
                player_id,
                player_name: record.name().to_string(),
            },
        );
    }

    fn rejected(&self, binding: &ConnectionBinding, err: JoinError) -> Fanout {
        tracing::info!(
            connection_id = %binding.connection_id,
            code = %err.code(),
            error = %err,
            "Join rejected"
        );
        self.reply(binding.connection_id, err.to_server_message())
    }
}
