//! Per-connection binding state.

use rinascimento_domain::{ConnectionId, PlayerId, PlayerRole, SessionId};

/// What a connection is attached to.
///
/// Starts unbound. `joinSession` attaches a room without an identity; the
/// join and rejoin events bind a player identity and its role. Lives only as
/// long as the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionBinding {
    pub connection_id: ConnectionId,
    pub session_id: Option<SessionId>,
    pub player_id: Option<PlayerId>,
    pub role: Option<PlayerRole>,
}

impl ConnectionBinding {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            session_id: None,
            player_id: None,
            role: None,
        }
    }

    /// Session and player this connection speaks for, if any.
    pub fn identity(&self) -> Option<(SessionId, PlayerId)> {
        match (&self.session_id, self.player_id) {
            (Some(session_id), Some(player_id)) => Some((session_id.clone(), player_id)),
            _ => None,
        }
    }

    pub fn is_master(&self) -> bool {
        self.player_id.is_some() && self.role.is_some_and(PlayerRole::is_master)
    }

    pub fn in_session(&self, session_id: &SessionId) -> bool {
        self.session_id.as_ref() == Some(session_id)
    }

    /// Attach to a room without an identity.
    pub fn attach(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
        self.player_id = None;
        self.role = None;
    }

    pub fn bind_player(&mut self, session_id: SessionId, player_id: PlayerId, role: PlayerRole) {
        self.session_id = Some(session_id);
        self.player_id = Some(player_id);
        self.role = Some(role);
    }

    /// Drop the identity but stay in the room.
    pub fn clear_player(&mut self) {
        self.player_id = None;
        self.role = None;
    }
}
