//! Unified error types for the domain layer
//!
//! Session mutations that can be refused return `DomainError`; the engine maps
//! these onto protocol error codes.

use thiserror::Error;

use crate::ids::{PlayerId, SessionId};

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A different master record is online in this session
    #[error("Session {session_id} already has a game master online")]
    MasterAlreadyPresent { session_id: SessionId },

    /// Player id is not part of this session's roster
    #[error("Player {player_id} not found in session {session_id}")]
    PlayerNotFound {
        session_id: SessionId,
        player_id: PlayerId,
    },
}

impl DomainError {
    /// Create a master-already-present error
    pub fn master_already_present(session_id: &SessionId) -> Self {
        Self::MasterAlreadyPresent {
            session_id: session_id.clone(),
        }
    }

    /// Create a player not found error
    pub fn player_not_found(session_id: &SessionId, player_id: PlayerId) -> Self {
        Self::PlayerNotFound {
            session_id: session_id.clone(),
            player_id,
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PlayerNotFound { .. })
    }
}
