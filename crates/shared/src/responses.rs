//! Error codes carried by `sessionError` events.

use serde::{Deserialize, Serialize};

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced session id is unknown
    SessionNotFound,
    /// Join-as-master attempted while a master is online
    MasterAlreadyPresent,
    /// Rejoin target session or player id is unknown
    RejoinFailed,
    /// Frame could not be parsed as a known event
    InvalidMessage,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::MasterAlreadyPresent => "MASTER_ALREADY_PRESENT",
            Self::RejoinFailed => "REJOIN_FAILED",
            Self::InvalidMessage => "INVALID_MESSAGE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
