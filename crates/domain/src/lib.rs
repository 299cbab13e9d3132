pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;

pub use aggregates::{Session, SessionOverview, SessionSummary};
pub use entities::{
    LogEntry, LogEntryType, PlayerData, PlayerFieldsUpdate, PlayerRecord, PlayerRole,
    SYSTEM_AUTHOR,
};
pub use error::DomainError;
pub use ids::{ConnectionId, PlayerId, SessionId, SESSION_ID_PREFIX};
