//! Domain entities - Core business objects with identity

mod log_entry;
mod player_record;

pub use log_entry::{LogEntry, LogEntryType, SYSTEM_AUTHOR};
pub use player_record::{PlayerData, PlayerFieldsUpdate, PlayerRecord, PlayerRole};
