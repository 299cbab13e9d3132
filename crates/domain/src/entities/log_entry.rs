//! Game log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author label used when a payload carries no player name.
pub const SYSTEM_AUTHOR: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogEntryType {
    DiceRoll,
    GmNote,
    LegacyMessage,
}

impl LogEntryType {
    /// Game-state update types that are recorded in the log.
    pub fn from_update_type(kind: &str) -> Option<Self> {
        match kind {
            "diceRoll" => Some(Self::DiceRoll),
            "gmNote" => Some(Self::GmNote),
            _ => None,
        }
    }
}

/// One entry of a session's append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub entry_type: LogEntryType,
    pub author: String,
    pub content: String,
    pub data: Value,
}

impl LogEntry {
    /// Build an entry for a `gameStateUpdate` payload.
    ///
    /// Returns `None` for payload types that are broadcast but not logged.
    pub fn from_game_state_update(payload: &Value, now: DateTime<Utc>) -> Option<Self> {
        let entry_type = payload
            .get("type")
            .and_then(Value::as_str)
            .and_then(LogEntryType::from_update_type)?;

        Some(Self {
            timestamp: now,
            entry_type,
            author: player_name(payload).unwrap_or(SYSTEM_AUTHOR).to_string(),
            content: summarize(payload),
            data: payload.clone(),
        })
    }

    /// Build an entry for a legacy `game_message`.
    pub fn legacy_message(author: Option<&str>, payload: &Value, now: DateTime<Utc>) -> Self {
        let author = author
            .or_else(|| player_name(payload))
            .unwrap_or(SYSTEM_AUTHOR)
            .to_string();
        let content = ["content", "message"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        Self {
            timestamp: now,
            entry_type: LogEntryType::LegacyMessage,
            author,
            content,
            data: payload.clone(),
        }
    }
}

fn player_name(payload: &Value) -> Option<&str> {
    payload
        .get("playerName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

fn summarize(payload: &Value) -> String {
    if let Some(note) = payload.get("note").and_then(Value::as_str) {
        return note.to_string();
    }

    if let Some(total) = payload.get("roll").and_then(|roll| roll.get("total")) {
        let total = match total {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return format!("Roll: {total}");
    }

    payload
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
