//! Payloads of the legacy request/response events.
//!
//! Older clients send snake_case events carrying a `requestId` and expect a
//! single `ack` reply with `{success, ...}` instead of separate events.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use rinascimento_domain::{PlayerData, PlayerFieldsUpdate, SessionId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCreateSession {
    #[serde(default)]
    pub request_id: Option<String>,
    /// When present the creator also joins as Game Master
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub character_concept: Option<String>,
}

impl LegacyCreateSession {
    /// Join data for the hosting player, if the request names one.
    pub fn host_data(&self) -> Option<PlayerData> {
        let name = self.player_name.clone()?;
        Some(PlayerData {
            name,
            character_name: self.character_name.clone().unwrap_or_default(),
            character_concept: self.character_concept.clone().unwrap_or_default(),
            character: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyJoinSession {
    #[serde(default)]
    pub request_id: Option<String>,
    pub session_id: SessionId,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub character_name: String,
    #[serde(default)]
    pub character_concept: String,
    #[serde(default)]
    pub character: Option<Map<String, Value>>,
    #[serde(default)]
    pub wants_to_be_master: bool,
}

impl LegacyJoinSession {
    pub fn player_data(&self) -> PlayerData {
        PlayerData {
            name: self.player_name.clone(),
            character_name: self.character_name.clone(),
            character_concept: self.character_concept.clone(),
            character: self.character.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUpdatePlayer {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub fields: PlayerFieldsUpdate,
}

/// `requestId` of a free-form legacy payload.
pub fn request_id_of(payload: &Value) -> Option<String> {
    payload
        .get("requestId")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Successful legacy reply: `{success: true}` plus the fields of `extra`.
pub fn legacy_ok(extra: Value) -> Value {
    let mut body = match extra {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert("success".to_string(), Value::Bool(true));
    Value::Object(body)
}

/// Failed legacy reply.
pub fn legacy_error(message: impl Into<String>) -> Value {
    json!({"success": false, "error": message.into()})
}
