//! Player records - one participant's identity, role and presence in a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::PlayerId;

/// Role a bound connection holds in its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    /// Game Master - at most one online per session, owns the GM notes
    Master,
    /// Regular player
    Player,
}

impl PlayerRole {
    pub fn is_master(self) -> bool {
        matches!(self, Self::Master)
    }
}

/// Identity fields a client supplies when joining.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub character_name: String,
    #[serde(default)]
    pub character_concept: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<Map<String, Value>>,
}

impl PlayerData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Field-by-field overwrite used by the legacy `update_player` event.
///
/// Only descriptive fields are writable; id, role, presence and join time are
/// owned by the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFieldsUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub character_concept: Option<String>,
    #[serde(default)]
    pub character: Option<Map<String, Value>>,
}

/// A participant in a session.
///
/// # Invariants
///
/// - `id` is unique within its session and never changes
/// - records are never removed from a session, only marked offline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    id: PlayerId,
    name: String,
    character_name: String,
    character_concept: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    character: Option<Map<String, Value>>,
    is_master: bool,
    online: bool,
    joined_at: DateTime<Utc>,
}

impl PlayerRecord {
    /// Create an online record from join data.
    pub fn new(data: PlayerData, role: PlayerRole, now: DateTime<Utc>) -> Self {
        Self {
            id: PlayerId::new(),
            name: data.name,
            character_name: data.character_name,
            character_concept: data.character_concept,
            character: data.character,
            is_master: role.is_master(),
            online: true,
            joined_at: now,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn character_name(&self) -> &str {
        &self.character_name
    }

    #[inline]
    pub fn character_concept(&self) -> &str {
        &self.character_concept
    }

    #[inline]
    pub fn character(&self) -> Option<&Map<String, Value>> {
        self.character.as_ref()
    }

    #[inline]
    pub fn is_master(&self) -> bool {
        self.is_master
    }

    #[inline]
    pub fn is_online(&self) -> bool {
        self.online
    }

    #[inline]
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    pub fn role(&self) -> PlayerRole {
        if self.is_master {
            PlayerRole::Master
        } else {
            PlayerRole::Player
        }
    }

    /// Whether this record currently occupies the live master slot.
    pub fn is_live_master(&self) -> bool {
        self.is_master && self.online
    }

    // =========================================================================
    // Mutations (crate-private, driven by the Session aggregate)
    // =========================================================================

    pub(crate) fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Shallow merge: keys in `patch` overwrite, other keys are kept.
    pub(crate) fn merge_character(&mut self, patch: &Map<String, Value>) {
        let character = self.character.get_or_insert_with(Map::new);
        for (key, value) in patch {
            character.insert(key.clone(), value.clone());
        }
    }

    pub(crate) fn apply_fields(&mut self, update: PlayerFieldsUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(character_name) = update.character_name {
            self.character_name = character_name;
        }
        if let Some(character_concept) = update.character_concept {
            self.character_concept = character_concept;
        }
        if let Some(character) = update.character {
            self.character = Some(character);
        }
    }
}
