//! Session aggregate - one shared game room.
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: roster, master slot and log are only reachable through
//!   methods that keep the invariants below
//! - **Time injected**: every mutation takes `now` so callers control the clock
//!
//! # Invariants
//!
//! - at most one record has `is_master && online` at any time
//! - `master_id`, when set, is a key into `players` (cleared if stale)
//! - records are never removed, only marked offline
//! - `game_log` is append-only
//! - a record is held by at most one connection; only that connection can
//!   take it offline

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entities::{LogEntry, PlayerData, PlayerFieldsUpdate, PlayerRecord, PlayerRole};
use crate::error::DomainError;
use crate::ids::{ConnectionId, PlayerId, SessionId};

/// Row of the active-session listing (sessions with someone online).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub online_player_count: usize,
    pub has_master: bool,
    pub created_at: DateTime<Utc>,
}

/// Row of the status listing (every session, online or not).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverview {
    pub id: SessionId,
    pub player_count: usize,
    pub total_players: usize,
    pub created_at: DateTime<Utc>,
    pub has_master: bool,
    pub master_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    master_id: Option<PlayerId>,
    players: HashMap<PlayerId, PlayerRecord>,
    game_log: Vec<LogEntry>,
    game_state: Map<String, Value>,
    gm_notes: Option<Value>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    /// Connection currently speaking for each player. A reconnect hands the
    /// record to the new connection.
    holders: HashMap<PlayerId, ConnectionId>,
    /// Set by the store when the session is swept; handlers holding an old
    /// handle treat an evicted session as missing.
    evicted: bool,
}

impl Session {
    pub fn new(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            master_id: None,
            players: HashMap::new(),
            game_log: Vec::new(),
            game_state: Map::new(),
            gm_notes: None,
            created_at: now,
            last_activity: now,
            holders: HashMap::new(),
            evicted: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Master slot, ignoring a stale key.
    pub fn master_id(&self) -> Option<PlayerId> {
        self.master_id.filter(|id| self.players.contains_key(id))
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(&player_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    /// Roster snapshot, oldest join first.
    pub fn roster(&self) -> Vec<PlayerRecord> {
        let mut roster: Vec<PlayerRecord> = self.players.values().cloned().collect();
        roster.sort_by_key(|p| p.joined_at());
        roster
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn online_count(&self) -> usize {
        self.players.values().filter(|p| p.is_online()).count()
    }

    pub fn game_log(&self) -> &[LogEntry] {
        &self.game_log
    }

    pub fn game_state(&self) -> &Map<String, Value> {
        &self.game_state
    }

    pub fn gm_notes(&self) -> Option<&Value> {
        self.gm_notes.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted
    }

    /// Connection holding a record, if any.
    pub fn holder(&self, player_id: PlayerId) -> Option<ConnectionId> {
        self.holders.get(&player_id).copied()
    }

    pub fn is_held_by(&self, player_id: PlayerId, connection_id: ConnectionId) -> bool {
        self.holder(player_id) == Some(connection_id)
    }

    /// True when some master record is online.
    pub fn has_live_master(&self) -> bool {
        self.players.values().any(PlayerRecord::is_live_master)
    }

    /// True when `master_id` points at an online record.
    pub fn master_online(&self) -> bool {
        self.master_id()
            .and_then(|id| self.players.get(&id))
            .is_some_and(PlayerRecord::is_online)
    }

    // =========================================================================
    // Activity
    // =========================================================================

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Every player offline and no activity for longer than `threshold`.
    pub fn is_idle(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.players.values().all(|p| !p.is_online()) && now - self.last_activity > threshold
    }

    pub fn mark_evicted(&mut self) {
        self.evicted = true;
    }

    // =========================================================================
    // Roster mutations
    // =========================================================================

    /// Add a master record and claim the master slot.
    pub fn join_as_master(
        &mut self,
        data: PlayerData,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, DomainError> {
        self.clear_stale_master();
        if self.has_live_master() {
            return Err(DomainError::master_already_present(&self.id));
        }
        let record = self.insert(data, PlayerRole::Master, now);
        self.master_id = Some(record.id());
        Ok(record)
    }

    /// Add a regular player record.
    pub fn join_as_player(&mut self, data: PlayerData, now: DateTime<Utc>) -> PlayerRecord {
        self.insert(data, PlayerRole::Player, now)
    }

    /// Legacy join: the master flag is granted only while the slot is free.
    pub fn join_with_master_request(
        &mut self,
        data: PlayerData,
        wants_master: bool,
        now: DateTime<Utc>,
    ) -> PlayerRecord {
        if wants_master {
            if let Ok(record) = self.join_as_master(data.clone(), now) {
                return record;
            }
        }
        self.join_as_player(data, now)
    }

    /// Bring an existing record back online.
    ///
    /// Idempotent for a given id. A master record may only come back while no
    /// other master is online; it then reclaims the master slot.
    pub fn rejoin(
        &mut self,
        player_id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, DomainError> {
        self.clear_stale_master();
        let is_master = self
            .players
            .get(&player_id)
            .ok_or_else(|| DomainError::player_not_found(&self.id, player_id))?
            .is_master();

        if is_master {
            let other_live_master = self
                .players
                .values()
                .any(|p| p.is_live_master() && p.id() != player_id);
            if other_live_master {
                return Err(DomainError::master_already_present(&self.id));
            }
            self.master_id = Some(player_id);
        }

        self.touch(now);
        let record = self
            .players
            .get_mut(&player_id)
            .ok_or_else(|| DomainError::player_not_found(&self.id, player_id))?;
        record.set_online(true);
        Ok(record.clone())
    }

    /// Hand a record to a connection, replacing any previous holder.
    pub fn hold(&mut self, player_id: PlayerId, connection_id: ConnectionId) {
        if self.players.contains_key(&player_id) {
            self.holders.insert(player_id, connection_id);
        }
    }

    /// Take a record offline on behalf of its holder.
    ///
    /// Returns `None` and leaves the record alone when another connection has
    /// taken it over since.
    pub fn release(
        &mut self,
        player_id: PlayerId,
        connection_id: ConnectionId,
        now: DateTime<Utc>,
    ) -> Option<PlayerRecord> {
        if !self.is_held_by(player_id, connection_id) {
            return None;
        }
        self.holders.remove(&player_id);
        self.mark_offline(player_id, now)
    }

    /// Mark a record offline. The record and its data stay in the roster.
    pub fn mark_offline(&mut self, player_id: PlayerId, now: DateTime<Utc>) -> Option<PlayerRecord> {
        let record = self.players.get_mut(&player_id)?;
        record.set_online(false);
        let record = record.clone();
        self.touch(now);
        Some(record)
    }

    /// Shallow-merge character attributes into a record.
    pub fn merge_character(
        &mut self,
        player_id: PlayerId,
        patch: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Option<PlayerRecord> {
        let record = self.players.get_mut(&player_id)?;
        record.merge_character(patch);
        let record = record.clone();
        self.touch(now);
        Some(record)
    }

    /// Overwrite descriptive fields of a record.
    pub fn update_player_fields(
        &mut self,
        player_id: PlayerId,
        update: PlayerFieldsUpdate,
        now: DateTime<Utc>,
    ) -> Option<PlayerRecord> {
        let record = self.players.get_mut(&player_id)?;
        record.apply_fields(update);
        let record = record.clone();
        self.touch(now);
        Some(record)
    }

    // =========================================================================
    // Game state and log
    // =========================================================================

    /// Record a `gameStateUpdate`: keyed state write and, for logged types, a
    /// log entry. Returns the appended entry.
    pub fn record_game_state_update(
        &mut self,
        payload: &Value,
        now: DateTime<Utc>,
    ) -> Option<LogEntry> {
        self.touch(now);

        if let (Some(key), Some(value)) = (
            payload.get("key").and_then(Value::as_str),
            payload.get("value"),
        ) {
            self.game_state.insert(key.to_string(), value.clone());
        }

        let entry = LogEntry::from_game_state_update(payload, now)?;
        self.game_log.push(entry.clone());
        Some(entry)
    }

    /// Append a legacy chat/game message to the log.
    pub fn record_legacy_message(
        &mut self,
        author: Option<&str>,
        payload: &Value,
        now: DateTime<Utc>,
    ) -> LogEntry {
        self.touch(now);
        let entry = LogEntry::legacy_message(author, payload, now);
        self.game_log.push(entry.clone());
        entry
    }

    /// Replace the GM notes wholesale.
    pub fn set_gm_notes(&mut self, notes: Value, now: DateTime<Utc>) {
        self.gm_notes = Some(notes);
        self.touch(now);
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Active-session row, `None` when nobody is online.
    pub fn summary(&self) -> Option<SessionSummary> {
        let online = self.online_count();
        if online == 0 {
            return None;
        }
        Some(SessionSummary {
            session_id: self.id.clone(),
            online_player_count: online,
            has_master: self.master_online(),
            created_at: self.created_at,
        })
    }

    pub fn overview(&self) -> SessionOverview {
        let master = self.master_id().and_then(|id| self.players.get(&id));
        SessionOverview {
            id: self.id.clone(),
            player_count: self.online_count(),
            total_players: self.players.len(),
            created_at: self.created_at,
            has_master: master.is_some_and(PlayerRecord::is_online),
            master_name: master.map(|m| m.name().to_string()),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn insert(&mut self, data: PlayerData, role: PlayerRole, now: DateTime<Utc>) -> PlayerRecord {
        let record = PlayerRecord::new(data, role, now);
        self.players.insert(record.id(), record.clone());
        self.touch(now);
        record
    }

    fn clear_stale_master(&mut self) {
        if let Some(id) = self.master_id {
            if !self.players.contains_key(&id) {
                self.master_id = None;
            }
        }
    }
}
