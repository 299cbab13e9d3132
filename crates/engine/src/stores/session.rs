//! Session registry.
//!
//! Maps `SessionId` to a shared `Session`. Each session sits behind its own
//! async mutex; handlers hold that lock for the whole read-modify-write of one
//! event so the master slot and log order are decided one event at a time.
//! The map itself is a `DashMap`, so creating one session never blocks
//! traffic in another.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use rinascimento_domain::{Session, SessionId, SessionOverview, SessionSummary};

use crate::infrastructure::ports::{ClockPort, RandomPort};

/// Length of the random part of a session id.
const SESSION_SUFFIX_LEN: usize = 9;

/// Shared, lockable session.
pub type SessionHandle = Arc<Mutex<Session>>;

pub struct SessionStore {
    sessions: DashMap<SessionId, SessionHandle>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn ClockPort>, random: Arc<dyn RandomPort>) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
            random,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Allocate a fresh, empty session. Never fails; an id collision just
    /// draws a new suffix.
    pub fn create(&self) -> SessionId {
        loop {
            let id = SessionId::from_suffix(&self.random.alphanumeric(SESSION_SUFFIX_LEN));
            match self.sessions.entry(id.clone()) {
                Entry::Occupied(_) => {
                    tracing::debug!(session_id = %id, "Session id collision, regenerating");
                }
                Entry::Vacant(slot) => {
                    let session = Session::new(id.clone(), self.clock.now());
                    slot.insert(Arc::new(Mutex::new(session)));
                    tracing::info!(session_id = %id, "Session created");
                    return id;
                }
            }
        }
    }

    pub fn get(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    /// Lock a live session. Returns `None` for unknown ids and for sessions
    /// evicted while the caller was waiting on the lock.
    pub async fn lock(&self, session_id: &SessionId) -> Option<OwnedMutexGuard<Session>> {
        let handle = self.get(session_id)?;
        let session = handle.lock_owned().await;
        if session.is_evicted() {
            return None;
        }
        Some(session)
    }

    /// Record activity on a session without any other change.
    pub async fn touch(&self, session_id: &SessionId) -> bool {
        let now = self.clock.now();
        match self.lock(session_id).await {
            Some(mut session) => {
                session.touch(now);
                true
            }
            None => false,
        }
    }

    /// Remove every session with nobody online and no activity for longer
    /// than `idle_threshold`. Returns the evicted ids.
    pub async fn sweep(
        &self,
        now: DateTime<Utc>,
        idle_threshold: chrono::Duration,
    ) -> Vec<SessionId> {
        let mut evicted = Vec::new();

        for (session_id, handle) in self.handles() {
            let mut session = handle.lock().await;
            if session.is_evicted() || !session.is_idle(now, idle_threshold) {
                continue;
            }
            session.mark_evicted();
            self.sessions
                .remove_if(&session_id, |_, current| Arc::ptr_eq(current, &handle));
            tracing::info!(
                session_id = %session_id,
                last_activity = %session.last_activity(),
                "Session evicted after inactivity"
            );
            evicted.push(session_id);
        }

        evicted
    }

    /// Sessions with at least one online player, newest first.
    pub async fn list_summaries(&self) -> Vec<SessionSummary> {
        let mut summaries = Vec::new();
        for (_, handle) in self.handles() {
            let session = handle.lock().await;
            if session.is_evicted() {
                continue;
            }
            if let Some(summary) = session.summary() {
                summaries.push(summary);
            }
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Every live session, newest first.
    pub async fn overview(&self) -> Vec<SessionOverview> {
        let mut rows = Vec::new();
        for (_, handle) in self.handles() {
            let session = handle.lock().await;
            if !session.is_evicted() {
                rows.push(session.overview());
            }
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of the map so no shard guard is held across an await.
    fn handles(&self) -> Vec<(SessionId, SessionHandle)> {
        self.sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
