//! Application state and composition.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::infrastructure::ports::OutboxPort;
use crate::stores::SessionStore;
use crate::use_cases::RelayEngine;

/// Main application state.
///
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub sessions: Arc<SessionStore>,
    pub relay: RelayEngine,
    started_at: Instant,
}

impl App {
    pub fn new(sessions: Arc<SessionStore>, outbox: Arc<dyn OutboxPort>) -> Self {
        Self {
            relay: RelayEngine::new(sessions.clone(), outbox),
            sessions,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
