//! Periodic eviction of idle sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::stores::SessionStore;

pub struct Janitor {
    sessions: Arc<SessionStore>,
    interval: Duration,
    idle_threshold: chrono::Duration,
}

impl Janitor {
    pub fn new(
        sessions: Arc<SessionStore>,
        interval: Duration,
        idle_threshold: chrono::Duration,
    ) -> Self {
        Self {
            sessions,
            interval,
            idle_threshold,
        }
    }

    /// One sweep at the store's current time. Returns how many sessions went.
    pub async fn run_once(&self) -> usize {
        let now = self.sessions.now();
        let evicted = self.sessions.sweep(now, self.idle_threshold).await;
        if !evicted.is_empty() {
            tracing::info!(
                evicted = evicted.len(),
                remaining = self.sessions.len(),
                "Janitor evicted idle sessions"
            );
        }
        evicted.len()
    }

    /// Sweep every `interval` until `cancel` fires. The first sweep happens
    /// one full interval after start.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + self.interval,
                self.interval,
            );
            tracing::info!(
                interval_secs = self.interval.as_secs(),
                idle_threshold_secs = self.idle_threshold.num_seconds(),
                "Session janitor started"
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Session janitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                }
            }
        })
    }
}
