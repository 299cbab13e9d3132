//! HTTP routes.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use rinascimento_domain::SessionOverview;

use crate::app::App;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/sessions", get(list_sessions))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

async fn health(State(app): State<Arc<App>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: app.sessions.len(),
        uptime_seconds: app.uptime().as_secs(),
        timestamp: app.sessions.now(),
    })
}

async fn list_sessions(State(app): State<Arc<App>>) -> Json<Vec<SessionOverview>> {
    Json(app.sessions.overview().await)
}
