//! Rinascimento Engine - Main entry point.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rinascimento_engine::api::{self, websocket::WsState, ConnectionManager};
use rinascimento_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::ServerConfig,
    janitor::Janitor,
    ports::{ClockPort, RandomPort},
};
use rinascimento_engine::stores::SessionStore;
use rinascimento_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may be started from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rinascimento_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Rinascimento Engine");

    let config = ServerConfig::from_env()?;

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());
    let sessions = Arc::new(SessionStore::new(clock, random));

    let connections = Arc::new(ConnectionManager::new());
    let app = Arc::new(App::new(sessions.clone(), connections.clone()));
    let ws_state = Arc::new(WsState {
        app: app.clone(),
        connections,
    });

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();
    setup_shutdown_signal(cancel.clone());

    // Spawn idle-session janitor
    let janitor = Janitor::new(sessions, config.sweep_interval, config.idle_threshold())
        .spawn(cancel.clone());

    // Build router with separate states for HTTP and WebSocket
    let mut router = api::http::routes()
        .with_state(app)
        .route("/ws", get(api::websocket::ws_handler).with_state(ws_state))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(config.cors_allowed_origins.as_deref()) {
        router = router.layer(cors);
    }

    // Start server
    let addr = config.resolve_addr().await?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = cancel.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        shutdown.cancelled().await;
        tracing::info!("HTTP server received shutdown signal");
    });

    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
    }

    cancel.cancel();
    if let Err(e) = janitor.await {
        tracing::warn!(error = %e, "Session janitor ended abnormally");
    }
    tracing::info!("Rinascimento Engine stopped");

    Ok(())
}

/// Cancels `cancel_token` on SIGINT or SIGTERM.
fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        cancel_token.cancel();
    });
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins.map(str::trim).filter(|s| !s.is_empty())?;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
