use super::*;

use std::{net::SocketAddr, time::Duration};

use axum::routing::get;
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::infrastructure::clock::{FixedClock, SystemRandom};
use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::stores::SessionStore;

pub(crate) type TestWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub(crate) fn build_test_state(now: DateTime<Utc>) -> Arc<WsState> {
    let clock: Arc<dyn ClockPort> = Arc::new(FixedClock(now));
    let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());
    let sessions = Arc::new(SessionStore::new(clock, random));

    let connections = Arc::new(ConnectionManager::new());

    Arc::new(WsState {
        app: Arc::new(App::new(sessions, connections.clone())),
        connections,
    })
}

pub(crate) async fn spawn_ws_server(
    state: Arc<WsState>,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = axum::Router::new().route("/ws", get(ws_handler).with_state(state));

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

pub(crate) async fn ws_connect(addr: SocketAddr) -> TestWs {
    let url = format!("ws://{}/ws", addr);
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

pub(crate) async fn ws_send_client(ws: &mut TestWs, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json)).await.unwrap();
}

/// Send a hand-written frame, for wire shapes the typed enum cannot produce.
pub(crate) async fn ws_send_raw(ws: &mut TestWs, raw: serde_json::Value) {
    ws.send(WsMessage::Text(raw.to_string())).await.unwrap();
}

pub(crate) async fn ws_recv_server(ws: &mut TestWs) -> ServerMessage {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        match msg {
            WsMessage::Text(text) => {
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            WsMessage::Binary(bin) => {
                let text = String::from_utf8(bin).unwrap();
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            _ => {}
        }
    }
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut TestWs,
    timeout: Duration,
    mut predicate: F,
) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut TestWs,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerMessage) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                panic!("unexpected message: {:?}", msg);
            }
        }
    })
    .await;

    // We only succeed if we timed out without seeing a matching message.
    assert!(result.is_err());
}

/// Create a session over the socket and return its id.
pub(crate) async fn ws_create_session(ws: &mut TestWs) -> rinascimento_domain::SessionId {
    ws_send_client(ws, &ClientMessage::CreateSession).await;
    match ws_expect_message(ws, Duration::from_secs(2), |m| {
        matches!(m, ServerMessage::SessionCreated { .. })
    })
    .await
    {
        ServerMessage::SessionCreated { session_id, .. } => session_id,
        other => panic!("unexpected message: {other:?}"),
    }
}
