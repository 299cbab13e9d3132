//! WebSocket handling for relay clients.
//!
//! One task per socket: inbound frames are parsed and handled in order, and a
//! forwarding task drains the connection's outbound channel.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use rinascimento_domain::ConnectionId;
use rinascimento_shared::{ClientMessage, ErrorCode, ServerMessage};

use super::connections::ConnectionManager;
use crate::app::App;
use crate::use_cases::{ConnectionBinding, Fanout};

#[cfg(test)]
mod test_support;


/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = ConnectionId::new();

    // Bounded channel for messages to this client
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);

    state.connections.register(connection_id, tx.clone());

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize server message");
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientMessage::from_json(text.as_str()) {
                Ok(msg) => handle_message(msg, &state, connection_id).await,
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                    let error = ServerMessage::error(
                        ErrorCode::InvalidMessage,
                        format!("Invalid message format: {e}"),
                    );
                    if tx.try_send(error).is_err() {
                        tracing::warn!(
                            connection_id = %connection_id,
                            "Failed to send error, channel full or closed"
                        );
                    }
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up: the player record stays, marked offline
    if let Some(binding) = state.connections.unregister(connection_id) {
        state.app.relay.disconnect(binding).await;
    }
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Run one client message through the relay. The relay publishes binding
/// changes and delivers its replies itself.
async fn handle_message(msg: ClientMessage, state: &WsState, connection_id: ConnectionId) {
    let Some(mut binding) = state.connections.binding(connection_id) else {
        return;
    };
    let event = msg.event_name();

    tracing::debug!(connection_id = %connection_id, event, "Client message received");

    let delivered = dispatch(msg, state, &mut binding).await;

    tracing::trace!(
        connection_id = %connection_id,
        event,
        messages = delivered.len(),
        "Client message handled"
    );
}

/// Dispatch a parsed client message to the matching relay handler.
async fn dispatch(msg: ClientMessage, state: &WsState, binding: &mut ConnectionBinding) -> Fanout {
    let relay = &state.app.relay;

    match msg {
        // Sessions and presence
        ClientMessage::CreateSession => relay.create_session(binding),
        ClientMessage::JoinSession { session_id } => relay.join_session(binding, session_id).await,
        ClientMessage::JoinAsGameMaster {
            session_id,
            player_data,
        } => {
            relay
                .join_as_game_master(binding, session_id, player_data)
                .await
        }
        ClientMessage::JoinAsPlayer {
            session_id,
            player_data,
        } => relay.join_as_player(binding, session_id, player_data).await,
        ClientMessage::RejoinSession {
            session_id,
            player_id,
        } => relay.rejoin_session(binding, session_id, player_id).await,

        // Game traffic
        ClientMessage::CharacterUpdate { character } => {
            relay.character_update(binding, character).await
        }
        ClientMessage::GameStateUpdate(payload) => relay.game_state_update(binding, payload).await,
        ClientMessage::GetActiveSessions => relay.active_sessions(binding).await,
        ClientMessage::GmNotesUpdate { notes } => relay.gm_notes_update(binding, notes).await,

        // Connection lifecycle
        ClientMessage::MessageAck { message_id } => relay.message_ack(binding, message_id),
        ClientMessage::Ping => relay.ping(binding),
        ClientMessage::Heartbeat => relay.heartbeat(binding),

        // Legacy request/response
        ClientMessage::LegacyCreateSession(request) => {
            relay.legacy_create_session(binding, request).await
        }
        ClientMessage::LegacyJoinSession(request) => {
            relay.legacy_join_session(binding, request).await
        }
        ClientMessage::LegacyGameMessage(payload) => {
            relay.legacy_game_message(binding, payload).await
        }
        ClientMessage::LegacyUpdatePlayer(request) => {
            relay.legacy_update_player(binding, request).await
        }
    }
}
