//! Connection management for WebSocket clients.
//!
//! Tracks connected clients and their bindings, and delivers relay fanout
//! plans to the right sockets. Every operation is synchronous so the relay
//! can publish and deliver while it holds a session lock.

use dashmap::DashMap;
use tokio::sync::mpsc;

use rinascimento_domain::{ConnectionId, SessionId};
use rinascimento_shared::ServerMessage;

use crate::infrastructure::ports::OutboxPort;
use crate::use_cases::{ConnectionBinding, Fanout, Recipient};

/// Information about a connected client.
struct ConnectionEntry {
    binding: ConnectionBinding,
    sender: mpsc::Sender<ServerMessage>,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    connections: DashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new, unbound connection.
    pub fn register(&self, connection_id: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        let entry = ConnectionEntry {
            binding: ConnectionBinding::new(connection_id),
            sender,
        };
        self.connections.insert(connection_id, entry);
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Unregister a connection, returning its last binding.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<ConnectionBinding> {
        let removed = self
            .connections
            .remove(&connection_id)
            .map(|(_, entry)| entry.binding);
        if removed.is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
        removed
    }

    /// Get a connection's binding by ID.
    pub fn binding(&self, connection_id: ConnectionId) -> Option<ConnectionBinding> {
        self.connections
            .get(&connection_id)
            .map(|entry| entry.binding.clone())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Send a message to one connection.
    pub fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) {
        let Some(entry) = self.connections.get(&connection_id) else {
            return;
        };
        if let Err(e) = entry.sender.try_send(message) {
            tracing::warn!(
                connection_id = %connection_id,
                error = %e,
                "Failed to send message"
            );
        }
    }

    /// Broadcast a message to every connection in a session, optionally
    /// skipping one.
    pub fn broadcast_to_session(
        &self,
        session_id: &SessionId,
        except: Option<ConnectionId>,
        message: &ServerMessage,
    ) {
        for entry in self.connections.iter() {
            let binding = &entry.binding;
            if !binding.in_session(session_id) || Some(binding.connection_id) == except {
                continue;
            }
            if let Err(e) = entry.sender.try_send(message.clone()) {
                tracing::warn!(
                    connection_id = %binding.connection_id,
                    session_id = %session_id,
                    error = %e,
                    "Failed to broadcast message"
                );
            }
        }
    }
}

impl OutboxPort for ConnectionManager {
    /// Ignored if the connection is gone.
    fn publish(&self, binding: &ConnectionBinding) {
        if let Some(mut entry) = self.connections.get_mut(&binding.connection_id) {
            entry.binding = binding.clone();
        }
    }

    fn deliver(&self, sender: ConnectionId, fanout: &Fanout) {
        for outbound in fanout.messages() {
            match &outbound.recipient {
                Recipient::Sender => self.send_to(sender, outbound.message.clone()),
                Recipient::Session { session_id, except } => {
                    self.broadcast_to_session(session_id, *except, &outbound.message)
                }
            }
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
