//! Delivery plans returned by relay handlers.
//!
//! Handlers decide who receives what while they hold the session lock and
//! hand the plan to the outbox before releasing it.

use serde_json::Value;

use rinascimento_domain::{ConnectionId, SessionId};
use rinascimento_shared::ServerMessage;

#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    /// The connection that sent the triggering event
    Sender,
    /// Every connection attached to the session, optionally minus one
    Session {
        session_id: SessionId,
        except: Option<ConnectionId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub message: ServerMessage,
}

/// Ordered list of outbound messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fanout {
    messages: Vec<Outbound>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plan with a single reply to the sender.
    pub fn reply(message: ServerMessage) -> Self {
        let mut fanout = Self::new();
        fanout.reply_to_sender(message);
        fanout
    }

    pub fn reply_to_sender(&mut self, message: ServerMessage) {
        self.messages.push(Outbound {
            recipient: Recipient::Sender,
            message,
        });
    }

    /// Whole room, sender included.
    pub fn broadcast(&mut self, session_id: &SessionId, message: ServerMessage) {
        self.messages.push(Outbound {
            recipient: Recipient::Session {
                session_id: session_id.clone(),
                except: None,
            },
            message,
        });
    }

    /// Room minus the given connection.
    pub fn broadcast_except(
        &mut self,
        session_id: &SessionId,
        except: ConnectionId,
        message: ServerMessage,
    ) {
        self.messages.push(Outbound {
            recipient: Recipient::Session {
                session_id: session_id.clone(),
                except: Some(except),
            },
            message,
        });
    }

    /// Legacy `ack` reply; dropped when the request carried no id.
    pub fn ack(&mut self, request_id: Option<String>, response: Value) {
        match request_id {
            Some(request_id) => self.reply_to_sender(ServerMessage::Ack {
                request_id,
                response,
            }),
            None => tracing::debug!("Legacy request without requestId, reply dropped"),
        }
    }

    /// Queue another plan's messages after this one's.
    pub fn append(&mut self, other: Fanout) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[Outbound] {
        &self.messages
    }

    /// Messages addressed to the sender, in order.
    pub fn replies(&self) -> impl Iterator<Item = &ServerMessage> {
        self.messages
            .iter()
            .filter(|out| out.recipient == Recipient::Sender)
            .map(|out| &out.message)
    }
}

impl IntoIterator for Fanout {
    type Item = Outbound;
    type IntoIter = std::vec::IntoIter<Outbound>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}
