//! Relay engine - the session protocol.
//!
//! Each handler takes the caller's [`ConnectionBinding`] plus the event
//! payload and mutates the session under its lock. Before releasing the lock
//! it publishes any binding change and hands its [`Fanout`] to the outbox,
//! so every connection in the room sees the session's changes in the order
//! they were made. The delivered plan is returned to the caller.
//!
//! Handlers never fail outright: protocol errors become `sessionError`
//! replies, and events from connections that are not bound (or bound to an
//! evicted session) are dropped.
//!
//! ```text
//! Unbound ──joinSession──────────────► Attached(session)
//!    │                                      │
//!    └──joinAsGameMaster / joinAsPlayer ────┴──► Joined(session, player, role)
//!       / rejoinSession                           │
//!                                       disconnect ▼
//!                                       (record stays, marked offline)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use rinascimento_domain::ConnectionId;
use rinascimento_shared::ServerMessage;

use crate::infrastructure::ports::OutboxPort;
use crate::stores::SessionStore;

mod binding;
mod fanout;
mod game;
mod join;
mod legacy;


pub use binding::ConnectionBinding;
pub use fanout::{Fanout, Outbound, Recipient};
pub use join::JoinError;

pub struct RelayEngine {
    sessions: Arc<SessionStore>,
    outbox: Arc<dyn OutboxPort>,
}

impl RelayEngine {
    pub fn new(sessions: Arc<SessionStore>, outbox: Arc<dyn OutboxPort>) -> Self {
        Self { sessions, outbox }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    fn now(&self) -> DateTime<Utc> {
        self.sessions.now()
    }

    /// Hand a plan to the outbox. Plans with room recipients must be
    /// delivered while the room's session lock is held.
    fn deliver(&self, sender: ConnectionId, fanout: Fanout) -> Fanout {
        if !fanout.is_empty() {
            self.outbox.deliver(sender, &fanout);
        }
        fanout
    }

    fn reply(&self, sender: ConnectionId, message: ServerMessage) -> Fanout {
        self.deliver(sender, Fanout::reply(message))
    }
}
