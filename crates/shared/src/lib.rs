//! Rinascimento Protocol - Shared types for the relay and its clients
//!
//! - WebSocket message types (`ClientMessage`, `ServerMessage`)
//! - Legacy request/response payloads
//! - Protocol error codes
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json, chrono and the domain crate
//! 2. **No business logic** - Pure data types and serialization

pub mod legacy;
pub mod messages;
pub mod responses;

pub use legacy::{
    legacy_error, legacy_ok, request_id_of, LegacyCreateSession, LegacyJoinSession,
    LegacyUpdatePlayer,
};
pub use messages::{ClientMessage, ServerMessage};
pub use responses::ErrorCode;
