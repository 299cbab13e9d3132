//! In-memory state storage modules.
//!
//! Stores manage runtime state that lives only as long as the process:
//! - `SessionStore` - session id to shared, lockable `Session`

pub mod session;

pub use session::{SessionHandle, SessionStore};
