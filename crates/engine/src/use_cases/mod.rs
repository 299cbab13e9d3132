//! Use cases - protocol orchestration.
//!
//! Each module turns one family of client events into session mutations and
//! a delivery plan handed to the outbox port. Nothing here touches sockets.

pub mod relay;

pub use relay::{ConnectionBinding, Fanout, JoinError, Outbound, Recipient, RelayEngine};
