//! Port traits for infrastructure boundaries.
//!
//! The relay keeps all state in memory. Time and randomness are injectable
//! for tests, and delivery goes through an outbox the transport implements.

mod outbox;
mod testing;

pub use outbox::OutboxPort;
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use outbox::MockOutboxPort;
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
