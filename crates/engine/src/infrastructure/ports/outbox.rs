//! Delivery port for relay handlers.

use rinascimento_domain::ConnectionId;

use crate::use_cases::{ConnectionBinding, Fanout};

/// Where handlers publish binding changes and hand off delivery plans.
///
/// Handlers call both while they hold the session lock, so room membership
/// and delivery order follow the order in which the session was mutated.
/// Implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait OutboxPort: Send + Sync {
    /// Replace the stored binding of `binding.connection_id`.
    fn publish(&self, binding: &ConnectionBinding);

    /// Deliver a plan on behalf of `sender`, in order.
    fn deliver(&self, sender: ConnectionId, fanout: &Fanout);
}
