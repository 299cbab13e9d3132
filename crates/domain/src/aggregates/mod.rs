//! Aggregates - consistency boundaries guarded by a single lock in the engine.

pub mod session;

pub use session::{Session, SessionOverview, SessionSummary};
