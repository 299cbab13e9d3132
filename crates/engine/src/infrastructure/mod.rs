//! Infrastructure implementations.
//!
//! Contains port trait implementations, environment configuration and the
//! background session janitor.

pub mod clock;
pub mod config;
pub mod janitor;
pub mod ports;
