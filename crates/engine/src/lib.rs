//! Rinascimento Engine library.
//!
//! Real-time relay for shared tabletop sessions: an in-memory session
//! registry, a WebSocket event relay and a periodic idle-session janitor.
//!
//! ## Structure
//!
//! - `stores/` - Session registry keyed by session id
//! - `use_cases/` - Relay handlers turning client events into fan-out plans
//! - `infrastructure/` - Clock/random ports, configuration, janitor task
//! - `api/` - HTTP status routes and the WebSocket entry point
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
