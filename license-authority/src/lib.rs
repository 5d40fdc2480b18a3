//! Token issuance and fleet-wide node registration for the license fabric.
//!
//! [`engine`] holds the protocol logic (register/heartbeat/unregister/sweep)
//! behind a single writer lock; [`store`] is its durable backing state;
//! [`http`] wires both to an `axum` router; [`config`] is the CLI/env
//! surface the binary parses.

pub mod config;
pub mod engine;
pub mod http;
pub mod store;

pub use engine::{Engine, Stats};
pub use http::{build_router, AppState};
