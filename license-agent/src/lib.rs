//! Client-side lifecycle controller for the license fabric.
//!
//! An [`AgentHandle`] owns everything a running agent needs: the verified
//! token state, the offline cache, and the heartbeat task. There is no
//! process-wide singleton, an embedding application holds the `Arc` it
//! got back from [`AgentHandle::start`] for as long as it needs licensing
//! enforced, and calls [`AgentHandle::shutdown`] when done.

pub mod anti_tamper;
pub mod config;
pub mod controller;
pub mod fingerprint;
pub mod transport;

pub use anti_tamper::AntiTamper;
pub use config::AgentConfig;
pub use controller::{AgentHandle, AgentStatus};
pub use transport::{Outcome, Transport};
