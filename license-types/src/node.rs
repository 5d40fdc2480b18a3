//! Registered nodes, one entry per live instance of a licensed application.

use serde::{Deserialize, Serialize};

use crate::machine::MachineInfo;

/// A single registered instance of a licensed application.
///
/// Created on successful registration, its `last_heartbeat_time_ms` is
/// bumped on every heartbeat (and on idempotent re-registration), and it is
/// destroyed on unregister or sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Server-generated opaque id (32 lowercase hex chars).
    #[serde(rename = "nodeId")]
    pub node_id: String,
    /// The license token this node registered under.
    #[serde(rename = "licenseCode")]
    pub license_code: String,
    /// Fingerprint of the machine that registered.
    #[serde(rename = "machineInfo")]
    pub machine_info: MachineInfo,
    /// Milliseconds since epoch at first registration.
    #[serde(rename = "registerTime")]
    pub register_time_ms: i64,
    /// Milliseconds since epoch of the most recent heartbeat (or
    /// re-registration).
    #[serde(rename = "lastHeartbeatTime")]
    pub last_heartbeat_time_ms: i64,
}

impl NodeInfo {
    /// True if this node has gone silent for longer than `timeout_ms`.
    ///
    /// A node exactly at the threshold is kept; strictly past it is stale.
    #[must_use]
    pub fn is_stale_at(&self, now_ms: i64, timeout_ms: i64) -> bool {
        now_ms - self.last_heartbeat_time_ms > timeout_ms
    }
}
