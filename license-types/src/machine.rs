//! Machine fingerprints and the identity-equality predicate used to decide
//! whether a re-registration is the same machine coming back.

use serde::{Deserialize, Serialize};

/// Fingerprint data collected for a single machine.
///
/// Collection of the underlying hardware identifiers is out of scope for
/// this crate; this type only carries whatever the
/// caller supplied and implements the registration identity-equality
/// predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInfo {
    /// Ordered IP addresses observed for this machine.
    #[serde(default, rename = "ipAddresses")]
    pub ip_addresses: Vec<String>,
    /// Ordered MAC addresses observed for this machine.
    #[serde(default, rename = "macAddresses")]
    pub mac_addresses: Vec<String>,
    /// Stable platform machine id (e.g. `/etc/machine-id` on Linux), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    /// Platform hardware UUID, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_uuid: Option<String>,
    /// Hostname at fingerprint collection time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl MachineInfo {
    /// Identity-equality used by the registration protocol: `machineId`
    /// equality wins if both sides present; otherwise any shared MAC address
    /// counts as the same machine; otherwise they are different machines.
    ///
    /// This is deliberately not `PartialEq`, structural equality (same IPs,
    /// same hostname, ...) is a different and stricter question than "is
    /// this the same machine re-registering".
    #[must_use]
    pub fn is_same_machine(&self, other: &MachineInfo) -> bool {
        if let (Some(a), Some(b)) = (&self.machine_id, &other.machine_id) {
            return a == b;
        }
        self.mac_addresses
            .iter()
            .any(|mac| other.mac_addresses.contains(mac))
    }
}
