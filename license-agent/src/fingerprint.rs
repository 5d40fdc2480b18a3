//! Best-effort collection of the local machine fingerprint sent on
//! registration. Every field is collected independently; a field that
//! can't be determined on this platform is simply left absent rather than
//! failing the whole collection.

use license_types::MachineInfo;

/// Collects whatever fingerprint fields are available on the current
/// platform.
#[must_use]
pub fn collect() -> MachineInfo {
    MachineInfo {
        ip_addresses: Vec::new(),
        mac_addresses: Vec::new(),
        machine_id: machine_id(),
        system_uuid: None,
        hostname: Some(hostname()),
    }
}

fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reads the platform machine id, trying the common Linux locations in
/// order. Returns `None` on any other platform or if neither file exists.
fn machine_id() -> Option<String> {
    std::fs::read_to_string("/etc/machine-id")
        .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_always_returns_a_hostname() {
        let info = collect();
        assert!(info.hostname.is_some());
        assert_ne!(info.hostname.unwrap(), "");
    }
}
