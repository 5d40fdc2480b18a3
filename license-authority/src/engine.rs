//! The protocol engine: register / heartbeat / unregister / sweep, plus
//! minting and listing. All four registration-affecting operations run
//! under one writer lock held for the whole operation; reads take the same
//! lock briefly (there is no separate read path worth the complexity at
//! this scale).

use std::sync::atomic::{AtomicU64, Ordering};

use license_crypto::{verify, PrivateKey, PublicKey};
use license_types::{
    FabricError, FabricResult, LicenseRecord, MachineInfo, NodeInfo, TokenPayload,
    UnauthorizedReason,
};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::store::{LicenseStore, NodeStore};

#[must_use]
pub fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Point-in-time counters surfaced by `stats()`.
#[derive(Debug, Default)]
pub struct Counters {
    pub register: AtomicU64,
    pub heartbeat: AtomicU64,
    pub unregister: AtomicU64,
}

/// Snapshot of `Counters` plus derived registry sizes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Stats {
    #[serde(rename = "onlineNodeCount")]
    pub online_node_count: usize,
    #[serde(rename = "licenseCount")]
    pub license_count: usize,
    #[serde(rename = "registerCount")]
    pub register_count: u64,
    #[serde(rename = "heartbeatCount")]
    pub heartbeat_count: u64,
    #[serde(rename = "unregisterCount")]
    pub unregister_count: u64,
}

struct State {
    nodes: NodeStore,
    licenses: LicenseStore,
}

/// The authority's full mutable state plus the keys it mints/verifies with.
///
/// `private_key` is optional: an authority can run verify-only (e.g. a
/// read replica) without ever minting, in which case `mint` fails `CONFIG`.
pub struct Engine {
    state: Mutex<State>,
    counters: Counters,
    public_key: PublicKey,
    private_key: Option<PrivateKey>,
    node_timeout_ms: i64,
}

impl Engine {
    pub fn new(
        public_key: PublicKey,
        private_key: Option<PrivateKey>,
        node_store_path: impl Into<std::path::PathBuf>,
        license_store_path: impl Into<std::path::PathBuf>,
        node_timeout_ms: i64,
    ) -> Self {
        let now = wall_clock_ms();
        let nodes = NodeStore::load(node_store_path, now, node_timeout_ms);
        let licenses = LicenseStore::load(license_store_path);
        Self {
            state: Mutex::new(State { nodes, licenses }),
            counters: Counters::default(),
            public_key,
            private_key,
            node_timeout_ms,
        }
    }

    #[must_use]
    pub fn public_key_pem(&self) -> &str {
        self.public_key.pem_text()
    }

    /// Mints a new token and records it as a `LicenseRecord`.
    pub async fn mint(&self, payload: TokenPayload) -> FabricResult<LicenseRecord> {
        let license_code = license_crypto::mint(&payload, self.private_key.as_ref(), wall_clock_ms())?;
        let record = LicenseRecord {
            id: new_record_id(),
            subject: payload.subject.clone(),
            license_code,
            payload,
            create_time_ms: wall_clock_ms(),
        };
        let mut state = self.state.lock().await;
        state.licenses.insert(record.clone());
        Ok(record)
    }

    pub async fn list_licenses(&self) -> Vec<LicenseRecord> {
        let state = self.state.lock().await;
        state.licenses.all().to_vec()
    }

    /// Deletes a license record. Does not touch any nodes still registered
    /// under its code, that follows the normal heartbeat-timeout path.
    pub async fn delete_license(&self, id: &str) -> FabricResult<()> {
        let mut state = self.state.lock().await;
        if state.licenses.remove(id) {
            Ok(())
        } else {
            Err(FabricError::NotFound(id.to_string()))
        }
    }

    pub async fn list_nodes(&self) -> Vec<NodeInfo> {
        let state = self.state.lock().await;
        state.nodes.all().cloned().collect()
    }

    pub async fn register(
        &self,
        license_code: &str,
        machine_info: MachineInfo,
    ) -> FabricResult<String> {
        let payload = match verify(license_code, &self.public_key) {
            Ok(p) => p,
            Err(FabricError::Tampered(_)) => {
                return Err(FabricError::Unauthorized(UnauthorizedReason::BadSignature))
            }
            Err(FabricError::Format(_)) => {
                return Err(FabricError::Unauthorized(UnauthorizedReason::Format))
            }
            Err(e) => return Err(e),
        };

        let now = wall_clock_ms();
        if now > payload.expiry_time_ms {
            return Err(FabricError::Unauthorized(UnauthorizedReason::Expired));
        }
        if payload.is_not_yet_valid_at(now) {
            return Err(FabricError::Unauthorized(UnauthorizedReason::NotYetValid));
        }

        let mut state = self.state.lock().await;

        if let Some(mut existing) = state
            .nodes
            .nodes_for_license(license_code)
            .into_iter()
            .find(|n| n.machine_info.is_same_machine(&machine_info))
            .cloned()
        {
            existing.last_heartbeat_time_ms = now;
            let node_id = existing.node_id.clone();
            // Re-registration persists, unlike plain heartbeat, it is the
            // only way a restarted client's reclaimed slot survives a crash
            // before its next ordinary heartbeat.
            state.nodes.upsert(existing);
            self.counters.register.fetch_add(1, Ordering::Relaxed);
            return Ok(node_id);
        }

        let current = state.nodes.nodes_for_license(license_code).len() as u32;
        if current >= payload.max_machine_count {
            return Err(FabricError::Capacity {
                max: payload.max_machine_count,
                current,
            });
        }

        let node_id = Uuid::new_v4().simple().to_string();
        state.nodes.upsert(NodeInfo {
            node_id: node_id.clone(),
            license_code: license_code.to_string(),
            machine_info,
            register_time_ms: now,
            last_heartbeat_time_ms: now,
        });
        self.counters.register.fetch_add(1, Ordering::Relaxed);
        Ok(node_id)
    }

    pub async fn heartbeat(&self, node_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let now = wall_clock_ms();
        let ok = state.nodes.touch_heartbeat(node_id, now);
        if ok {
            self.counters.heartbeat.fetch_add(1, Ordering::Relaxed);
        }
        ok
    }

    pub async fn unregister(&self, node_id: &str) {
        let mut state = self.state.lock().await;
        state.nodes.remove(node_id);
        self.counters.unregister.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes every node whose heartbeat is stale, under the same writer
    /// lock used by register/heartbeat/unregister.
    pub async fn sweep(&self) {
        let mut state = self.state.lock().await;
        let now = wall_clock_ms();
        let stale = state.nodes.stale_node_ids(now, self.node_timeout_ms);
        for node_id in &stale {
            state.nodes.remove(node_id);
            self.counters.unregister.fetch_add(1, Ordering::Relaxed);
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "sweep removed stale nodes");
        }
    }

    pub async fn stats(&self) -> Stats {
        let state = self.state.lock().await;
        Stats {
            online_node_count: state.nodes.node_count(),
            license_count: state.nodes.license_count(),
            register_count: self.counters.register.load(Ordering::Relaxed),
            heartbeat_count: self.counters.heartbeat.load(Ordering::Relaxed),
            unregister_count: self.counters.unregister.load(Ordering::Relaxed),
        }
    }
}
