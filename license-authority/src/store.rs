//! Durable state for the node registry and the license-record registry.
//!
//! Each registry lives fully in memory and is backed by one JSON file.
//! Every mutation except heartbeat triggers a full-snapshot atomic write:
//! write `file.tmp`, fsync it, then rename over `file`. A crash between the
//! write and the rename leaves the previous committed file untouched.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use license_types::{LicenseRecord, NodeInfo};
use tracing::{error, warn};

fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!(path = %parent.display(), error = %e, "failed to create persistence directory");
            return;
        }
    }

    let tmp_path = path.with_extension("tmp");
    let result = (|| -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if let Err(e) = result {
        error!(path = %path.display(), error = %e, "failed to persist state snapshot");
    }
}

fn load_json<T: serde::de::DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "persisted file is unreadable, starting empty");
                T::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read persisted file, starting empty");
            T::default()
        }
    }
}

/// The node registry: `nodeId -> NodeInfo`, plus a reverse index from
/// `licenseCode` to an ordered list of `nodeId`s bound under it.
///
/// The reverse index is never persisted; it is rebuilt from the node table
/// on every load.
pub struct NodeStore {
    path: PathBuf,
    nodes: HashMap<String, NodeInfo>,
    by_license: HashMap<String, Vec<String>>,
}

impl NodeStore {
    /// Loads the node store from `path`, dropping any node whose last
    /// heartbeat is more than `node_timeout_ms` old and rewriting the file
    /// immediately if anything was dropped.
    pub fn load(path: impl Into<PathBuf>, now_ms: i64, node_timeout_ms: i64) -> Self {
        let path = path.into();
        let loaded: Vec<NodeInfo> = load_json(&path);

        let mut nodes = HashMap::new();
        let mut dropped = 0usize;
        for node in loaded {
            if node.is_stale_at(now_ms, node_timeout_ms) {
                dropped += 1;
                continue;
            }
            nodes.insert(node.node_id.clone(), node);
        }

        let mut store = Self {
            path,
            nodes,
            by_license: HashMap::new(),
        };
        store.rebuild_index();

        if dropped > 0 {
            warn!(dropped, "dropped stale nodes on recovery");
            store.persist();
        }

        store
    }

    fn rebuild_index(&mut self) {
        self.by_license.clear();
        for node in self.nodes.values() {
            self.by_license
                .entry(node.license_code.clone())
                .or_default()
                .push(node.node_id.clone());
        }
    }

    fn persist(&self) {
        let mut snapshot: Vec<&NodeInfo> = self.nodes.values().collect();
        snapshot.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        atomic_write_json(&self.path, &snapshot);
    }

    /// Nodes currently bound under `license_code`, in registration order.
    #[must_use]
    pub fn nodes_for_license(&self, license_code: &str) -> Vec<&NodeInfo> {
        self.by_license
            .get(license_code)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    #[must_use]
    pub fn get(&self, node_id: &str) -> Option<&NodeInfo> {
        self.nodes.get(node_id)
    }

    #[must_use]
    pub fn license_count(&self) -> usize {
        self.by_license.len()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All live nodes, for listing endpoints.
    pub fn all(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.values()
    }

    /// Inserts or replaces a node, persisting the full snapshot afterward.
    pub fn upsert(&mut self, node: NodeInfo) {
        if !self.nodes.contains_key(&node.node_id) {
            self.by_license
                .entry(node.license_code.clone())
                .or_default()
                .push(node.node_id.clone());
        }
        self.nodes.insert(node.node_id.clone(), node);
        self.persist();
    }

    /// Updates `last_heartbeat_time_ms` on an existing node without
    /// touching disk. Returns `false` if the node does not exist.
    #[must_use]
    pub fn touch_heartbeat(&mut self, node_id: &str, now_ms: i64) -> bool {
        match self.nodes.get_mut(node_id) {
            Some(node) => {
                node.last_heartbeat_time_ms = now_ms;
                true
            }
            None => false,
        }
    }

    /// Removes a node from both maps; a no-op (but still persists) if
    /// `node_id` is unknown, matching the idempotent `unregister` contract.
    pub fn remove(&mut self, node_id: &str) {
        if let Some(node) = self.nodes.remove(node_id) {
            if let Some(ids) = self.by_license.get_mut(&node.license_code) {
                ids.retain(|id| id != node_id);
                if ids.is_empty() {
                    self.by_license.remove(&node.license_code);
                }
            }
        }
        self.persist();
    }

    /// Node ids whose last heartbeat is strictly older than `node_timeout_ms`.
    #[must_use]
    pub fn stale_node_ids(&self, now_ms: i64, node_timeout_ms: i64) -> Vec<String> {
        self.nodes
            .values()
            .filter(|n| n.is_stale_at(now_ms, node_timeout_ms))
            .map(|n| n.node_id.clone())
            .collect()
    }
}

/// The license-record registry: an ordered, append-mostly list of minted
/// tokens, persisted as a single JSON array.
pub struct LicenseStore {
    path: PathBuf,
    records: Vec<LicenseRecord>,
}

impl LicenseStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = load_json(&path);
        Self { path, records }
    }

    fn persist(&self) {
        atomic_write_json(&self.path, &self.records);
    }

    pub fn insert(&mut self, record: LicenseRecord) {
        self.records.push(record);
        self.persist();
    }

    /// Removes the record with the given id. Returns `true` if it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = self.records.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LicenseRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn all(&self) -> &[LicenseRecord] {
        &self.records
    }
}
