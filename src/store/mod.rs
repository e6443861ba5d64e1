//! Topology store abstraction.
//!
//! The engine never persists anything itself: snapshots, snapshot patterns
//! and use-case sources are fetched from (and candidates written back to) a
//! [`TopologyStore`]. Two implementations ship with the crate:
//!
//! - [`FsStore`]: a directory tree of JSON/YAML files, used by the CLI
//! - [`MemoryStore`]: an in-process map, used by tests and embedders

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::topology::Networks;

/// One derived (simulated-failure) snapshot generated from a physical one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPattern {
    pub source_snapshot_name: String,
    pub target_snapshot_name: String,
    #[serde(default)]
    pub lost_edges: Vec<Value>,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// External store of topology snapshots and use-case data
///
/// Every fetch of a missing key fails with `NotFound`; any other failure is
/// reported as it happened, without retry.
pub trait TopologyStore: Send + Sync {
    /// RFC 8345 topology data of a snapshot
    fn fetch_topology(&self, network: &str, snapshot: &str) -> Result<Value>;

    /// Create or overwrite a snapshot; returns the stored value
    fn store_topology(&self, network: &str, snapshot: &str, data: Value) -> Result<Value>;

    /// Derived snapshots generated from a physical snapshot
    fn fetch_snapshot_patterns(&self, network: &str, snapshot: &str) -> Result<Vec<SnapshotPattern>>;

    /// Use-case parameters or flow data
    fn fetch_usecase_source(&self, usecase: &str, network: &str, source_key: &str) -> Result<Value>;

    /// Fetch a snapshot and build a fresh graph from it
    fn load_networks(&self, network: &str, snapshot: &str) -> Result<Networks> {
        Networks::load(&self.fetch_topology(network, snapshot)?)
    }

    /// Serialize a graph and store it as a snapshot
    fn save_networks(&self, network: &str, snapshot: &str, networks: &Networks) -> Result<Value> {
        self.store_topology(network, snapshot, networks.to_data()?)
    }
}
