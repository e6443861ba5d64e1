use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use super::{SnapshotPattern, TopologyStore};
use crate::error::{Result, TopologyError};

type Key = (String, String);

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    topologies: RwLock<HashMap<Key, Value>>,
    patterns: RwLock<HashMap<Key, Vec<SnapshotPattern>>>,
    usecases: RwLock<HashMap<(String, String, String), Value>>,
}

fn key(a: &str, b: &str) -> Key {
    (a.to_string(), b.to_string())
}

fn poisoned<T>(_: T) -> TopologyError {
    TopologyError::Store("memory store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_snapshot_patterns(
        &self,
        network: &str,
        snapshot: &str,
        patterns: Vec<SnapshotPattern>,
    ) -> Result<()> {
        self.patterns
            .write()
            .map_err(poisoned)?
            .insert(key(network, snapshot), patterns);
        Ok(())
    }

    pub fn insert_usecase_source(
        &self,
        usecase: &str,
        network: &str,
        source_key: &str,
        data: Value,
    ) -> Result<()> {
        self.usecases.write().map_err(poisoned)?.insert(
            (usecase.to_string(), network.to_string(), source_key.to_string()),
            data,
        );
        Ok(())
    }

    /// Stored snapshot names of a network, sorted
    pub fn snapshots(&self, network: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .topologies
            .read()
            .map_err(poisoned)?
            .keys()
            .filter(|(nw, _)| nw == network)
            .map(|(_, ss)| ss.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

impl TopologyStore for MemoryStore {
    fn fetch_topology(&self, network: &str, snapshot: &str) -> Result<Value> {
        self.topologies
            .read()
            .map_err(poisoned)?
            .get(&key(network, snapshot))
            .cloned()
            .ok_or_else(|| TopologyError::not_found(format!("topology {}/{}", network, snapshot)))
    }

    fn store_topology(&self, network: &str, snapshot: &str, data: Value) -> Result<Value> {
        self.topologies
            .write()
            .map_err(poisoned)?
            .insert(key(network, snapshot), data.clone());
        Ok(data)
    }

    fn fetch_snapshot_patterns(&self, network: &str, snapshot: &str) -> Result<Vec<SnapshotPattern>> {
        self.patterns
            .read()
            .map_err(poisoned)?
            .get(&key(network, snapshot))
            .cloned()
            .ok_or_else(|| {
                TopologyError::not_found(format!("snapshot patterns of {}/{}", network, snapshot))
            })
    }

    fn fetch_usecase_source(&self, usecase: &str, network: &str, source_key: &str) -> Result<Value> {
        self.usecases
            .read()
            .map_err(poisoned)?
            .get(&(usecase.to_string(), network.to_string(), source_key.to_string()))
            .cloned()
            .ok_or_else(|| {
                TopologyError::not_found(format!("usecase source {}/{}/{}", usecase, network, source_key))
            })
    }
}
