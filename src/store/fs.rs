//! Directory-backed store.
//!
//! Layout under the root directory:
//!
//! ```text
//! topologies/<network>/<snapshot>/topology.json
//! configs/<network>/<snapshot>/snapshot_patterns.json
//! usecases/<usecase>/<network>/<source_key>.json   (or .yaml / .yml)
//! ```

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{SnapshotPattern, TopologyStore};
use crate::error::{Result, TopologyError};

const TOPOLOGY_FILE: &str = "topology.json";
const SNAPSHOT_PATTERNS_FILE: &str = "snapshot_patterns.json";

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn topology_path(&self, network: &str, snapshot: &str) -> PathBuf {
        self.root
            .join("topologies")
            .join(network)
            .join(snapshot)
            .join(TOPOLOGY_FILE)
    }

    pub fn snapshot_patterns_path(&self, network: &str, snapshot: &str) -> PathBuf {
        self.root
            .join("configs")
            .join(network)
            .join(snapshot)
            .join(SNAPSHOT_PATTERNS_FILE)
    }

    fn usecase_dir(&self, usecase: &str, network: &str) -> PathBuf {
        self.root.join("usecases").join(usecase).join(network)
    }

    /// Store snapshot patterns (normally produced by the config-analysis backend)
    pub fn store_snapshot_patterns(
        &self,
        network: &str,
        snapshot: &str,
        patterns: &[SnapshotPattern],
    ) -> Result<()> {
        write_json(&self.snapshot_patterns_path(network, snapshot), patterns)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    if !path.is_file() {
        return Err(TopologyError::not_found(format!("{} ({})", what, path.display())));
    }
    debug!("Read {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    info!("Wrote {}", path.display());
    Ok(())
}

impl TopologyStore for FsStore {
    fn fetch_topology(&self, network: &str, snapshot: &str) -> Result<Value> {
        read_json(
            &self.topology_path(network, snapshot),
            &format!("topology {}/{}", network, snapshot),
        )
    }

    fn store_topology(&self, network: &str, snapshot: &str, data: Value) -> Result<Value> {
        write_json(&self.topology_path(network, snapshot), &data)?;
        Ok(data)
    }

    fn fetch_snapshot_patterns(&self, network: &str, snapshot: &str) -> Result<Vec<SnapshotPattern>> {
        read_json(
            &self.snapshot_patterns_path(network, snapshot),
            &format!("snapshot patterns of {}/{}", network, snapshot),
        )
    }

    fn fetch_usecase_source(&self, usecase: &str, network: &str, source_key: &str) -> Result<Value> {
        let dir = self.usecase_dir(usecase, network);
        let json_path = dir.join(format!("{}.json", source_key));
        if json_path.is_file() {
            return read_json(&json_path, source_key);
        }
        for ext in ["yaml", "yml"] {
            let yaml_path = dir.join(format!("{}.{}", source_key, ext));
            if yaml_path.is_file() {
                debug!("Read {}", yaml_path.display());
                let file = File::open(&yaml_path)?;
                return Ok(serde_yaml::from_reader(file)?);
            }
        }
        Err(TopologyError::not_found(format!(
            "usecase source {}/{}/{} ({})",
            usecase,
            network,
            source_key,
            dir.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_topology_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        let data = json!({"ietf-network:networks": {"network": [{"network-id": "layer3"}]}});

        let err = store.fetch_topology("nw", "ss").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);

        store.store_topology("nw", "ss", data.clone()).unwrap();
        assert!(store.topology_path("nw", "ss").is_file());
        assert_eq!(store.fetch_topology("nw", "ss").unwrap(), data);
    }

    #[test]
    fn test_snapshot_patterns() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        let patterns = vec![SnapshotPattern {
            source_snapshot_name: "original".to_string(),
            target_snapshot_name: "original_linkdown_01".to_string(),
            lost_edges: vec![json!({"node1": {"hostname": "r1"}})],
            description: "link down".to_string(),
            extra: Default::default(),
        }];
        store.store_snapshot_patterns("nw", "original", &patterns).unwrap();
        assert_eq!(store.fetch_snapshot_patterns("nw", "original").unwrap(), patterns);
    }

    #[test]
    fn test_usecase_source_yaml_and_json() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        let usecase_dir = dir.path().join("usecases/pni_te/nw");
        fs::create_dir_all(&usecase_dir).unwrap();
        fs::write(usecase_dir.join("params.yaml"), "source_as:\n  asn: 65550\n").unwrap();
        fs::write(usecase_dir.join("flows.json"), r#"[{"source": "a", "dest": "b", "rate": 1.5}]"#)
            .unwrap();

        let params = store.fetch_usecase_source("pni_te", "nw", "params").unwrap();
        assert_eq!(params["source_as"]["asn"], json!(65550));
        let flows = store.fetch_usecase_source("pni_te", "nw", "flows").unwrap();
        assert_eq!(flows[0]["rate"], json!(1.5));
        assert!(store.fetch_usecase_source("pni_te", "nw", "missing").is_err());
    }
}
