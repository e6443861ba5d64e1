use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::candidate::{DEFAULT_MAX_BANDWIDTH_BPS, DEFAULT_PREFIX_SET_PATTERN};
use crate::topology::LAYER3;

/// Top-level configuration structure that mirrors the YAML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub subsets: SubsetsConfig,
    #[serde(default)]
    pub candidates: CandidatesConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.general.log_level.to_lowercase();
        if !["error", "warn", "info", "debug", "trace", "off"].contains(&level.as_str()) {
            return Err(ConfigError::InvalidGeneral(format!(
                "unknown log_level: {}",
                self.general.log_level
            )));
        }

        if self.store.root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidStore("root cannot be empty".to_string()));
        }

        if self.subsets.layer.is_empty() {
            return Err(ConfigError::InvalidSubsets("layer cannot be empty".to_string()));
        }

        let bandwidth = self.candidates.default_max_bandwidth_bps;
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(ConfigError::InvalidCandidates(format!(
                "default_max_bandwidth_bps must be positive, got {}",
                bandwidth
            )));
        }
        let pattern = &self.candidates.prefix_set_pattern;
        if !pattern.contains("{asn}") {
            return Err(ConfigError::InvalidCandidates(format!(
                "prefix_set_pattern must contain {{asn}}: {}",
                pattern
            )));
        }
        regex::Regex::new(&pattern.replace("{asn}", "0")).map_err(|e| {
            ConfigError::InvalidCandidates(format!("prefix_set_pattern is not a regex: {}", e))
        })?;

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Directory of the file-backed topology store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

/// Defaults of the subsets / subsets-diff operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetsConfig {
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default)]
    pub min_score: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatesConfig {
    /// Used when the use case names no expected bandwidth (bps)
    #[serde(default = "default_max_bandwidth_bps")]
    pub default_max_bandwidth_bps: f64,
    /// Advertised prefix-set name; `{asn}` is the source AS number
    #[serde(default = "default_prefix_set_pattern")]
    pub prefix_set_pattern: String,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid store configuration: {0}")]
    InvalidStore(String),
    #[error("Invalid subsets configuration: {0}")]
    InvalidSubsets(String),
    #[error("Invalid candidates configuration: {0}")]
    InvalidCandidates(String),
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_root() -> PathBuf {
    PathBuf::from("store")
}

fn default_layer() -> String {
    LAYER3.to_string()
}

fn default_max_bandwidth_bps() -> f64 {
    DEFAULT_MAX_BANDWIDTH_BPS
}

fn default_prefix_set_pattern() -> String {
    DEFAULT_PREFIX_SET_PATTERN.to_string()
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

impl Default for SubsetsConfig {
    fn default() -> Self {
        Self {
            layer: default_layer(),
            min_score: 0,
        }
    }
}

impl Default for CandidatesConfig {
    fn default() -> Self {
        Self {
            default_max_bandwidth_bps: default_max_bandwidth_bps(),
            prefix_set_pattern: default_prefix_set_pattern(),
        }
    }
}

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config, ConfigError> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)?;
    // An empty file is a valid, all-default configuration
    let config: Option<Config> = serde_yaml::from_reader(file)?;
    let config = config.unwrap_or_default();

    config.validate()?;

    Ok(config)
}
