//! # Topoconductor - Multi-layer network topology engine
//!
//! This library loads multi-layer network topologies (RFC 8345 JSON with
//! the `mddo-topology` augmentation), analyzes them, and synthesizes
//! modified topologies for offline verification and traffic-engineering
//! what-if analysis.
//!
//! ## Key Features
//!
//! - **Partition Analysis**: connected components ("network sets") per layer
//! - **Failure Impact Scoring**: diff of a physical snapshot against every
//!   snapshot derived from it by simulated link/node failures
//! - **Topology Splicing**: merge an external-AS topology into an internal
//!   one, binding BGP speakers and synthesizing layer-3 segments
//! - **BGP Policy Patching**: whole-group replacement of BGP-process
//!   attributes and preferred-peer marking
//! - **Candidate Synthesis**: policy-modified candidate snapshots, by simple
//!   prefix omission or by matching observed flows to a target bandwidth
//!
//! ## Architecture
//!
//! - `topology`: graph model, attribute records and integrity checks
//! - `analysis`: partition analyzer, diff scorer and reports
//! - `splice`: topology merger
//! - `bgp`: attribute patcher and preferred-peer detector
//! - `candidate`: candidate topology synthesizer and flow table
//! - `store`: snapshot store trait with directory and in-memory backends
//! - `config`: YAML configuration
//! - `utils`: IP prefix helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use topoconductor::analysis::subsets_diff;
//! use topoconductor::store::FsStore;
//!
//! let store = FsStore::new("store");
//! for diff in subsets_diff(&store, "mddo-ospf", "original_asis", "layer3", 1)? {
//!     println!("{}: {}", diff.target_snapshot, diff.score);
//! }
//! # Ok::<(), topoconductor::error::TopologyError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`error::Result`] carrying a
//! [`error::TopologyError`] whose [`error::ErrorKind`] callers can match on.
//! The binary wraps them with `color_eyre` context.

pub mod analysis;
pub mod bgp;
pub mod candidate;
pub mod config;
pub mod error;
pub mod splice;
pub mod store;
pub mod topology;
pub mod utils;

pub use error::{ErrorKind, Result, TopologyError};
