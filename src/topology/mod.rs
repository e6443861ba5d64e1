//! Multi-layer topology module.
//!
//! This module contains the layered graph model (networks/layers, nodes,
//! term-points, links and cross-layer support references), the per-layer
//! attribute schemas and the integrity checks run over assembled snapshots.

pub mod attributes;
pub mod integrity;
pub mod types;

// Re-export key types for easier access
pub use attributes::{NetworkType, NodeAttribute, TermPointAttribute};
pub use types::{
    Link, Network, Networks, Node, SupportingNode, SupportingTermPoint, TermPoint, TpPath,
};

use crate::error::Result;

/// Physical / L3 layer name
pub const LAYER3: &str = "layer3";
/// BGP-process layer name
pub const BGP_PROC: &str = "bgp_proc";
/// External-AS peering layer name
pub const BGP_AS: &str = "bgp_as";

impl Networks {
    /// Check support references and link endpoints; see [`integrity::verify`]
    pub fn verify(&self) -> Result<()> {
        integrity::verify(self)
    }
}
