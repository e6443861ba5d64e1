//! BGP-process layer manipulation: policy patches and preferred-peer marking.

pub mod patch;
pub mod preferred;

pub use patch::{patch_nodes, NodePatch, PatchSummary, TermPointPatch};
pub use preferred::{detect_preferred_peer, PreferredPeer};
