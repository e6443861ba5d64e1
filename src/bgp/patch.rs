//! BGP-process attribute patcher.
//!
//! Each patch names a node (and optionally some of its term-points) and
//! carries attribute groups that replace the stored groups whole. Keys that
//! are not patchable groups are logged and skipped.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TopologyError};
use crate::topology::attributes::{
    BgpProcNodeGroup, BgpProcTermPointGroup, BGP_PROC_NODE_ATTR_KEY, BGP_PROC_TP_ATTR_KEY,
};
use crate::topology::{Networks, Node, BGP_PROC};

/// Patch for one term-point of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermPointPatch {
    #[serde(rename = "tp-id")]
    pub tp_id: String,
    #[serde(rename = "mddo-topology:bgp-proc-termination-point-attributes", default)]
    pub attribute: Option<Map<String, Value>>,
}

/// Patch for one node of the `bgp_proc` layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(rename = "node-id")]
    pub node_id: String,
    #[serde(rename = "mddo-topology:bgp-proc-node-attributes", default)]
    pub attribute: Option<Map<String, Value>>,
    #[serde(rename = "ietf-network-topology:termination-point", default)]
    pub term_points: Vec<TermPointPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchSummary {
    pub patched_nodes: usize,
    pub patched_term_points: usize,
    /// `<node>: <key>` or `<node>[<tp>]: <key>` of every skipped key
    pub skipped_keys: Vec<String>,
}

/// Apply node patches to the `bgp_proc` layer
///
/// The layer is only replaced when every patch applied, so a failing request
/// leaves the snapshot as it was.
pub fn patch_nodes(networks: &mut Networks, layer: &str, patches: &[NodePatch]) -> Result<PatchSummary> {
    if layer != BGP_PROC {
        return Err(TopologyError::validation(format!("Layer:{} is not have policy", layer)));
    }
    let mut network = networks.network(layer)?.clone();
    let mut summary = PatchSummary::default();

    for patch in patches {
        let node = network.find_node_mut(&patch.node_id).ok_or_else(|| {
            TopologyError::validation(format!("Node:{} is not found in {}", patch.node_id, layer))
        })?;
        patch_node(node, patch, &mut summary)?;
        summary.patched_nodes += 1;
    }

    networks.replace_network(network);
    debug!(
        "Patched {} nodes / {} term-points in {}",
        summary.patched_nodes, summary.patched_term_points, layer
    );
    Ok(summary)
}

fn patch_node(node: &mut Node, patch: &NodePatch, summary: &mut PatchSummary) -> Result<()> {
    let node_name = node.name().to_string();

    if let Some(groups) = &patch.attribute {
        let attr = node.attribute.as_bgp_proc_mut().ok_or_else(|| {
            TopologyError::validation(format!(
                "Node:{} does not have {}",
                node_name, BGP_PROC_NODE_ATTR_KEY
            ))
        })?;
        for (key, value) in groups {
            match key.parse::<BgpProcNodeGroup>() {
                Ok(group) => attr.replace_group(group, value.clone())?,
                Err(reason) => {
                    warn!("Node:{}, {}, skip it", node_name, reason);
                    summary.skipped_keys.push(format!("{}: {}", node_name, key));
                }
            }
        }
    }

    for tp_patch in &patch.term_points {
        let tp = node.find_term_point_mut(&tp_patch.tp_id).ok_or_else(|| {
            TopologyError::validation(format!(
                "Term-point:{} is not found in node {}",
                tp_patch.tp_id, node_name
            ))
        })?;
        if let Some(groups) = &tp_patch.attribute {
            let attr = tp.attribute.as_bgp_proc_mut().ok_or_else(|| {
                TopologyError::validation(format!(
                    "Term-point:{}[{}] does not have {}",
                    node_name, tp_patch.tp_id, BGP_PROC_TP_ATTR_KEY
                ))
            })?;
            for (key, value) in groups {
                match key.parse::<BgpProcTermPointGroup>() {
                    Ok(group) => attr.replace_group(group, value.clone())?,
                    Err(reason) => {
                        warn!("Term-point:{}[{}], {}, skip it", node_name, tp_patch.tp_id, reason);
                        summary
                            .skipped_keys
                            .push(format!("{}[{}]: {}", node_name, tp_patch.tp_id, key));
                    }
                }
            }
        }
        summary.patched_term_points += 1;
    }
    Ok(())
}
