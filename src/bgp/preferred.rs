//! Preferred-peer detection.
//!
//! Among possibly several sessions towards one external AS, marks the
//! term-point of the session that peers at a given internal L3 interface
//! with `ext-bgp-speaker-preferred`.

use log::info;
use serde::Serialize;

use crate::error::{Result, TopologyError};
use crate::topology::attributes::EXT_BGP_SPEAKER_PREFERRED_FLAG;
use crate::topology::{Network, Networks, LAYER3};

/// The term-point marked preferred
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferredPeer {
    pub node: String,
    pub tp: String,
    pub ext_asn: u32,
}

/// Clear every preferred flag in the layer, then mark the external speaker
/// term-point peering with `l3_node[l3_intf]`.
///
/// Flags are only touched once the peer has been resolved and validated; on
/// error the layer is left as it was.
pub fn detect_preferred_peer(
    networks: &mut Networks,
    layer: &str,
    ext_asn: u32,
    l3_node: &str,
    l3_intf: &str,
) -> Result<PreferredPeer> {
    let network = networks.network_mut(layer)?;
    let (peer_node, peer_tp) = find_ext_speaker_peer(network, layer, ext_asn, l3_node, l3_intf)?;

    clear_all_preferred_flags(network);
    if let Some(attr) = network
        .find_node_mut(&peer_node)
        .and_then(|node| node.find_term_point_mut(&peer_tp))
        .and_then(|tp| tp.attribute.as_bgp_proc_mut())
    {
        attr.flag.push(EXT_BGP_SPEAKER_PREFERRED_FLAG.to_string());
    }

    info!("Preferred peer of AS{}: {}[{}]", ext_asn, peer_node, peer_tp);
    Ok(PreferredPeer {
        node: peer_node,
        tp: peer_tp,
        ext_asn,
    })
}

/// The external speaker (node, tp) across the session on `l3_node[l3_intf]`
fn find_ext_speaker_peer(
    network: &Network,
    layer: &str,
    ext_asn: u32,
    l3_node: &str,
    l3_intf: &str,
) -> Result<(String, String)> {
    let (proc_node, proc_tp) = find_supported_session(network, layer, l3_node, l3_intf)?;

    let link = network.find_link_by_source(&proc_node, &proc_tp).ok_or_else(|| {
        TopologyError::not_found(format!(
            "Layer:{}, Link not found that source:{}[{}]",
            layer, proc_node, proc_tp
        ))
    })?;
    let peer_node = &link.destination.node;
    let peer_tp = &link.destination.tp;

    let speaker = network
        .find_node(peer_node)
        .filter(|node| {
            node.attribute
                .as_bgp_proc()
                .map_or(false, |attr| attr.is_ext_bgp_speaker())
        })
        .ok_or_else(|| {
            TopologyError::validation(format!(
                "Layer:{}, Ext-bgp-speaker is not found: {}",
                layer, peer_node
            ))
        })?;

    speaker
        .find_term_point(peer_tp)
        .and_then(|tp| tp.attribute.as_bgp_proc())
        .filter(|attr| attr.has_local_as(ext_asn))
        .ok_or_else(|| {
            TopologyError::validation(format!(
                "Layer:{}, ext-bgp-speaker ASN check failed, mismatch ASN:{} ({}[{}])",
                layer, ext_asn, peer_node, peer_tp
            ))
        })?;
    Ok((peer_node.clone(), peer_tp.clone()))
}

fn clear_all_preferred_flags(network: &mut Network) {
    for node in network.nodes_mut() {
        for tp in node.term_points_mut() {
            if let Some(attr) = tp.attribute.as_bgp_proc_mut() {
                attr.flag.retain(|flag| flag != EXT_BGP_SPEAKER_PREFERRED_FLAG);
            }
        }
    }
}

/// The (node, tp) of the BGP session running on `layer3/l3_node[l3_intf]`
fn find_supported_session(
    network: &Network,
    layer: &str,
    l3_node: &str,
    l3_intf: &str,
) -> Result<(String, String)> {
    let mut found: Vec<(String, String)> = network
        .nodes()
        .iter()
        .filter(|node| node.is_supported_by(LAYER3, l3_node))
        .flat_map(|node| {
            node.term_points()
                .iter()
                .filter(|tp| tp.supports.iter().any(|s| s.refers_to(LAYER3, l3_node, l3_intf)))
                .map(move |tp| (node.name().to_string(), tp.name().to_string()))
        })
        .collect();

    match found.len() {
        0 => Err(TopologyError::not_found(format!(
            "Layer:{}, Node not found that supports {}/{}[{}]",
            layer, LAYER3, l3_node, l3_intf
        ))),
        1 => Ok(found.remove(0)),
        n => Err(TopologyError::integrity(format!(
            "Layer:{}, {} term-points support {}/{}[{}], it is not unique",
            layer, n, LAYER3, l3_node, l3_intf
        ))),
    }
}
