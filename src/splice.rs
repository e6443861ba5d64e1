//! Topology merger.
//!
//! Splices an externally supplied topology (observed eBGP peering with its
//! own `bgp_as`, `bgp_proc` and `layer3` layers) into an internally
//! generated one:
//!
//! 1. external layers other than `layer3`/`bgp_proc` are prepended to the
//!    internal layer list; a layer that already exists is a conflict and
//!    stops every later step
//! 2. `bgp_as` nodes without supports are bound to the `bgp_proc` nodes
//!    whose confederation id equals the ASN in their name (`as65550`)
//! 3. external `bgp_proc` nodes/links are appended and every `bgp_as` link
//!    becomes a `bgp_proc` link between the supporting term-points
//! 4. the same for `layer3`, two support hops down, with a segment node
//!    standing for the shared subnet between the endpoints
//!
//! The merge runs on a copy of the internal topology which replaces the
//! original only when every step (and the final integrity check) succeeds.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, TopologyError};
use crate::topology::attributes::L3NodeAttribute;
use crate::topology::{
    Link, Network, Networks, Node, NodeAttribute, TermPoint, TpPath, BGP_AS, BGP_PROC, LAYER3,
};
use crate::utils::first_segment;

/// Result of inserting the foreign layers (step 1)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub inserted: Vec<String>,
    /// First layer found in both topologies
    pub conflict: Option<String>,
}

impl InsertOutcome {
    pub fn is_conflict(&self) -> bool {
        self.conflict.is_some()
    }
}

/// What a merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpliceSummary {
    pub inserted_layers: Vec<String>,
    pub conflict: Option<String>,
    pub bound_supports: usize,
    pub bgp_proc_links: usize,
    pub layer3_links: usize,
    pub segment_nodes: Vec<String>,
}

/// Merges an external topology into an internal one
#[derive(Debug, Clone)]
pub struct TopologySplicer {
    internal: Networks,
    external: Networks,
}

impl TopologySplicer {
    pub fn new(internal: Networks, external: Networks) -> Self {
        Self { internal, external }
    }

    /// Build both graphs from their RFC 8345 data
    pub fn from_data(internal: &Value, external: &Value) -> Result<Self> {
        Ok(Self::new(Networks::load(internal)?, Networks::load(external)?))
    }

    /// Run all merge steps
    ///
    /// Calling it again on the same instance detects the already inserted
    /// layers and changes nothing.
    pub fn splice(&mut self) -> Result<SpliceSummary> {
        let mut merged = self.internal.clone();

        let outcome = insert_networks(&mut merged, &self.external);
        let mut summary = SpliceSummary {
            inserted_layers: outcome.inserted.clone(),
            conflict: outcome.conflict.clone(),
            ..Default::default()
        };
        if outcome.is_conflict() {
            warn!(
                "Topology already spliced (conflict layer: {}), skip the rest",
                outcome.conflict.as_deref().unwrap_or_default()
            );
            self.internal = merged;
            return Ok(summary);
        }

        summary.bound_supports = insert_supports(&mut merged)?;
        summary.bgp_proc_links = splice_bgp_proc(&mut merged, &self.external)?;
        let (layer3_links, segment_nodes) = splice_layer3(&mut merged, &self.external)?;
        summary.layer3_links = layer3_links;
        summary.segment_nodes = segment_nodes;

        merged
            .verify()
            .map_err(|e| TopologyError::resolution(format!("Spliced topology is inconsistent: {}", e)))?;

        info!(
            "Spliced {} layers, {} supports, {} bgp_proc links, {} layer3 links",
            summary.inserted_layers.len(),
            summary.bound_supports,
            summary.bgp_proc_links,
            summary.layer3_links
        );
        self.internal = merged;
        Ok(summary)
    }

    pub fn networks(&self) -> &Networks {
        &self.internal
    }

    pub fn into_networks(self) -> Networks {
        self.internal
    }

    /// Serialized (merged) internal topology
    pub fn to_data(&self) -> Result<Value> {
        self.internal.to_data()
    }
}

fn insert_networks(merged: &mut Networks, external: &Networks) -> InsertOutcome {
    let mut outcome = InsertOutcome::default();
    let foreign = external
        .networks()
        .iter()
        .filter(|nw| nw.name() != LAYER3 && nw.name() != BGP_PROC);

    for network in foreign {
        if merged.find_network(network.name()).is_some() {
            warn!("Conflict network(layer) in int/ext network: {}, ignore it", network.name());
            outcome.conflict.get_or_insert_with(|| network.name().to_string());
            continue;
        }
        merged.prepend_network(network.clone());
        outcome.inserted.push(network.name().to_string());
    }
    outcome
}

fn parse_asn(bgp_as_node: &str) -> Option<u32> {
    bgp_as_node.strip_prefix("as")?.parse().ok()
}

fn insert_supports(merged: &mut Networks) -> Result<usize> {
    let bgp_proc = merged.network(BGP_PROC)?;
    let bgp_as = merged.network(BGP_AS)?;

    let mut bindings: Vec<(String, String)> = Vec::new();
    for as_node in bgp_as.nodes().iter().filter(|n| n.supports.is_empty()) {
        let Some(asn) = parse_asn(as_node.name()) else {
            warn!("Cannot read an AS number from bgp_as node {}, skip it", as_node.name());
            continue;
        };
        for proc_node in bgp_proc.nodes() {
            let confederation = proc_node
                .attribute
                .as_bgp_proc()
                .and_then(|attr| attr.confederation_asn());
            if confederation == Some(asn) {
                bindings.push((as_node.name().to_string(), proc_node.name().to_string()));
            }
        }
    }

    let bgp_as = merged.network_mut(BGP_AS)?;
    let mut bound = 0;
    for (as_node, proc_node) in bindings {
        if let Some(node) = bgp_as.find_node_mut(&as_node) {
            if node.append_support_by_node(BGP_PROC, &proc_node) {
                debug!("Bind {}/{} to {}/{}", BGP_AS, as_node, BGP_PROC, proc_node);
                bound += 1;
            }
        }
    }
    Ok(bound)
}

/// The term-point an edge or support points to
fn find_supported_tp<'a>(networks: &'a Networks, path: &TpPath) -> Result<&'a TermPoint> {
    let network = networks.find_network(&path.network).ok_or_else(|| {
        TopologyError::resolution(format!("Unknown supporting network: {} (edge: {})", path.network, path))
    })?;
    let node = network.find_node(&path.node).ok_or_else(|| {
        TopologyError::resolution(format!("Unknown supporting node: {} (edge: {})", path.node, path))
    })?;
    node.find_term_point(&path.tp).ok_or_else(|| {
        TopologyError::resolution(format!("Unknown supporting tp: {} (edge: {})", path.tp, path))
    })
}

/// One hop down: the path of the (single) term-point supporting `path`
fn lower_tp_path(networks: &Networks, path: &TpPath) -> Result<TpPath> {
    let tp = find_supported_tp(networks, path)?;
    let support = tp
        .supports
        .first()
        .ok_or_else(|| TopologyError::resolution(format!("Term-point {} has no support", path)))?;
    let lower = TpPath::from(support);
    find_supported_tp(networks, &lower)?;
    Ok(lower)
}

fn find_supported_bgp_proc_tp(networks: &Networks, bgp_as_edge: &TpPath) -> Result<TpPath> {
    lower_tp_path(networks, bgp_as_edge)
}

fn find_supported_l3_tp(networks: &Networks, bgp_as_edge: &TpPath) -> Result<(TpPath, Vec<String>)> {
    let bgp_proc_tp = find_supported_bgp_proc_tp(networks, bgp_as_edge)?;
    let l3_path = lower_tp_path(networks, &bgp_proc_tp)?;
    let ip_addresses = find_supported_tp(networks, &l3_path)?.ip_addresses().to_vec();
    Ok((l3_path, ip_addresses))
}

fn bgp_as_edges(external: &Networks) -> Result<Vec<(TpPath, TpPath)>> {
    Ok(external
        .network(BGP_AS)?
        .links()
        .iter()
        .map(|link| {
            (
                TpPath::new(BGP_AS, &link.source.node, &link.source.tp),
                TpPath::new(BGP_AS, &link.destination.node, &link.destination.tp),
            )
        })
        .collect())
}

/// Copy nodes and links of an external layer into the internal one
fn append_layer(internal: &mut Network, external: &Network) {
    for node in external.nodes() {
        if !internal.append_node(node.clone()) {
            warn!(
                "Node {} already exists in {}, ignore the external one",
                node.name(),
                internal.name()
            );
        }
    }
    for link in external.links() {
        internal.append_link(link.clone());
    }
}

fn splice_bgp_proc(merged: &mut Networks, external: &Networks) -> Result<usize> {
    append_layer(merged.network_mut(BGP_PROC)?, external.network(BGP_PROC)?);

    let mut pairs = Vec::new();
    for (src, dst) in bgp_as_edges(external)? {
        pairs.push((
            find_supported_bgp_proc_tp(merged, &src)?,
            find_supported_bgp_proc_tp(merged, &dst)?,
        ));
    }

    // bgp_as links come in both directions, so one link per edge is enough
    let bgp_proc = merged.network_mut(BGP_PROC)?;
    let mut added = 0;
    for (src, dst) in pairs {
        if bgp_proc.append_link(Link::new(&src.node, &src.tp, &dst.node, &dst.tp)) {
            added += 1;
        }
    }
    Ok(added)
}

fn segment_tp_name(path: &TpPath) -> String {
    format!("{}_{}", path.node, path.tp)
}

/// Find or create the segment node of `subnet`; returns its name and
/// whether it was created
fn append_segment_node(l3: &mut Network, subnet: &str, src: &TpPath, dst: &TpPath) -> (String, bool) {
    let name = format!("Seg_{}", subnet);
    let created = if l3.find_node(&name).is_some() {
        false
    } else {
        l3.append_node(Node::new(&name).with_attribute(NodeAttribute::L3(L3NodeAttribute::segment(subnet))))
    };
    if let Some(segment) = l3.find_node_mut(&name) {
        for path in [src, dst] {
            segment.append_term_point(TermPoint::new(&segment_tp_name(path)));
        }
    }
    (name, created)
}

fn splice_layer3(merged: &mut Networks, external: &Networks) -> Result<(usize, Vec<String>)> {
    append_layer(merged.network_mut(LAYER3)?, external.network(LAYER3)?);

    let mut edges = Vec::new();
    for (src, dst) in bgp_as_edges(external)? {
        let (src_path, src_ips) = find_supported_l3_tp(merged, &src)?;
        let (dst_path, dst_ips) = find_supported_l3_tp(merged, &dst)?;
        // eBGP peers may not have an address on their side
        let subnet = first_segment(&src_ips)
            .or_else(|| first_segment(&dst_ips))
            .ok_or_else(|| {
                TopologyError::resolution(format!(
                    "No IP address on either {} or {}, cannot derive a segment",
                    src_path, dst_path
                ))
            })?;
        edges.push((subnet, src_path, dst_path));
    }

    let l3 = merged.network_mut(LAYER3)?;
    let mut links = 0;
    let mut segment_nodes = Vec::new();
    for (subnet, src, dst) in edges {
        let (segment, created) = append_segment_node(l3, &subnet, &src, &dst);
        if created {
            debug!("Add segment node {}", segment);
            segment_nodes.push(segment.clone());
        }
        let to_segment = Link::new(&src.node, &src.tp, &segment, &segment_tp_name(&src));
        let from_segment = Link::new(&segment, &segment_tp_name(&dst), &dst.node, &dst.tp);
        links += usize::from(l3.append_link(to_segment));
        links += usize::from(l3.append_link(from_segment));
    }
    Ok((links, segment_nodes))
}
