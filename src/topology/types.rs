//! Multi-layer topology data model.
//!
//! A [`Networks`] snapshot owns an ordered list of [`Network`] layers; each
//! layer owns its nodes and links, each node owns its term-points. Support
//! references and link endpoints are plain names, resolved through the
//! per-collection name indexes built when a snapshot is loaded.
//!
//! The serialized form is the RFC 8345 JSON tree. Members this model does not
//! interpret are kept in `extra` maps and written back unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::attributes::{
    BgpProcNodeAttribute, BgpProcTermPointAttribute, L3NodeAttribute, L3TermPointAttribute,
    NetworkType, NodeAttribute, TermPointAttribute,
};
use crate::error::{Result, TopologyError};

/// Top-level key of an RFC 8345 topology document
pub const NETWORKS_KEY: &str = "ietf-network:networks";

/// Reference from a node to the lower-layer node realizing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingNode {
    #[serde(rename = "network-ref")]
    pub network_ref: String,
    #[serde(rename = "node-ref")]
    pub node_ref: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SupportingNode {
    pub fn new(network_ref: &str, node_ref: &str) -> Self {
        Self {
            network_ref: network_ref.to_string(),
            node_ref: node_ref.to_string(),
            extra: Map::new(),
        }
    }

    pub fn refers_to(&self, network_ref: &str, node_ref: &str) -> bool {
        self.network_ref == network_ref && self.node_ref == node_ref
    }
}

/// Reference from a term-point to the lower-layer term-point realizing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingTermPoint {
    #[serde(rename = "network-ref")]
    pub network_ref: String,
    #[serde(rename = "node-ref")]
    pub node_ref: String,
    #[serde(rename = "tp-ref")]
    pub tp_ref: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SupportingTermPoint {
    pub fn new(network_ref: &str, node_ref: &str, tp_ref: &str) -> Self {
        Self {
            network_ref: network_ref.to_string(),
            node_ref: node_ref.to_string(),
            tp_ref: tp_ref.to_string(),
            extra: Map::new(),
        }
    }

    pub fn refers_to(&self, network_ref: &str, node_ref: &str, tp_ref: &str) -> bool {
        self.network_ref == network_ref && self.node_ref == node_ref && self.tp_ref == tp_ref
    }
}

impl std::fmt::Display for SupportingTermPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}[{}]", self.network_ref, self.node_ref, self.tp_ref)
    }
}

/// Fully qualified term-point address, used when resolving link edges
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TpPath {
    pub network: String,
    pub node: String,
    pub tp: String,
}

impl TpPath {
    pub fn new(network: &str, node: &str, tp: &str) -> Self {
        Self {
            network: network.to_string(),
            node: node.to_string(),
            tp: tp.to_string(),
        }
    }
}

impl From<&SupportingTermPoint> for TpPath {
    fn from(support: &SupportingTermPoint) -> Self {
        Self::new(&support.network_ref, &support.node_ref, &support.tp_ref)
    }
}

impl std::fmt::Display for TpPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}[{}]", self.network, self.node, self.tp)
    }
}

fn is_empty_slice<T>(items: &&[T]) -> bool {
    items.is_empty()
}

fn is_empty_map(map: &&Map<String, Value>) -> bool {
    map.is_empty()
}

/// Sequence member to write back: kept when the source carried it or when it
/// has entries now
fn member<T>(items: &[T], present: bool) -> Option<&[T]> {
    (present || !items.is_empty()).then_some(items)
}

// ---------------------------------------------------------------------------
// TermPoint
// ---------------------------------------------------------------------------

/// An interface/endpoint of a node
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "TermPointRecord")]
pub struct TermPoint {
    name: String,
    pub attribute: TermPointAttribute,
    pub supports: Vec<SupportingTermPoint>,
    pub extra: Map<String, Value>,
}

impl TermPoint {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute: TermPointAttribute::None,
            supports: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// IP addresses configured on an L3 term-point
    pub fn ip_addresses(&self) -> &[String] {
        self.attribute
            .as_l3()
            .map(|attr| attr.ip_address.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Deserialize)]
struct TermPointRecord {
    #[serde(rename = "tp-id")]
    tp_id: String,
    #[serde(rename = "supporting-termination-point", default)]
    supports: Vec<SupportingTermPoint>,
    #[serde(rename = "mddo-topology:l3-termination-point-attributes", default)]
    l3: Option<L3TermPointAttribute>,
    #[serde(rename = "mddo-topology:bgp-proc-termination-point-attributes", default)]
    bgp_proc: Option<BgpProcTermPointAttribute>,
    #[serde(rename = "mddo-topology:bgp-as-termination-point-attributes", default)]
    bgp_as: Option<Map<String, Value>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<TermPointRecord> for TermPoint {
    type Error = TopologyError;

    fn try_from(record: TermPointRecord) -> Result<Self> {
        let attribute = match (record.l3, record.bgp_proc, record.bgp_as) {
            (None, None, None) => TermPointAttribute::None,
            (Some(attr), None, None) => TermPointAttribute::L3(attr),
            (None, Some(attr), None) => TermPointAttribute::BgpProc(attr),
            (None, None, Some(attr)) => TermPointAttribute::BgpAs(attr),
            _ => {
                return Err(TopologyError::integrity(format!(
                    "Term-point {} carries more than one attribute schema",
                    record.tp_id
                )))
            }
        };
        Ok(Self {
            name: record.tp_id,
            attribute,
            supports: record.supports,
            extra: record.extra,
        })
    }
}

#[derive(Serialize)]
struct TermPointRecordRef<'a> {
    #[serde(rename = "tp-id")]
    tp_id: &'a str,
    #[serde(rename = "supporting-termination-point", skip_serializing_if = "is_empty_slice")]
    supports: &'a [SupportingTermPoint],
    #[serde(
        rename = "mddo-topology:l3-termination-point-attributes",
        skip_serializing_if = "Option::is_none"
    )]
    l3: Option<&'a L3TermPointAttribute>,
    #[serde(
        rename = "mddo-topology:bgp-proc-termination-point-attributes",
        skip_serializing_if = "Option::is_none"
    )]
    bgp_proc: Option<&'a BgpProcTermPointAttribute>,
    #[serde(
        rename = "mddo-topology:bgp-as-termination-point-attributes",
        skip_serializing_if = "Option::is_none"
    )]
    bgp_as: Option<&'a Map<String, Value>>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

impl Serialize for TermPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (l3, bgp_proc, bgp_as) = match &self.attribute {
            TermPointAttribute::None => (None, None, None),
            TermPointAttribute::L3(attr) => (Some(attr), None, None),
            TermPointAttribute::BgpProc(attr) => (None, Some(attr), None),
            TermPointAttribute::BgpAs(attr) => (None, None, Some(attr)),
        };
        TermPointRecordRef {
            tp_id: &self.name,
            supports: &self.supports,
            l3,
            bgp_proc,
            bgp_as,
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A node of one layer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "NodeRecord")]
pub struct Node {
    name: String,
    pub attribute: NodeAttribute,
    pub supports: Vec<SupportingNode>,
    term_points: Vec<TermPoint>,
    tp_index: HashMap<String, usize>,
    tp_member: bool,
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute: NodeAttribute::None,
            supports: Vec::new(),
            term_points: Vec::new(),
            tp_index: HashMap::new(),
            tp_member: false,
            extra: Map::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: NodeAttribute) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn term_points(&self) -> &[TermPoint] {
        &self.term_points
    }

    /// Mutable access to every term-point; names cannot change through it
    pub fn term_points_mut(&mut self) -> impl Iterator<Item = &mut TermPoint> {
        self.term_points.iter_mut()
    }

    pub fn find_term_point(&self, name: &str) -> Option<&TermPoint> {
        self.tp_index.get(name).map(|&i| &self.term_points[i])
    }

    pub fn find_term_point_mut(&mut self, name: &str) -> Option<&mut TermPoint> {
        match self.tp_index.get(name) {
            Some(&i) => Some(&mut self.term_points[i]),
            None => None,
        }
    }

    /// Append a term-point unless one with the same name exists
    pub fn append_term_point(&mut self, term_point: TermPoint) -> bool {
        if self.tp_index.contains_key(term_point.name()) {
            return false;
        }
        self.tp_index
            .insert(term_point.name.clone(), self.term_points.len());
        self.term_points.push(term_point);
        true
    }

    /// Append a support reference to `network_ref/node_ref` unless present
    pub fn append_support_by_node(&mut self, network_ref: &str, node_ref: &str) -> bool {
        if self.supports.iter().any(|s| s.refers_to(network_ref, node_ref)) {
            return false;
        }
        self.supports.push(SupportingNode::new(network_ref, node_ref));
        true
    }

    /// Whether any support reference points to `network_ref/node_ref`
    pub fn is_supported_by(&self, network_ref: &str, node_ref: &str) -> bool {
        self.supports.iter().any(|s| s.refers_to(network_ref, node_ref))
    }
}

#[derive(Deserialize)]
struct NodeRecord {
    #[serde(rename = "node-id")]
    node_id: String,
    #[serde(rename = "supporting-node", default)]
    supports: Vec<SupportingNode>,
    #[serde(rename = "ietf-network-topology:termination-point", default)]
    term_points: Option<Vec<TermPoint>>,
    #[serde(rename = "mddo-topology:l3-node-attributes", default)]
    l3: Option<L3NodeAttribute>,
    #[serde(rename = "mddo-topology:bgp-proc-node-attributes", default)]
    bgp_proc: Option<BgpProcNodeAttribute>,
    #[serde(rename = "mddo-topology:bgp-as-node-attributes", default)]
    bgp_as: Option<Map<String, Value>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<NodeRecord> for Node {
    type Error = TopologyError;

    fn try_from(record: NodeRecord) -> Result<Self> {
        let attribute = match (record.l3, record.bgp_proc, record.bgp_as) {
            (None, None, None) => NodeAttribute::None,
            (Some(attr), None, None) => NodeAttribute::L3(attr),
            (None, Some(attr), None) => NodeAttribute::BgpProc(attr),
            (None, None, Some(attr)) => NodeAttribute::BgpAs(attr),
            _ => {
                return Err(TopologyError::integrity(format!(
                    "Node {} carries more than one attribute schema",
                    record.node_id
                )))
            }
        };

        let mut node = Node::new(&record.node_id).with_attribute(attribute);
        node.supports = record.supports;
        node.extra = record.extra;
        node.tp_member = record.term_points.is_some();
        for term_point in record.term_points.unwrap_or_default() {
            let tp_name = term_point.name().to_string();
            if !node.append_term_point(term_point) {
                return Err(TopologyError::integrity(format!(
                    "Duplicate term-point {} in node {}",
                    tp_name, record.node_id
                )));
            }
        }
        Ok(node)
    }
}

#[derive(Serialize)]
struct NodeRecordRef<'a> {
    #[serde(rename = "node-id")]
    node_id: &'a str,
    #[serde(rename = "supporting-node", skip_serializing_if = "is_empty_slice")]
    supports: &'a [SupportingNode],
    #[serde(
        rename = "ietf-network-topology:termination-point",
        skip_serializing_if = "Option::is_none"
    )]
    term_points: Option<&'a [TermPoint]>,
    #[serde(rename = "mddo-topology:l3-node-attributes", skip_serializing_if = "Option::is_none")]
    l3: Option<&'a L3NodeAttribute>,
    #[serde(
        rename = "mddo-topology:bgp-proc-node-attributes",
        skip_serializing_if = "Option::is_none"
    )]
    bgp_proc: Option<&'a BgpProcNodeAttribute>,
    #[serde(
        rename = "mddo-topology:bgp-as-node-attributes",
        skip_serializing_if = "Option::is_none"
    )]
    bgp_as: Option<&'a Map<String, Value>>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (l3, bgp_proc, bgp_as) = match &self.attribute {
            NodeAttribute::None => (None, None, None),
            NodeAttribute::L3(attr) => (Some(attr), None, None),
            NodeAttribute::BgpProc(attr) => (None, Some(attr), None),
            NodeAttribute::BgpAs(attr) => (None, None, Some(attr)),
        };
        NodeRecordRef {
            node_id: &self.name,
            supports: &self.supports,
            term_points: member(&self.term_points, self.tp_member),
            l3,
            bgp_proc,
            bgp_as,
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSource {
    #[serde(rename = "source-node")]
    pub node: String,
    #[serde(rename = "source-tp")]
    pub tp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDestination {
    #[serde(rename = "dest-node")]
    pub node: String,
    #[serde(rename = "dest-tp")]
    pub tp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A directed link; equality is the (source, destination) term-point tuple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "link-id", default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
    pub source: LinkSource,
    pub destination: LinkDestination,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Link {
    pub fn new(src_node: &str, src_tp: &str, dst_node: &str, dst_tp: &str) -> Self {
        let link_id = [src_node, src_tp, dst_node, dst_tp].join(",");
        Self {
            link_id: Some(link_id),
            source: LinkSource {
                node: src_node.to_string(),
                tp: src_tp.to_string(),
                extra: Map::new(),
            },
            destination: LinkDestination {
                node: dst_node.to_string(),
                tp: dst_tp.to_string(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Identity derived from the endpoint tuple
    pub fn key(&self) -> String {
        [
            self.source.node.as_str(),
            &self.source.tp,
            &self.destination.node,
            &self.destination.tp,
        ]
        .join(",")
    }

    pub fn has_source(&self, node: &str, tp: &str) -> bool {
        self.source.node == node && self.source.tp == tp
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.source.node == other.source.node
            && self.source.tp == other.source.tp
            && self.destination.node == other.destination.node
            && self.destination.tp == other.destination.tp
    }
}

impl Eq for Link {}

// ---------------------------------------------------------------------------
// Network (layer)
// ---------------------------------------------------------------------------

/// One layer of the topology
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "NetworkRecord")]
pub struct Network {
    name: String,
    pub network_types: Map<String, Value>,
    pub supports: Vec<Value>,
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    links: Vec<Link>,
    link_index: HashMap<String, usize>,
    node_member: bool,
    link_member: bool,
    pub extra: Map<String, Value>,
}

impl Network {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            network_types: Map::new(),
            supports: Vec::new(),
            nodes: Vec::new(),
            node_index: HashMap::new(),
            links: Vec::new(),
            link_index: HashMap::new(),
            node_member: false,
            link_member: false,
            extra: Map::new(),
        }
    }

    /// Declare the layer schema, e.g. `mddo-topology:l3-network`
    pub fn with_type(mut self, type_key: &str) -> Self {
        self.network_types
            .insert(type_key.to_string(), Value::Object(Map::new()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network_type(&self) -> NetworkType {
        NetworkType::from_network_types(&self.network_types)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access to every node; names cannot change through it
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.node_index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn find_node_mut(&mut self, name: &str) -> Option<&mut Node> {
        match self.node_index.get(name) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    pub fn find_term_point(&self, node: &str, tp: &str) -> Option<&TermPoint> {
        self.find_node(node).and_then(|n| n.find_term_point(tp))
    }

    /// First node holding a support reference to `network_ref/node_ref`
    pub fn find_node_by_support(&self, network_ref: &str, node_ref: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| node.is_supported_by(network_ref, node_ref))
    }

    /// First (node, term-point) whose term-point is supported by the given path
    pub fn find_tp_by_support(
        &self,
        network_ref: &str,
        node_ref: &str,
        tp_ref: &str,
    ) -> Option<(&Node, &TermPoint)> {
        self.nodes.iter().find_map(|node| {
            node.term_points()
                .iter()
                .find(|tp| tp.supports.iter().any(|s| s.refers_to(network_ref, node_ref, tp_ref)))
                .map(|tp| (node, tp))
        })
    }

    pub fn find_link(&self, src_node: &str, src_tp: &str, dst_node: &str, dst_tp: &str) -> Option<&Link> {
        let key = [src_node, src_tp, dst_node, dst_tp].join(",");
        self.link_index.get(&key).map(|&i| &self.links[i])
    }

    /// First link leaving `node[tp]`
    pub fn find_link_by_source(&self, node: &str, tp: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.has_source(node, tp))
    }

    /// Append a node unless one with the same name exists
    pub fn append_node(&mut self, node: Node) -> bool {
        if self.node_index.contains_key(node.name()) {
            return false;
        }
        self.node_index.insert(node.name.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Replace the node with the same name; false when there is none
    pub fn replace_node(&mut self, node: Node) -> bool {
        match self.node_index.get(node.name()) {
            Some(&i) => {
                self.nodes[i] = node;
                true
            }
            None => false,
        }
    }

    /// Append a link unless an equal link exists
    pub fn append_link(&mut self, link: Link) -> bool {
        let key = link.key();
        if self.link_index.contains_key(&key) {
            return false;
        }
        self.link_index.insert(key, self.links.len());
        self.links.push(link);
        true
    }

    /// Replace the link with the same endpoint tuple; false when there is none
    pub fn replace_link(&mut self, link: Link) -> bool {
        match self.link_index.get(&link.key()) {
            Some(&i) => {
                self.links[i] = link;
                true
            }
            None => false,
        }
    }
}

#[derive(Deserialize)]
struct NetworkRecord {
    #[serde(rename = "network-id")]
    network_id: String,
    #[serde(rename = "network-types", default)]
    network_types: Map<String, Value>,
    #[serde(rename = "supporting-network", default)]
    supports: Vec<Value>,
    #[serde(rename = "node", default)]
    nodes: Option<Vec<Node>>,
    #[serde(rename = "ietf-network-topology:link", default)]
    links: Option<Vec<Link>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<NetworkRecord> for Network {
    type Error = TopologyError;

    fn try_from(record: NetworkRecord) -> Result<Self> {
        let mut network = Network::new(&record.network_id);
        network.network_types = record.network_types;
        network.supports = record.supports;
        network.extra = record.extra;
        network.node_member = record.nodes.is_some();
        network.link_member = record.links.is_some();

        for node in record.nodes.unwrap_or_default() {
            let node_name = node.name().to_string();
            if !network.append_node(node) {
                return Err(TopologyError::integrity(format!(
                    "Duplicate node {} in network {}",
                    node_name, record.network_id
                )));
            }
        }
        for link in record.links.unwrap_or_default() {
            let key = link.key();
            if !network.append_link(link) {
                log::warn!("Duplicate link {} in network {}, ignore it", key, record.network_id);
            }
        }
        Ok(network)
    }
}

#[derive(Serialize)]
struct NetworkRecordRef<'a> {
    #[serde(rename = "network-id")]
    network_id: &'a str,
    #[serde(rename = "network-types", skip_serializing_if = "is_empty_map")]
    network_types: &'a Map<String, Value>,
    #[serde(rename = "supporting-network", skip_serializing_if = "is_empty_slice")]
    supports: &'a [Value],
    #[serde(rename = "node", skip_serializing_if = "Option::is_none")]
    nodes: Option<&'a [Node]>,
    #[serde(rename = "ietf-network-topology:link", skip_serializing_if = "Option::is_none")]
    links: Option<&'a [Link]>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        NetworkRecordRef {
            network_id: &self.name,
            network_types: &self.network_types,
            supports: &self.supports,
            nodes: member(&self.nodes, self.node_member),
            links: member(&self.links, self.link_member),
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Networks (snapshot)
// ---------------------------------------------------------------------------

/// A full multi-layer topology snapshot
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "NetworksRecord")]
pub struct Networks {
    networks: Vec<Network>,
    index: HashMap<String, usize>,
    body_extra: Map<String, Value>,
    pub extra: Map<String, Value>,
}

impl Networks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from its RFC 8345 JSON form
    pub fn load(raw: &Value) -> Result<Self> {
        Ok(Networks::deserialize(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize back to the RFC 8345 JSON form
    pub fn to_data(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn network_names(&self) -> Vec<&str> {
        self.networks.iter().map(Network::name).collect()
    }

    pub fn find_network(&self, name: &str) -> Option<&Network> {
        self.index.get(name).map(|&i| &self.networks[i])
    }

    pub fn find_network_mut(&mut self, name: &str) -> Option<&mut Network> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.networks[i]),
            None => None,
        }
    }

    /// Like [`Networks::find_network`] but missing layers are an error
    pub fn network(&self, name: &str) -> Result<&Network> {
        self.find_network(name)
            .ok_or_else(|| TopologyError::not_found(format!("network(layer) {}", name)))
    }

    pub fn network_mut(&mut self, name: &str) -> Result<&mut Network> {
        self.find_network_mut(name)
            .ok_or_else(|| TopologyError::not_found(format!("network(layer) {}", name)))
    }

    /// Term-point addressed by a full path
    pub fn find_term_point(&self, path: &TpPath) -> Option<&TermPoint> {
        self.find_network(&path.network)
            .and_then(|nw| nw.find_term_point(&path.node, &path.tp))
    }

    /// Append a layer at the end unless the name exists
    pub fn push_network(&mut self, network: Network) -> bool {
        if self.index.contains_key(network.name()) {
            return false;
        }
        self.index.insert(network.name.clone(), self.networks.len());
        self.networks.push(network);
        true
    }

    /// Insert a layer at the front unless the name exists
    pub fn prepend_network(&mut self, network: Network) -> bool {
        if self.index.contains_key(network.name()) {
            return false;
        }
        self.networks.insert(0, network);
        self.reindex();
        true
    }

    /// Replace the layer with the same name; false when there is none
    pub fn replace_network(&mut self, network: Network) -> bool {
        match self.index.get(network.name()) {
            Some(&i) => {
                self.networks[i] = network;
                true
            }
            None => false,
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .networks
            .iter()
            .enumerate()
            .map(|(i, nw)| (nw.name.clone(), i))
            .collect();
    }
}

#[derive(Deserialize)]
struct NetworksBody {
    #[serde(rename = "network", default)]
    networks: Vec<Network>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct NetworksRecord {
    #[serde(rename = "ietf-network:networks")]
    body: NetworksBody,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<NetworksRecord> for Networks {
    type Error = TopologyError;

    fn try_from(record: NetworksRecord) -> Result<Self> {
        let mut networks = Networks {
            body_extra: record.body.extra,
            extra: record.extra,
            ..Default::default()
        };
        for network in record.body.networks {
            let name = network.name().to_string();
            if !networks.push_network(network) {
                return Err(TopologyError::integrity(format!(
                    "Duplicate network(layer) {}",
                    name
                )));
            }
        }
        Ok(networks)
    }
}

#[derive(Serialize)]
struct NetworksBodyRef<'a> {
    #[serde(rename = "network")]
    networks: &'a [Network],
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Serialize)]
struct NetworksRecordRef<'a> {
    #[serde(rename = "ietf-network:networks")]
    body: NetworksBodyRef<'a>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

impl Serialize for Networks {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        NetworksRecordRef {
            body: NetworksBodyRef {
                networks: &self.networks,
                extra: &self.body_extra,
            },
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}
