//! Layer-specific attribute schemas.
//!
//! Each layer stores node and term-point attributes under a schema-specific
//! key (`mddo-topology:l3-node-attributes`, ...). In memory the attribute is
//! a tagged union, so code that edits attributes matches on the schema
//! instead of looking keys up at runtime. Fields the core does not model
//! are carried in `extra` and written back unchanged.

use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Result, TopologyError};

/// Node attribute key of the L3 schema
pub const L3_NODE_ATTR_KEY: &str = "mddo-topology:l3-node-attributes";
/// Term-point attribute key of the L3 schema
pub const L3_TP_ATTR_KEY: &str = "mddo-topology:l3-termination-point-attributes";
/// Node attribute key of the BGP-process schema
pub const BGP_PROC_NODE_ATTR_KEY: &str = "mddo-topology:bgp-proc-node-attributes";
/// Term-point attribute key of the BGP-process schema
pub const BGP_PROC_TP_ATTR_KEY: &str = "mddo-topology:bgp-proc-termination-point-attributes";
/// Node attribute key of the BGP-AS schema
pub const BGP_AS_NODE_ATTR_KEY: &str = "mddo-topology:bgp-as-node-attributes";
/// Term-point attribute key of the BGP-AS schema
pub const BGP_AS_TP_ATTR_KEY: &str = "mddo-topology:bgp-as-termination-point-attributes";

/// Flag marking a BGP-process node as an external BGP speaker
pub const EXT_BGP_SPEAKER_FLAG: &str = "ext-bgp-speaker";
/// Flag marking the peering term-point used for inbound-preference steering
pub const EXT_BGP_SPEAKER_PREFERRED_FLAG: &str = "ext-bgp-speaker-preferred";

/// A sequence member that remembers whether the document carried it.
///
/// An absent member stays absent on write-back until something is added to
/// it; a member present as `[]` is written back as `[]`.
#[derive(Debug, Clone)]
pub struct Seq<T> {
    items: Vec<T>,
    present: bool,
}

impl<T> Seq<T> {
    pub fn is_absent(&self) -> bool {
        !self.present && self.items.is_empty()
    }
}

impl<T> Default for Seq<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            present: false,
        }
    }
}

impl<T> From<Vec<T>> for Seq<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items, present: true }
    }
}

impl<T> Deref for Seq<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.items
    }
}

impl<T> DerefMut for Seq<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }
}

impl<T: PartialEq> PartialEq for Seq<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: PartialEq<U>, U> PartialEq<Vec<U>> for Seq<T> {
    fn eq(&self, other: &Vec<U>) -> bool {
        self.items == *other
    }
}

impl<T: Serialize> Serialize for Seq<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Seq<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::deserialize(deserializer).map(Seq::from)
    }
}

/// Schema a layer declares in its `network-types`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkType {
    L3,
    BgpProc,
    BgpAs,
    Other(String),
    Unspecified,
}

impl NetworkType {
    /// Derive the schema from a `network-types` member
    pub fn from_network_types(network_types: &Map<String, Value>) -> Self {
        match network_types.keys().next().map(String::as_str) {
            None => Self::Unspecified,
            Some("mddo-topology:l3-network") => Self::L3,
            Some("mddo-topology:bgp-proc-network") => Self::BgpProc,
            Some("mddo-topology:bgp-as-network") => Self::BgpAs,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// Node attributes, one variant per layer schema
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeAttribute {
    #[default]
    None,
    L3(L3NodeAttribute),
    BgpProc(BgpProcNodeAttribute),
    BgpAs(Map<String, Value>),
}

impl NodeAttribute {
    pub fn as_l3(&self) -> Option<&L3NodeAttribute> {
        match self {
            Self::L3(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn as_bgp_proc(&self) -> Option<&BgpProcNodeAttribute> {
        match self {
            Self::BgpProc(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn as_bgp_proc_mut(&mut self) -> Option<&mut BgpProcNodeAttribute> {
        match self {
            Self::BgpProc(attr) => Some(attr),
            _ => None,
        }
    }
}

/// Term-point attributes, one variant per layer schema
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TermPointAttribute {
    #[default]
    None,
    L3(L3TermPointAttribute),
    BgpProc(BgpProcTermPointAttribute),
    BgpAs(Map<String, Value>),
}

impl TermPointAttribute {
    pub fn as_l3(&self) -> Option<&L3TermPointAttribute> {
        match self {
            Self::L3(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn as_bgp_proc(&self) -> Option<&BgpProcTermPointAttribute> {
        match self {
            Self::BgpProc(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn as_bgp_proc_mut(&mut self) -> Option<&mut BgpProcTermPointAttribute> {
        match self {
            Self::BgpProc(attr) => Some(attr),
            _ => None,
        }
    }
}

/// A prefix owned by an L3 node (segment nodes own exactly one)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct L3Prefix {
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub flag: Seq<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct L3NodeAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub prefix: Seq<L3Prefix>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub flag: Seq<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl L3NodeAttribute {
    /// Attributes of a segment node standing for `subnet`
    pub fn segment(subnet: &str) -> Self {
        Self {
            node_type: Some("segment".to_string()),
            prefix: vec![L3Prefix {
                prefix: subnet.to_string(),
                metric: Some(0),
                flag: Seq::default(),
                extra: Map::new(),
            }]
            .into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct L3TermPointAttribute {
    /// Addresses in CIDR notation (`a.b.c.d/nn`)
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub ip_address: Seq<String>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub flag: Seq<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BgpPrefix {
    pub prefix: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BgpPrefixSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub prefixes: Seq<BgpPrefix>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BgpPrefixSet {
    pub fn prefix_strings(&self) -> Vec<String> {
        self.prefixes.iter().map(|p| p.prefix.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BgpProcNodeAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    /// AS-confederation id; absent or non-positive means "not in a confederation"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confederation_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub policy: Seq<Value>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub prefix_set: Seq<BgpPrefixSet>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub as_path_set: Seq<Value>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub community_set: Seq<Value>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub flag: Seq<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BgpProcNodeAttribute {
    /// Confederation AS number, if the node belongs to one
    pub fn confederation_asn(&self) -> Option<u32> {
        self.confederation_id
            .filter(|id| *id > 0)
            .and_then(|id| u32::try_from(id).ok())
    }

    pub fn is_ext_bgp_speaker(&self) -> bool {
        self.flag.iter().any(|f| f == EXT_BGP_SPEAKER_FLAG)
    }

    /// Replace a whole attribute group with the patch value
    pub fn replace_group(&mut self, group: BgpProcNodeGroup, value: Value) -> Result<()> {
        match group {
            BgpProcNodeGroup::Policy => self.policy = group.sequence::<Value>(value)?.into(),
            BgpProcNodeGroup::PrefixSet => self.prefix_set = group.sequence::<BgpPrefixSet>(value)?.into(),
            BgpProcNodeGroup::AsPathSet => self.as_path_set = group.sequence::<Value>(value)?.into(),
            BgpProcNodeGroup::CommunitySet => self.community_set = group.sequence::<Value>(value)?.into(),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BgpProcTermPointAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_as: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_as: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub import_policy: Seq<String>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub export_policy: Seq<String>,
    #[serde(default, skip_serializing_if = "Seq::is_absent")]
    pub flag: Seq<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BgpProcTermPointAttribute {
    pub fn has_local_as(&self, asn: u32) -> bool {
        self.local_as == Some(i64::from(asn))
    }

    pub fn is_preferred(&self) -> bool {
        self.flag.iter().any(|f| f == EXT_BGP_SPEAKER_PREFERRED_FLAG)
    }

    /// Replace a whole attribute group with the patch value
    pub fn replace_group(&mut self, group: BgpProcTermPointGroup, value: Value) -> Result<()> {
        let policies: Vec<String> = serde_json::from_value(value).map_err(|e| {
            TopologyError::validation(format!("Invalid value for {}: {}", group.key(), e))
        })?;
        match group {
            BgpProcTermPointGroup::ImportPolicy => self.import_policy = policies.into(),
            BgpProcTermPointGroup::ExportPolicy => self.export_policy = policies.into(),
        }
        Ok(())
    }
}

/// Patchable attribute groups of a BGP-process node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgpProcNodeGroup {
    Policy,
    PrefixSet,
    AsPathSet,
    CommunitySet,
}

impl BgpProcNodeGroup {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::PrefixSet => "prefix-set",
            Self::AsPathSet => "as-path-set",
            Self::CommunitySet => "community-set",
        }
    }

    fn sequence<T: serde::de::DeserializeOwned>(&self, value: Value) -> Result<Vec<T>> {
        serde_json::from_value(value).map_err(|e| {
            TopologyError::validation(format!("Invalid value for {}: {}", self.key(), e))
        })
    }
}

impl FromStr for BgpProcNodeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "policy" => Ok(Self::Policy),
            "prefix-set" => Ok(Self::PrefixSet),
            "as-path-set" => Ok(Self::AsPathSet),
            "community-set" => Ok(Self::CommunitySet),
            other => Err(format!("unknown bgp-proc node attribute group: {}", other)),
        }
    }
}

/// Patchable attribute groups of a BGP-process term-point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgpProcTermPointGroup {
    ImportPolicy,
    ExportPolicy,
}

impl BgpProcTermPointGroup {
    pub fn key(&self) -> &'static str {
        match self {
            Self::ImportPolicy => "import-policy",
            Self::ExportPolicy => "export-policy",
        }
    }
}

impl FromStr for BgpProcTermPointGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "import-policy" => Ok(Self::ImportPolicy),
            "export-policy" => Ok(Self::ExportPolicy),
            other => Err(format!("unknown bgp-proc term-point attribute group: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_network_type_detection() {
        let types = json!({"mddo-topology:bgp-proc-network": {}});
        let types = types.as_object().unwrap();
        assert_eq!(NetworkType::from_network_types(types), NetworkType::BgpProc);
        assert_eq!(NetworkType::from_network_types(&Map::new()), NetworkType::Unspecified);
    }

    #[test]
    fn test_bgp_proc_attribute_keeps_unknown_fields() {
        let raw = json!({
            "router-id": "192.168.255.5",
            "confederation-id": 65550,
            "prefix-set": [{"name": "as65550-advd-ipv4", "prefixes": [{"prefix": "10.0.0.0/8"}]}],
            "flag": ["ext-bgp-speaker"],
            "redistribute": [{"protocol": "static"}]
        });
        let attr: BgpProcNodeAttribute = serde_json::from_value(raw).unwrap();
        assert_eq!(attr.confederation_asn(), Some(65550));
        assert!(attr.is_ext_bgp_speaker());
        assert_eq!(attr.prefix_set[0].prefix_strings(), vec!["10.0.0.0/8"]);
        assert!(attr.extra.contains_key("redistribute"));

        let back = serde_json::to_value(&attr).unwrap();
        assert_eq!(back["redistribute"], json!([{"protocol": "static"}]));
    }

    #[test]
    fn test_absent_members_stay_absent() {
        let raw = json!({"router-id": "192.168.255.5"});
        let mut attr: BgpProcNodeAttribute = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&attr).unwrap(), raw);

        attr.flag.push("ext-bgp-speaker".to_string());
        assert_eq!(serde_json::to_value(&attr).unwrap()["flag"], json!(["ext-bgp-speaker"]));

        let raw = json!({"ip-address": [], "description": "unused"});
        let attr: L3TermPointAttribute = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&attr).unwrap(), raw);
    }

    #[test]
    fn test_negative_confederation_id_is_none() {
        let attr: BgpProcNodeAttribute =
            serde_json::from_value(json!({"confederation-id": -1})).unwrap();
        assert_eq!(attr.confederation_asn(), None);
    }

    #[test]
    fn test_replace_group_replaces_whole_sequence() {
        let mut attr = BgpProcNodeAttribute {
            policy: vec![json!({"name": "old-1"}), json!({"name": "old-2"})].into(),
            ..Default::default()
        };
        attr.replace_group(BgpProcNodeGroup::Policy, json!([{"name": "new"}]))
            .unwrap();
        assert_eq!(attr.policy, vec![json!({"name": "new"})]);
    }

    #[test]
    fn test_replace_group_rejects_bad_shape() {
        let mut attr = BgpProcNodeAttribute::default();
        let err = attr
            .replace_group(BgpProcNodeGroup::PrefixSet, json!({"name": "x"}))
            .unwrap_err();
        assert!(err.to_string().contains("prefix-set"));
    }

    #[test]
    fn test_group_parsing() {
        assert_eq!("as-path-set".parse::<BgpProcNodeGroup>(), Ok(BgpProcNodeGroup::AsPathSet));
        assert!("router-id".parse::<BgpProcNodeGroup>().is_err());
        assert_eq!(
            "export-policy".parse::<BgpProcTermPointGroup>(),
            Ok(BgpProcTermPointGroup::ExportPolicy)
        );
    }
}
