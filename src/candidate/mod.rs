//! Candidate topology synthesizer.
//!
//! For a traffic-engineering use case, derives candidate snapshots from a
//! base snapshot by editing the advertised prefix-set of the BGP-process
//! node that runs on the steering L3 node:
//!
//! - *simple select* (no flow data): candidate `i` omits the `i`-th prefix
//! - *flow matching*: candidate `i` keeps exactly the prefixes of the `i`-th
//!   combination ranked closest to the expected bandwidth
//!
//! The base snapshot is reloaded from the store for every candidate.

pub mod flow_table;

pub use flow_table::{aggregate_prefix_combinations, AggregatedFlow, FlowDataTable, FlowRow};

use std::str::FromStr;

use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, Result, TopologyError};
use crate::store::TopologyStore;
use crate::topology::attributes::{BgpPrefix, BgpPrefixSet};
use crate::topology::{Networks, BGP_PROC, LAYER3};

/// Expected bandwidth when the use case names none for the observed interface
/// (80% of 10GbE)
pub const DEFAULT_MAX_BANDWIDTH_BPS: f64 = 8e8;
/// Name pattern of the advertised prefix-set; `{asn}` is replaced
pub const DEFAULT_PREFIX_SET_PATTERN: &str = "as{asn}-advd-ipv4";
/// Source key of use-case parameters in the store
pub const PARAMS_SOURCE_KEY: &str = "params";

/// Supported traffic-engineering use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    PniTe,
    MultiRegionTe,
}

impl UseCase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PniTe => "pni_te",
            Self::MultiRegionTe => "multi_region_te",
        }
    }
}

impl FromStr for UseCase {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pni_te" => Ok(Self::PniTe),
            "multi_region_te" => Ok(Self::MultiRegionTe),
            other => Err(TopologyError::UnsupportedUseCase(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAs {
    pub asn: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Expected traffic at one observed interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficTarget {
    pub node: String,
    pub interface: String,
    /// bps
    #[serde(deserialize_with = "flow_table::deserialize_number")]
    pub expected_max_bandwidth: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedTraffic {
    #[serde(default)]
    pub original_targets: Vec<TrafficTarget>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Use-case parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsecaseParams {
    pub source_as: SourceAs,
    #[serde(default)]
    pub expected_traffic: ExpectedTraffic,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-request options of a generation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOptions {
    pub phase_number: u32,
    pub candidate_number: usize,
    /// Steering L3 node
    pub node: String,
    pub interface: String,
    #[serde(default)]
    pub flow_data: Option<Vec<FlowRow>>,
}

/// Why a candidate looks the way it does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateCondition {
    Omit {
        omit_index: usize,
        omit_policy: Option<BgpPrefix>,
    },
    Flow(AggregatedFlow),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&TopologyError> for CandidateFailure {
    fn from(err: &TopologyError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTopologyInfo {
    pub network: String,
    pub snapshot: String,
    pub candidate_index: usize,
    pub candidate_condition: CandidateCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CandidateFailure>,
}

impl CandidateTopologyInfo {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub fn candidate_snapshot_name(base_snapshot: &str, phase_number: u32, candidate_index: usize) -> String {
    format!("{}_candidate_{}_{}", base_snapshot, phase_number, candidate_index)
}

/// Prefix-set of the BGP-process node running on `layer3/<l3_node>` whose
/// name matches `name_pattern`
pub fn pickup_prefix_set<'a>(
    networks: &'a mut Networks,
    l3_node: &str,
    name_pattern: &Regex,
) -> Result<&'a mut BgpPrefixSet> {
    let bgp_proc = networks.network_mut(BGP_PROC)?;
    let node_name = bgp_proc
        .find_node_by_support(LAYER3, l3_node)
        .map(|node| node.name().to_string())
        .ok_or_else(|| {
            TopologyError::not_found(format!(
                "bgp-proc node that supports {}:{} in network:{}",
                LAYER3, l3_node, BGP_PROC
            ))
        })?;

    bgp_proc
        .find_node_mut(&node_name)
        .and_then(|node| node.attribute.as_bgp_proc_mut())
        .and_then(|attr| {
            attr.prefix_set
                .iter_mut()
                .find(|prefix_set| name_pattern.is_match(&prefix_set.name))
        })
        .ok_or_else(|| {
            TopologyError::not_found(format!(
                "prefix-set: {} in node:{}",
                name_pattern.as_str(),
                node_name
            ))
        })
}

/// Generates candidate topologies of one (network, snapshot) for a use case
pub struct CandidateTopologyGenerator<'a, S: TopologyStore> {
    store: &'a S,
    network: String,
    snapshot: String,
    usecase: UseCase,
    params: UsecaseParams,
    default_max_bandwidth_bps: f64,
    prefix_set_pattern: String,
}

impl<'a, S: TopologyStore> CandidateTopologyGenerator<'a, S> {
    /// Resolve the use case and fetch its parameters
    ///
    /// Unsupported use cases fail before anything is fetched.
    pub fn new(store: &'a S, network: &str, snapshot: &str, usecase: &str) -> Result<Self> {
        let usecase = UseCase::from_str(usecase)?;
        let raw = store.fetch_usecase_source(usecase.name(), network, PARAMS_SOURCE_KEY)?;
        let params: UsecaseParams = serde_json::from_value(raw).map_err(|e| {
            TopologyError::validation(format!("Invalid params of usecase {}: {}", usecase.name(), e))
        })?;
        Ok(Self {
            store,
            network: network.to_string(),
            snapshot: snapshot.to_string(),
            usecase,
            params,
            default_max_bandwidth_bps: DEFAULT_MAX_BANDWIDTH_BPS,
            prefix_set_pattern: DEFAULT_PREFIX_SET_PATTERN.to_string(),
        })
    }

    pub fn with_default_max_bandwidth(mut self, bps: f64) -> Self {
        self.default_max_bandwidth_bps = bps;
        self
    }

    pub fn with_prefix_set_pattern(mut self, pattern: &str) -> Self {
        self.prefix_set_pattern = pattern.to_string();
        self
    }

    pub fn usecase(&self) -> UseCase {
        self.usecase
    }

    pub fn params(&self) -> &UsecaseParams {
        &self.params
    }

    fn prefix_set_regex(&self) -> Result<Regex> {
        let name = self
            .prefix_set_pattern
            .replace("{asn}", &self.params.source_as.asn.to_string());
        Regex::new(&name)
            .map_err(|e| TopologyError::validation(format!("Invalid prefix-set pattern {}: {}", name, e)))
    }

    /// Expected bandwidth (Mbps) at the observed interface
    fn expected_max_bandwidth_mbps(&self, opts: &CandidateOptions) -> f64 {
        let bps = self
            .params
            .expected_traffic
            .original_targets
            .iter()
            .find(|t| t.node == opts.node && t.interface == opts.interface)
            .map(|t| t.expected_max_bandwidth)
            .unwrap_or_else(|| {
                warn!(
                    "No expected traffic for {}[{}], assume {} bps",
                    opts.node, opts.interface, self.default_max_bandwidth_bps
                );
                self.default_max_bandwidth_bps
            });
        // flow rates are Mbps
        bps / 1e6
    }

    fn candidate_info(
        &self,
        opts: &CandidateOptions,
        candidate_index: usize,
        condition: CandidateCondition,
        outcome: std::result::Result<Value, &TopologyError>,
    ) -> CandidateTopologyInfo {
        let (topology, error) = match outcome {
            Ok(topology) => (Some(topology), None),
            Err(err) => (None, Some(CandidateFailure::from(err))),
        };
        CandidateTopologyInfo {
            network: self.network.clone(),
            snapshot: candidate_snapshot_name(&self.snapshot, opts.phase_number, candidate_index),
            candidate_index,
            candidate_condition: condition,
            topology,
            error,
        }
    }

    /// Generate `opts.candidate_number` candidates
    pub fn generate(&self, opts: &CandidateOptions) -> Result<Vec<CandidateTopologyInfo>> {
        info!(
            "Generate {} candidates of {}/{} (usecase {}, phase {})",
            opts.candidate_number,
            self.network,
            self.snapshot,
            self.usecase.name(),
            opts.phase_number
        );
        match &opts.flow_data {
            Some(rows) => self.candidates_by_flows(opts, rows),
            None => self.candidates_by_simple_select(opts),
        }
    }

    fn omit_prefix(&self, opts: &CandidateOptions, candidate_index: usize) -> Result<(Value, BgpPrefix)> {
        let mut base = self.store.load_networks(&self.network, &self.snapshot)?;
        let prefix_set = pickup_prefix_set(&mut base, &opts.node, &self.prefix_set_regex()?)?;
        let size = prefix_set.prefixes.len();
        if candidate_index == 0 || candidate_index > size {
            return Err(TopologyError::IndexOutOfRange {
                index: candidate_index,
                size,
            });
        }
        let omitted = prefix_set.prefixes.remove(candidate_index - 1);
        Ok((base.to_data()?, omitted))
    }

    fn candidates_by_simple_select(&self, opts: &CandidateOptions) -> Result<Vec<CandidateTopologyInfo>> {
        let mut infos = Vec::with_capacity(opts.candidate_number);
        for candidate_index in 1..=opts.candidate_number {
            let info = match self.omit_prefix(opts, candidate_index) {
                Ok((topology, omitted)) => self.candidate_info(
                    opts,
                    candidate_index,
                    CandidateCondition::Omit {
                        omit_index: candidate_index,
                        omit_policy: Some(omitted),
                    },
                    Ok(topology),
                ),
                Err(err @ TopologyError::IndexOutOfRange { .. }) => {
                    warn!("Candidate {}: {}", candidate_index, err);
                    self.candidate_info(
                        opts,
                        candidate_index,
                        CandidateCondition::Omit {
                            omit_index: candidate_index,
                            omit_policy: None,
                        },
                        Err(&err),
                    )
                }
                Err(err) => return Err(err),
            };
            infos.push(info);
        }
        Ok(infos)
    }

    fn keep_prefixes(&self, opts: &CandidateOptions, flow: &AggregatedFlow) -> Result<Value> {
        let mut base = self.store.load_networks(&self.network, &self.snapshot)?;
        let prefix_set = pickup_prefix_set(&mut base, &opts.node, &self.prefix_set_regex()?)?;
        prefix_set
            .prefixes
            .retain(|prefix| flow.prefixes.contains(&prefix.prefix));
        base.to_data()
    }

    fn candidates_by_flows(&self, opts: &CandidateOptions, rows: &[FlowRow]) -> Result<Vec<CandidateTopologyInfo>> {
        let target_mbps = self.expected_max_bandwidth_mbps(opts);
        let mut base = self.store.load_networks(&self.network, &self.snapshot)?;
        let prefixes = pickup_prefix_set(&mut base, &opts.node, &self.prefix_set_regex()?)?.prefix_strings();

        let table = FlowDataTable::new(rows.to_vec());
        let flows = table.aggregated_flows_by_prefix(&prefixes, target_mbps);

        let mut candidate_number = opts.candidate_number;
        if flows.len() < candidate_number {
            warn!(
                "Candidate number to set {} because flows too little",
                flows.len()
            );
            candidate_number = flows.len();
        }

        flows
            .into_iter()
            .take(candidate_number)
            .enumerate()
            .map(|(i, flow)| -> Result<CandidateTopologyInfo> {
                let topology = self.keep_prefixes(opts, &flow)?;
                Ok(self.candidate_info(opts, i + 1, CandidateCondition::Flow(flow), Ok(topology)))
            })
            .collect()
    }

    /// Store every successful candidate and return the infos without their
    /// topology payload
    pub fn store_candidates(&self, infos: Vec<CandidateTopologyInfo>) -> Result<Vec<CandidateTopologyInfo>> {
        infos
            .into_iter()
            .map(|mut info| -> Result<CandidateTopologyInfo> {
                if let Some(topology) = info.topology.take() {
                    self.store.store_topology(&info.network, &info.snapshot, topology)?;
                }
                Ok(info)
            })
            .collect()
    }
}
