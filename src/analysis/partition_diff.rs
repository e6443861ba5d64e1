//! Partition diff scoring.
//!
//! Compares the network sets of a baseline (physical) snapshot with the
//! network sets of snapshots derived from it by simulated failures.
//!
//! - A baseline set whose nodes end up in two or more derived sets is a
//!   *separation*. A baseline node missing from the derived snapshot counts
//!   as a part of its own.
//! - A derived set drawing nodes from two or more baseline sets is a *merge*.
//!
//! The score is the number of distinct nodes taking part in any event.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::partition::{network_sets, NetworkSet, NetworkSets};
use crate::error::Result;
use crate::store::{SnapshotPattern, TopologyStore};

/// A baseline set split across several derived parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparatedSet {
    pub source: NetworkSet,
    pub targets: Vec<NetworkSet>,
}

/// Several baseline parts joined in one derived set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedSet {
    pub sources: Vec<NetworkSet>,
    pub target: NetworkSet,
}

/// Diff of one derived snapshot against its baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSetsDiff {
    pub source_snapshot: String,
    pub target_snapshot: String,
    pub score: usize,
    pub merged_sets: Vec<MergedSet>,
    pub separated_sets: Vec<SeparatedSet>,
}

impl NetworkSetsDiff {
    pub fn is_unchanged(&self) -> bool {
        self.merged_sets.is_empty() && self.separated_sets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Part<'a> {
    Set(usize),
    Lost(&'a str),
}

fn membership(sets: &NetworkSets) -> BTreeMap<&str, usize> {
    sets.sets
        .iter()
        .enumerate()
        .flat_map(|(i, set)| set.iter().map(move |node| (node.as_str(), i)))
        .collect()
}

/// Diff two partitions of the same layer
pub fn diff_network_sets(
    source_snapshot: &str,
    baseline: &NetworkSets,
    target_snapshot: &str,
    derived: &NetworkSets,
) -> NetworkSetsDiff {
    let baseline_of = membership(baseline);
    let derived_of = membership(derived);
    let mut changed: BTreeSet<&str> = BTreeSet::new();

    let mut separated_sets = Vec::new();
    for source in &baseline.sets {
        let mut parts: BTreeMap<Part, NetworkSet> = BTreeMap::new();
        for node in source {
            let part = match derived_of.get(node.as_str()) {
                Some(&i) => Part::Set(i),
                None => Part::Lost(node.as_str()),
            };
            parts.entry(part).or_default().insert(node.clone());
        }
        if parts.len() >= 2 {
            changed.extend(source.iter().map(String::as_str));
            let mut targets: Vec<NetworkSet> = parts.into_values().collect();
            targets.sort();
            separated_sets.push(SeparatedSet {
                source: source.clone(),
                targets,
            });
        }
    }

    let mut merged_sets = Vec::new();
    for target in &derived.sets {
        let mut parts: BTreeMap<usize, NetworkSet> = BTreeMap::new();
        for node in target {
            // nodes that only exist in the derived snapshot are not compared
            if let Some(&i) = baseline_of.get(node.as_str()) {
                parts.entry(i).or_default().insert(node.clone());
            }
        }
        if parts.len() >= 2 {
            let mut sources: Vec<NetworkSet> = parts.into_values().collect();
            sources.sort();
            let joined: NetworkSet = sources.iter().flatten().cloned().collect();
            changed.extend(
                target
                    .iter()
                    .map(String::as_str)
                    .filter(|node| baseline_of.contains_key(node)),
            );
            merged_sets.push(MergedSet {
                sources,
                target: joined,
            });
        }
    }

    NetworkSetsDiff {
        source_snapshot: source_snapshot.to_string(),
        target_snapshot: target_snapshot.to_string(),
        score: changed.len(),
        merged_sets,
        separated_sets,
    }
}

/// Drop diffs scoring below `min_score`, then order by score (descending)
/// and target snapshot name
pub fn filter_and_sort(mut diffs: Vec<NetworkSetsDiff>, min_score: usize) -> Vec<NetworkSetsDiff> {
    diffs.retain(|diff| diff.score >= min_score);
    diffs.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.target_snapshot.cmp(&b.target_snapshot))
    });
    diffs
}

/// Diff every snapshot derived from `snapshot` against the source snapshot
/// its pattern names
pub fn subsets_diff<S: TopologyStore>(
    store: &S,
    network: &str,
    snapshot: &str,
    layer: &str,
    min_score: usize,
) -> Result<Vec<NetworkSetsDiff>> {
    let patterns = store.fetch_snapshot_patterns(network, snapshot)?;
    log::info!(
        "Diff {} derived snapshots of {}/{} on {}",
        patterns.len(),
        network,
        snapshot,
        layer
    );

    let sources: BTreeSet<&str> = patterns
        .iter()
        .map(|pattern| pattern.source_snapshot_name.as_str())
        .collect();
    let baselines = sources
        .into_par_iter()
        .map(|source| {
            store
                .load_networks(network, source)
                .and_then(|networks| network_sets(&networks, layer))
                .map(|sets| (source, sets))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    let diffs = patterns
        .par_iter()
        .map(|pattern: &SnapshotPattern| -> Result<NetworkSetsDiff> {
            let source = pattern.source_snapshot_name.as_str();
            let target = &pattern.target_snapshot_name;
            let baseline = &baselines[source];
            let derived = network_sets(&store.load_networks(network, target)?, layer)?;
            let diff = diff_network_sets(source, baseline, target, &derived);
            log::debug!("{}/{} -> {}: score {}", network, source, target, diff.score);
            Ok(diff)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(filter_and_sort(diffs, min_score))
}
