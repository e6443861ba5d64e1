//! Flow-data table and prefix-combination ranking.

use ipnet::IpNet;
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::{parse_prefix_or_addr, prefix_contains};

/// One observed flow; `rate` is in Mbps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRow {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub dest: String,
    #[serde(deserialize_with = "deserialize_number")]
    pub rate: f64,
}

/// Accept a JSON number or a numeric string such as `"0.8e9"`
pub(crate) fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Float(f64),
        Text(String),
    }

    match Number::deserialize(deserializer)? {
        Number::Float(value) => Ok(value),
        Number::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number {:?}: {}", text, e))),
    }
}

/// A combination of prefixes and the traffic it carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedFlow {
    pub prefixes: Vec<String>,
    /// Mbps, floored to 2 decimals
    pub rate: f64,
    /// `rate - target`, floored to 2 decimals
    pub diff: f64,
}

/// Floor to 2 decimals, taking the next cent when `value * 100` lands just
/// below an integer (`0.29 * 100 == 28.999...`)
fn floor2(value: f64) -> f64 {
    let cents = (value * 100.0).floor();
    let next = (cents + 1.0) / 100.0;
    if next <= value {
        next
    } else {
        cents / 100.0
    }
}

pub struct FlowDataTable {
    rows: Vec<(FlowRow, IpNet)>,
}

impl FlowDataTable {
    /// Rows whose destination does not parse are skipped
    pub fn new(rows: Vec<FlowRow>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|row| match parse_prefix_or_addr(&row.dest) {
                Some(dest) => Some((row, dest)),
                None => {
                    warn!("Unparsable flow destination {:?}, skip the row", row.dest);
                    None
                }
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total rate of the rows falling inside each prefix, in prefix order
    ///
    /// A row counts for every prefix containing it. Prefixes without any
    /// row cannot steer traffic and are left out.
    pub fn rates_by_prefix(&self, prefixes: &[String]) -> Vec<(String, f64)> {
        let mut table = Vec::new();
        for prefix_str in prefixes {
            let Some(prefix) = parse_prefix_or_addr(prefix_str) else {
                warn!("Unparsable prefix {:?} in prefix-set, skip it", prefix_str);
                continue;
            };
            let matched: Vec<f64> = self
                .rows
                .iter()
                .filter(|(_, dest)| prefix_contains(&prefix, dest))
                .map(|(row, _)| row.rate)
                .collect();
            if !matched.is_empty() {
                table.push((prefix_str.clone(), matched.iter().sum()));
            }
        }
        table
    }

    /// Every prefix combination ranked by distance from `target_mbps`
    pub fn aggregated_flows_by_prefix(&self, prefixes: &[String], target_mbps: f64) -> Vec<AggregatedFlow> {
        let prefix_rates = self.rates_by_prefix(prefixes);
        aggregate_prefix_combinations(&prefix_rates, prefixes.len(), target_mbps)
    }
}

/// Enumerate combinations of 1..=`combination_count` prefixes, sum their
/// rates, and sort by `|diff|` ascending (ties keep enumeration order)
pub fn aggregate_prefix_combinations(
    prefix_rates: &[(String, f64)],
    combination_count: usize,
    target_mbps: f64,
) -> Vec<AggregatedFlow> {
    let depth = combination_count.min(prefix_rates.len());
    let mut aggregates: Vec<AggregatedFlow> = (1..=depth)
        .flat_map(|size| prefix_rates.iter().combinations(size))
        .map(|combination| {
            let rate = floor2(combination.iter().map(|(_, rate)| rate).sum());
            AggregatedFlow {
                prefixes: combination.iter().map(|(prefix, _)| prefix.clone()).collect(),
                rate,
                diff: floor2(rate - target_mbps),
            }
        })
        .collect();
    aggregates.sort_by(|a, b| a.diff.abs().total_cmp(&b.diff.abs()));
    aggregates
}
