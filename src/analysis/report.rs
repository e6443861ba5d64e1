//! Report generation for partition analysis.
//!
//! Generates both JSON and human-readable text reports.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::partition::{NetworkSet, NetworkSets};
use super::partition_diff::NetworkSetsDiff;
use crate::error::Result;

/// Metadata about a subsets-diff run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub network: String,
    pub snapshot: String,
    pub layer: String,
    pub min_score: usize,
}

/// Reported diffs of every derived snapshot scoring at least `min_score`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetsDiffReport {
    pub metadata: ReportMetadata,
    pub diffs: Vec<NetworkSetsDiff>,
}

impl SubsetsDiffReport {
    pub fn new(network: &str, snapshot: &str, layer: &str, min_score: usize, diffs: Vec<NetworkSetsDiff>) -> Self {
        Self {
            metadata: ReportMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                network: network.to_string(),
                snapshot: snapshot.to_string(),
                layer: layer.to_string(),
                min_score,
            },
            diffs,
        }
    }
}

/// Generate JSON report
pub fn generate_json_report<T: Serialize>(report: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(output_path, json)?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Generate human-readable text report
pub fn generate_text_report(report: &SubsetsDiffReport, output_path: &Path) -> Result<()> {
    fs::write(output_path, render_diff_text(report))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

fn banner(lines: &mut Vec<String>, title: &str) {
    lines.push("=".repeat(80));
    lines.push(format!("{:^80}", title));
    lines.push("=".repeat(80));
    lines.push(String::new());
}

fn format_set(set: &NetworkSet) -> String {
    let names: Vec<&str> = set.iter().map(String::as_str).collect();
    format!("{{{}}}", names.join(", "))
}

/// Text rendering of the network sets of every layer
pub fn render_subsets_text(subsets: &[NetworkSets]) -> String {
    let mut lines: Vec<String> = Vec::new();
    banner(&mut lines, "NETWORK SETS");

    for sets in subsets {
        lines.push(format!(
            "Layer {}: {} nodes in {} sets",
            sets.network,
            sets.node_count(),
            sets.sets.len()
        ));
        for (i, set) in sets.sets.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, format_set(set)));
        }
        lines.push(String::new());
    }

    lines.push("=".repeat(80));
    lines.join("\n")
}

/// Text rendering of a subsets-diff run
pub fn render_diff_text(report: &SubsetsDiffReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    banner(&mut lines, "NETWORK SETS DIFF");

    let meta = &report.metadata;
    lines.push(format!("Analysis Date: {}", meta.generated_at));
    lines.push(format!("Network: {}", meta.network));
    lines.push(format!("Baseline Snapshot: {}", meta.snapshot));
    lines.push(format!("Layer: {}", meta.layer));
    lines.push(format!("Minimum Score: {}", meta.min_score));
    lines.push(format!("Reported Snapshots: {}", report.diffs.len()));
    lines.push(String::new());

    for diff in &report.diffs {
        lines.push("-".repeat(80));
        lines.push(format!("{} (score {})", diff.target_snapshot, diff.score));
        if diff.is_unchanged() {
            lines.push("  no change".to_string());
        }
        for separated in &diff.separated_sets {
            lines.push(format!("  separated: {}", format_set(&separated.source)));
            for target in &separated.targets {
                lines.push(format!("    -> {}", format_set(target)));
            }
        }
        for merged in &diff.merged_sets {
            lines.push(format!("  merged: {}", format_set(&merged.target)));
            for source in &merged.sources {
                lines.push(format!("    <- {}", format_set(source)));
            }
        }
        lines.push(String::new());
    }

    // Footer
    lines.push("=".repeat(80));
    lines.join("\n")
}
