//! Partition analysis of topology layers.
//!
//! This module computes the connected components ("network sets") of a
//! layer and scores how simulated failures change them.

pub mod partition;
pub mod partition_diff;
pub mod report;

pub use partition::{all_network_sets, network_sets, partition_network, NetworkSet, NetworkSets};
pub use partition_diff::{
    diff_network_sets, filter_and_sort, subsets_diff, MergedSet, NetworkSetsDiff, SeparatedSet,
};
pub use report::{
    generate_json_report, generate_text_report, render_diff_text, render_subsets_text,
    ReportMetadata, SubsetsDiffReport,
};
