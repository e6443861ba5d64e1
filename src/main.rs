use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use topoconductor::analysis::{
    all_network_sets, render_diff_text, render_subsets_text, subsets_diff, SubsetsDiffReport,
};
use topoconductor::bgp::{detect_preferred_peer, patch_nodes, NodePatch};
use topoconductor::candidate::{CandidateOptions, CandidateTopologyGenerator, FlowRow};
use topoconductor::config::{load_config, Config};
use topoconductor::splice::TopologySplicer;
use topoconductor::store::{FsStore, TopologyStore};
use topoconductor::topology::{Networks, BGP_PROC};

/// Multi-layer network topology engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root directory of the topology store (overrides the config file)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Snapshot addressed by a command
#[derive(clap::Args, Debug, Clone, PartialEq)]
struct SnapshotArgs {
    /// Network name
    #[arg(short, long)]
    network: String,

    /// Snapshot name
    #[arg(short = 'S', long)]
    snapshot: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Network sets of every layer of a snapshot
    Subsets {
        #[command(flatten)]
        target: SnapshotArgs,

        /// Print a text report instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Score every snapshot derived from a physical snapshot
    SubsetsDiff {
        #[command(flatten)]
        target: SnapshotArgs,

        /// Layer to compare (defaults to the config file)
        #[arg(short, long)]
        layer: Option<String>,

        /// Drop snapshots scoring below this value
        #[arg(long)]
        min_score: Option<usize>,

        /// Print a text report instead of JSON
        #[arg(long)]
        text: bool,

        /// Also write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge an external-AS topology into a snapshot
    Splice {
        #[command(flatten)]
        target: SnapshotArgs,

        /// RFC 8345 JSON file of the external topology
        #[arg(short, long)]
        external: PathBuf,

        /// Print the result without storing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Replace BGP policy attribute groups of nodes
    Policies {
        #[command(flatten)]
        target: SnapshotArgs,

        /// JSON file with a list of node patches
        #[arg(short, long)]
        patch: PathBuf,

        #[arg(short, long, default_value = BGP_PROC)]
        layer: String,
    },
    /// Mark the external BGP speaker peering at an interface as preferred
    PreferredPeer {
        #[command(flatten)]
        target: SnapshotArgs,

        /// External AS number
        #[arg(long)]
        ext_asn: u32,

        /// Internal layer3 node
        #[arg(long)]
        node: String,

        /// Interface of the layer3 node
        #[arg(long)]
        interface: String,

        #[arg(short, long, default_value = BGP_PROC)]
        layer: String,
    },
    /// Generate and store candidate topologies for a use case
    Candidates {
        #[command(flatten)]
        target: SnapshotArgs,

        /// Use case name (pni_te, multi_region_te)
        #[arg(short, long)]
        usecase: String,

        #[arg(long, default_value_t = 1)]
        phase: u32,

        /// Number of candidates to generate
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// Steering layer3 node
        #[arg(long)]
        node: String,

        /// Interface of the steering node
        #[arg(long)]
        interface: String,

        /// JSON file of observed flows; selects flow matching
        #[arg(long)]
        flow_data: Option<PathBuf>,
    },
    /// Check the referential integrity of a snapshot
    Verify {
        #[command(flatten)]
        target: SnapshotArgs,
    },
}

#[derive(Debug, Serialize)]
struct VerifyResult<'a> {
    network: &'a str,
    snapshot: &'a str,
    layers: usize,
    ok: bool,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).wrap_err("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path).wrap_err_with(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(root) = &args.store {
        config.store.root = root.clone();
    }
    if let Some(level) = &args.log_level {
        config.general.log_level = level.clone();
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(&config.general.log_level)).init();

    info!("Starting topoconductor");
    info!("Store root: {:?}", config.store.root);

    let store = FsStore::new(&config.store.root);
    run(&store, &config, args.command)
}

fn run<S: TopologyStore>(store: &S, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Subsets { target, text } => {
            let networks = store
                .load_networks(&target.network, &target.snapshot)
                .wrap_err("Failed to load topology")?;
            let subsets = all_network_sets(&networks).wrap_err("Failed to compute network sets")?;
            if text {
                println!("{}", render_subsets_text(&subsets));
            } else {
                print_json(&subsets)?;
            }
        }
        Command::SubsetsDiff {
            target,
            layer,
            min_score,
            text,
            output,
        } => {
            let layer = layer.unwrap_or_else(|| config.subsets.layer.clone());
            let min_score = min_score.unwrap_or(config.subsets.min_score);
            let diffs = subsets_diff(store, &target.network, &target.snapshot, &layer, min_score)
                .wrap_err("Failed to diff derived snapshots")?;
            let report = SubsetsDiffReport::new(&target.network, &target.snapshot, &layer, min_score, diffs);
            if let Some(path) = output {
                topoconductor::analysis::generate_json_report(&report, &path)
                    .wrap_err_with(|| format!("Failed to write report {}", path.display()))?;
            }
            if text {
                println!("{}", render_diff_text(&report));
            } else {
                print_json(&report)?;
            }
        }
        Command::Splice {
            target,
            external,
            dry_run,
        } => {
            let internal = store
                .load_networks(&target.network, &target.snapshot)
                .wrap_err("Failed to load internal topology")?;
            let external_data: serde_json::Value = read_json(&external)?;
            let external = Networks::load(&external_data).wrap_err("Failed to load external topology")?;

            let mut splicer = TopologySplicer::new(internal, external);
            let summary = splicer.splice().wrap_err("Failed to splice topologies")?;
            if dry_run {
                info!("Dry run, snapshot not stored");
            } else if summary.conflict.is_none() {
                store
                    .save_networks(&target.network, &target.snapshot, splicer.networks())
                    .wrap_err("Failed to store spliced topology")?;
            }
            print_json(&summary)?;
        }
        Command::Policies { target, patch, layer } => {
            let patches: Vec<NodePatch> = read_json(&patch)?;
            let mut networks = store
                .load_networks(&target.network, &target.snapshot)
                .wrap_err("Failed to load topology")?;
            let summary = patch_nodes(&mut networks, &layer, &patches).wrap_err("Failed to patch policies")?;
            for key in &summary.skipped_keys {
                warn!("Skipped patch key {}", key);
            }
            store
                .save_networks(&target.network, &target.snapshot, &networks)
                .wrap_err("Failed to store patched topology")?;
            print_json(&summary)?;
        }
        Command::PreferredPeer {
            target,
            ext_asn,
            node,
            interface,
            layer,
        } => {
            let mut networks = store
                .load_networks(&target.network, &target.snapshot)
                .wrap_err("Failed to load topology")?;
            let peer = detect_preferred_peer(&mut networks, &layer, ext_asn, &node, &interface)
                .wrap_err("Failed to detect preferred peer")?;
            store
                .save_networks(&target.network, &target.snapshot, &networks)
                .wrap_err("Failed to store topology")?;
            print_json(&peer)?;
        }
        Command::Candidates {
            target,
            usecase,
            phase,
            count,
            node,
            interface,
            flow_data,
        } => {
            let flow_data: Option<Vec<FlowRow>> = flow_data.as_deref().map(read_json::<Vec<FlowRow>>).transpose()?;
            let generator = CandidateTopologyGenerator::new(store, &target.network, &target.snapshot, &usecase)
                .wrap_err("Failed to prepare candidate generator")?
                .with_default_max_bandwidth(config.candidates.default_max_bandwidth_bps)
                .with_prefix_set_pattern(&config.candidates.prefix_set_pattern);
            let opts = CandidateOptions {
                phase_number: phase,
                candidate_number: count,
                node,
                interface,
                flow_data,
            };
            let infos = generator.generate(&opts).wrap_err("Failed to generate candidates")?;
            let infos = generator
                .store_candidates(infos)
                .wrap_err("Failed to store candidates")?;
            print_json(&infos)?;
        }
        Command::Verify { target } => {
            let networks = store
                .load_networks(&target.network, &target.snapshot)
                .wrap_err("Failed to load topology")?;
            networks
                .verify()
                .wrap_err_with(|| format!("{}/{} is inconsistent", target.network, target.snapshot))?;
            print_json(&VerifyResult {
                network: &target.network,
                snapshot: &target.snapshot,
                layers: networks.networks().len(),
                ok: true,
            })?;
        }
    }
    Ok(())
}
