//! Partition (network set) analysis.
//!
//! Computes the maximal groups of mutually reachable nodes in a layer,
//! treating every directed link as an undirected adjacency. Sets are kept
//! ordered so repeated runs on the same snapshot give identical output.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopologyError};
use crate::topology::{Network, Networks};

/// A maximal set of mutually reachable node names
pub type NetworkSet = BTreeSet<String>;

/// Partition of one layer into network sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSets {
    pub network: String,
    pub sets: Vec<NetworkSet>,
}

impl NetworkSets {
    /// Total number of nodes across all sets
    pub fn node_count(&self) -> usize {
        self.sets.iter().map(BTreeSet::len).sum()
    }

    /// Index of the set containing `node`
    pub fn set_index_of(&self, node: &str) -> Option<usize> {
        self.sets.iter().position(|set| set.contains(node))
    }
}

/// Partition the named layer of a snapshot
pub fn network_sets(networks: &Networks, layer: &str) -> Result<NetworkSets> {
    let network = networks.network(layer)?;
    partition_network(network)
}

/// Partition every layer of a snapshot, in layer order
pub fn all_network_sets(networks: &Networks) -> Result<Vec<NetworkSets>> {
    networks.networks().iter().map(partition_network).collect()
}

/// Partition a single layer
pub fn partition_network(network: &Network) -> Result<NetworkSets> {
    let graph = build_adjacency(network)?;
    let sets = find_connected_components(&graph);
    log::debug!(
        "Network {}: {} nodes in {} network sets",
        network.name(),
        network.nodes().len(),
        sets.len()
    );
    Ok(NetworkSets {
        network: network.name().to_string(),
        sets,
    })
}

/// Undirected adjacency of a layer (node -> neighbours)
fn build_adjacency(network: &Network) -> Result<BTreeMap<&str, BTreeSet<&str>>> {
    let mut graph: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    // Initialize all nodes, so isolated nodes become singleton sets
    for node in network.nodes() {
        graph.insert(node.name(), BTreeSet::new());
    }

    for link in network.links() {
        let src = link.source.node.as_str();
        let dst = link.destination.node.as_str();
        for endpoint in [src, dst] {
            if !graph.contains_key(endpoint) {
                return Err(TopologyError::integrity(format!(
                    "Link {} in {} refers to unknown node {}",
                    link.key(),
                    network.name(),
                    endpoint
                )));
            }
        }
        graph.entry(src).or_default().insert(dst);
        graph.entry(dst).or_default().insert(src);
    }

    Ok(graph)
}

/// Find connected components using BFS
fn find_connected_components(graph: &BTreeMap<&str, BTreeSet<&str>>) -> Vec<NetworkSet> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut components: Vec<NetworkSet> = Vec::new();

    for &start_node in graph.keys() {
        if visited.contains(start_node) {
            continue;
        }

        let mut component = NetworkSet::new();
        let mut queue: Vec<&str> = vec![start_node];

        while let Some(node) = queue.pop() {
            if !visited.insert(node) {
                continue;
            }
            component.insert(node.to_string());

            if let Some(neighbors) = graph.get(node) {
                queue.extend(neighbors.iter().filter(|n| !visited.contains(*n)));
            }
        }

        components.push(component);
    }

    components.sort();
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Link, Node, TermPoint};

    fn node(name: &str) -> Node {
        let mut node = Node::new(name);
        node.append_term_point(TermPoint::new("p"));
        node
    }

    fn layer(names: &[&str], pairs: &[(&str, &str)]) -> Networks {
        let mut network = Network::new("layer3");
        for name in names {
            network.append_node(node(name));
        }
        for (a, b) in pairs {
            network.append_link(Link::new(a, "p", b, "p"));
            network.append_link(Link::new(b, "p", a, "p"));
        }
        let mut networks = Networks::new();
        networks.push_network(network);
        networks
    }

    fn set(names: &[&str]) -> NetworkSet {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_isolated_nodes_are_singletons() {
        let networks = layer(&["a", "b", "c"], &[("a", "b")]);
        let result = network_sets(&networks, "layer3").unwrap();
        assert_eq!(result.sets, vec![set(&["a", "b"]), set(&["c"])]);
    }

    #[test]
    fn test_unidirectional_link_connects_both_ways() {
        let mut network = Network::new("layer3");
        network.append_node(node("a"));
        network.append_node(node("b"));
        network.append_link(Link::new("b", "p", "a", "p"));
        let result = partition_network(&network).unwrap();
        assert_eq!(result.sets, vec![set(&["a", "b"])]);
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let networks = layer(
            &["a", "b", "c", "d", "e", "f"],
            &[("a", "b"), ("b", "c"), ("d", "e")],
        );
        let result = network_sets(&networks, "layer3").unwrap();
        assert_eq!(result.node_count(), 6);

        let mut seen = BTreeSet::new();
        for s in &result.sets {
            for n in s {
                assert!(seen.insert(n.clone()), "node {} appears twice", n);
            }
        }
        assert_eq!(seen, set(&["a", "b", "c", "d", "e", "f"]));
        assert_eq!(result.set_index_of("f"), Some(2));
    }

    #[test]
    fn test_partition_is_stable() {
        let networks = layer(&["a", "b", "c", "d"], &[("a", "c"), ("b", "d")]);
        let first = network_sets(&networks, "layer3").unwrap();
        let second = network_sets(&networks, "layer3").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_layer_is_not_found() {
        let networks = layer(&["a"], &[]);
        let err = network_sets(&networks, "bgp_proc").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_link_to_unknown_node_is_data_error() {
        let mut network = Network::new("layer3");
        network.append_node(node("a"));
        network.append_link(Link::new("a", "p", "ghost", "p"));
        let err = partition_network(&network).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }

    #[test]
    fn test_all_layers() {
        let mut networks = layer(&["a", "b"], &[("a", "b")]);
        networks.push_network(Network::new("empty"));
        let all = all_network_sets(&networks).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].network, "empty");
        assert!(all[1].sets.is_empty());
    }
}
