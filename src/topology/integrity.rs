//! Referential integrity checks over an assembled snapshot.
//!
//! Name uniqueness is enforced while loading. This module checks the
//! cross-collection invariants: support references resolve, link endpoints
//! resolve inside their own layer, and BGP layers keep the single-support
//! shape the merger and the preferred-peer detector rely on.

use super::types::{Network, Networks};
use super::{BGP_AS, BGP_PROC};
use crate::error::{Result, TopologyError};

/// One broken invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    DanglingNodeSupport { at: String, target: String },
    DanglingTermPointSupport { at: String, target: String },
    DanglingLinkEndpoint { network: String, link: String, endpoint: String },
    MultipleSupports { at: String, count: usize },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingNodeSupport { at, target } => {
                write!(f, "node {} refers to unknown supporting node {}", at, target)
            }
            Self::DanglingTermPointSupport { at, target } => {
                write!(f, "term-point {} refers to unknown supporting term-point {}", at, target)
            }
            Self::DanglingLinkEndpoint { network, link, endpoint } => {
                write!(f, "link {} in {} has unknown endpoint {}", link, network, endpoint)
            }
            Self::MultipleSupports { at, count } => {
                write!(f, "{} has {} supports, expected exactly one", at, count)
            }
        }
    }
}

/// Collect every integrity violation in the snapshot
pub fn find_violations(networks: &Networks) -> Vec<Violation> {
    let mut violations = Vec::new();
    for network in networks.networks() {
        check_supports(networks, network, &mut violations);
        check_links(network, &mut violations);
        if network.name() == BGP_PROC || network.name() == BGP_AS {
            check_single_support(network, &mut violations);
        }
    }
    violations
}

/// Fail with an `Integrity` error listing all violations, if any
pub fn verify(networks: &Networks) -> Result<()> {
    let violations = find_violations(networks);
    if violations.is_empty() {
        return Ok(());
    }
    for violation in &violations {
        log::debug!("Integrity violation: {}", violation);
    }
    let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
    Err(TopologyError::integrity(listed.join("; ")))
}

fn check_supports(networks: &Networks, network: &Network, violations: &mut Vec<Violation>) {
    for node in network.nodes() {
        for support in &node.supports {
            let resolved = networks
                .find_network(&support.network_ref)
                .and_then(|nw| nw.find_node(&support.node_ref));
            if resolved.is_none() {
                violations.push(Violation::DanglingNodeSupport {
                    at: format!("{}/{}", network.name(), node.name()),
                    target: format!("{}/{}", support.network_ref, support.node_ref),
                });
            }
        }

        for tp in node.term_points() {
            for support in &tp.supports {
                if networks.find_term_point(&support.into()).is_none() {
                    violations.push(Violation::DanglingTermPointSupport {
                        at: format!("{}/{}[{}]", network.name(), node.name(), tp.name()),
                        target: support.to_string(),
                    });
                }
            }
        }
    }
}

fn check_links(network: &Network, violations: &mut Vec<Violation>) {
    for link in network.links() {
        let endpoints = [
            (&link.source.node, &link.source.tp),
            (&link.destination.node, &link.destination.tp),
        ];
        for (node, tp) in endpoints {
            if network.find_term_point(node, tp).is_none() {
                violations.push(Violation::DanglingLinkEndpoint {
                    network: network.name().to_string(),
                    link: link.key(),
                    endpoint: format!("{}[{}]", node, tp),
                });
            }
        }
    }
}

// BGP term-points are bound to exactly one lower-layer term-point, and a
// bgp_proc node to at most one layer3 node.
fn check_single_support(network: &Network, violations: &mut Vec<Violation>) {
    for node in network.nodes() {
        if network.name() == BGP_PROC && node.supports.len() > 1 {
            violations.push(Violation::MultipleSupports {
                at: format!("{}/{}", network.name(), node.name()),
                count: node.supports.len(),
            });
        }
        for tp in node.term_points() {
            if tp.supports.len() > 1 {
                violations.push(Violation::MultipleSupports {
                    at: format!("{}/{}[{}]", network.name(), node.name(), tp.name()),
                    count: tp.supports.len(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{Link, Network, Node, SupportingTermPoint, TermPoint};

    fn two_layers() -> Networks {
        let mut layer3 = Network::new("layer3");
        let mut r1 = Node::new("r1");
        r1.append_term_point(TermPoint::new("eth0"));
        layer3.append_node(r1);

        let mut bgp_proc = Network::new(BGP_PROC);
        let mut p1 = Node::new("1.1.1.1");
        p1.append_support_by_node("layer3", "r1");
        let mut peer = TermPoint::new("peer_10.0.0.2");
        peer.supports.push(SupportingTermPoint::new("layer3", "r1", "eth0"));
        p1.append_term_point(peer);
        bgp_proc.append_node(p1);

        let mut networks = Networks::new();
        networks.push_network(bgp_proc);
        networks.push_network(layer3);
        networks
    }

    #[test]
    fn test_clean_snapshot_verifies() {
        assert!(verify(&two_layers()).is_ok());
    }

    #[test]
    fn test_dangling_references_are_all_reported() {
        let mut networks = two_layers();
        let bgp_proc = networks.find_network_mut(BGP_PROC).unwrap();
        let node = bgp_proc.find_node_mut("1.1.1.1").unwrap();
        node.append_support_by_node("layer3", "ghost");
        bgp_proc.append_link(Link::new("1.1.1.1", "peer_10.0.0.2", "9.9.9.9", "peer_x"));

        let violations = find_violations(&networks);
        assert_eq!(violations.len(), 3);
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::DanglingNodeSupport { target, .. } if target == "layer3/ghost")));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::DanglingLinkEndpoint { endpoint, .. } if endpoint == "9.9.9.9[peer_x]")));

        let err = verify(&networks).unwrap_err();
        assert!(err.to_string().contains("layer3/ghost"));
    }
}
