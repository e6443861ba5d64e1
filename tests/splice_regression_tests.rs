#[cfg(test)]
mod splice_regression_tests {
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use topoconductor::bgp::detect_preferred_peer;
    use topoconductor::splice::TopologySplicer;
    use topoconductor::store::{MemoryStore, TopologyStore};
    use topoconductor::topology::{Networks, BGP_AS, BGP_PROC, LAYER3};
    use topoconductor::ErrorKind;

    const SEGMENT: &str = "Seg_172.16.0.4/30";

    fn internal() -> Value {
        json!({
            "ietf-network:networks": {"network": [
                {
                    "network-id": "bgp_proc",
                    "network-types": {"mddo-topology:bgp-proc-network": {}},
                    "node": [{
                        "node-id": "192.168.255.5",
                        "supporting-node": [{"network-ref": "layer3", "node-ref": "edge-tk01"}],
                        "mddo-topology:bgp-proc-node-attributes": {
                            "router-id": "192.168.255.5",
                            "confederation-id": 65550,
                            "flag": []
                        },
                        "ietf-network-topology:termination-point": [{
                            "tp-id": "peer_172.16.0.6",
                            "supporting-termination-point": [
                                {"network-ref": "layer3", "node-ref": "edge-tk01", "tp-ref": "ge-0/0/3.0"}
                            ],
                            "mddo-topology:bgp-proc-termination-point-attributes": {
                                "local-as": 65550, "remote-as": 65520, "flag": []
                            }
                        }]
                    }]
                },
                {
                    "network-id": "layer3",
                    "network-types": {"mddo-topology:l3-network": {}},
                    "node": [{
                        "node-id": "edge-tk01",
                        "ietf-network-topology:termination-point": [{
                            "tp-id": "ge-0/0/3.0",
                            "mddo-topology:l3-termination-point-attributes": {
                                "ip-address": ["172.16.0.5/30"], "flag": []
                            }
                        }]
                    }]
                }
            ]}
        })
    }

    fn external() -> Value {
        json!({
            "ietf-network:networks": {"network": [
                {
                    "network-id": "bgp_as",
                    "network-types": {"mddo-topology:bgp-as-network": {}},
                    "node": [
                        {
                            "node-id": "as65550",
                            "ietf-network-topology:termination-point": [{
                                "tp-id": "peer_172.16.0.6",
                                "supporting-termination-point": [
                                    {"network-ref": "bgp_proc", "node-ref": "192.168.255.5", "tp-ref": "peer_172.16.0.6"}
                                ]
                            }]
                        },
                        {
                            "node-id": "as65520",
                            "supporting-node": [{"network-ref": "bgp_proc", "node-ref": "172.16.0.6"}],
                            "ietf-network-topology:termination-point": [{
                                "tp-id": "peer_172.16.0.5",
                                "supporting-termination-point": [
                                    {"network-ref": "bgp_proc", "node-ref": "172.16.0.6", "tp-ref": "peer_172.16.0.5"}
                                ]
                            }]
                        }
                    ],
                    "ietf-network-topology:link": [
                        {
                            "link-id": "as65550,peer_172.16.0.6,as65520,peer_172.16.0.5",
                            "source": {"source-node": "as65550", "source-tp": "peer_172.16.0.6"},
                            "destination": {"dest-node": "as65520", "dest-tp": "peer_172.16.0.5"}
                        },
                        {
                            "link-id": "as65520,peer_172.16.0.5,as65550,peer_172.16.0.6",
                            "source": {"source-node": "as65520", "source-tp": "peer_172.16.0.5"},
                            "destination": {"dest-node": "as65550", "dest-tp": "peer_172.16.0.6"}
                        }
                    ]
                },
                {
                    "network-id": "bgp_proc",
                    "network-types": {"mddo-topology:bgp-proc-network": {}},
                    "node": [{
                        "node-id": "172.16.0.6",
                        "supporting-node": [{"network-ref": "layer3", "node-ref": "PNI01"}],
                        "mddo-topology:bgp-proc-node-attributes": {
                            "router-id": "172.16.0.6",
                            "flag": ["ext-bgp-speaker"]
                        },
                        "ietf-network-topology:termination-point": [{
                            "tp-id": "peer_172.16.0.5",
                            "supporting-termination-point": [
                                {"network-ref": "layer3", "node-ref": "PNI01", "tp-ref": "Ethernet1"}
                            ],
                            "mddo-topology:bgp-proc-termination-point-attributes": {
                                "local-as": 65520, "remote-as": 65550, "flag": []
                            }
                        }]
                    }]
                },
                {
                    "network-id": "layer3",
                    "network-types": {"mddo-topology:l3-network": {}},
                    "node": [{
                        "node-id": "PNI01",
                        "ietf-network-topology:termination-point": [{
                            "tp-id": "Ethernet1",
                            "mddo-topology:l3-termination-point-attributes": {
                                "ip-address": ["172.16.0.6/30"], "flag": []
                            }
                        }]
                    }]
                }
            ]}
        })
    }

    fn counts(networks: &Networks) -> Vec<(String, usize, usize)> {
        networks
            .networks()
            .iter()
            .map(|nw| (nw.name().to_string(), nw.nodes().len(), nw.links().len()))
            .collect()
    }

    #[test]
    fn test_splice_builds_a_consistent_topology() {
        let mut splicer = TopologySplicer::from_data(&internal(), &external()).unwrap();
        let summary = splicer.splice().unwrap();

        assert_eq!(summary.inserted_layers, vec![BGP_AS]);
        assert_eq!(summary.conflict, None);
        assert_eq!(summary.bound_supports, 1);
        assert_eq!(summary.bgp_proc_links, 2);
        assert_eq!(summary.layer3_links, 4);
        assert_eq!(summary.segment_nodes, vec![SEGMENT]);

        let merged = splicer.networks();
        assert!(merged.verify().is_ok());

        let bgp_as = merged.network(BGP_AS).unwrap();
        assert!(bgp_as
            .find_node("as65550")
            .unwrap()
            .is_supported_by(BGP_PROC, "192.168.255.5"));

        let bgp_proc = merged.network(BGP_PROC).unwrap();
        assert!(bgp_proc
            .find_link("192.168.255.5", "peer_172.16.0.6", "172.16.0.6", "peer_172.16.0.5")
            .is_some());
        assert!(bgp_proc
            .find_link("172.16.0.6", "peer_172.16.0.5", "192.168.255.5", "peer_172.16.0.6")
            .is_some());

        let layer3 = merged.network(LAYER3).unwrap();
        let segment = layer3.find_node(SEGMENT).unwrap();
        let attr = segment.attribute.as_l3().unwrap();
        assert_eq!(attr.node_type.as_deref(), Some("segment"));
        assert_eq!(attr.prefix[0].prefix, "172.16.0.4/30");
        assert_eq!(attr.prefix[0].metric, Some(0));
        let tps: Vec<&str> = segment.term_points().iter().map(|tp| tp.name()).collect();
        assert_eq!(tps, vec!["edge-tk01_ge-0/0/3.0", "PNI01_Ethernet1"]);
        assert!(layer3
            .find_link("edge-tk01", "ge-0/0/3.0", SEGMENT, "edge-tk01_ge-0/0/3.0")
            .is_some());
        assert!(layer3
            .find_link(SEGMENT, "PNI01_Ethernet1", "PNI01", "Ethernet1")
            .is_some());
    }

    #[test]
    fn test_second_splice_changes_nothing() {
        let mut splicer = TopologySplicer::from_data(&internal(), &external()).unwrap();
        splicer.splice().unwrap();
        let once = counts(splicer.networks());

        let summary = splicer.splice().unwrap();
        assert_eq!(summary.conflict.as_deref(), Some(BGP_AS));
        assert!(summary.inserted_layers.is_empty());
        assert_eq!(summary.bgp_proc_links, 0);
        assert_eq!(counts(splicer.networks()), once);

        // a stored, spliced snapshot is detected the same way
        let spliced = splicer.to_data().unwrap();
        let mut again = TopologySplicer::from_data(&spliced, &external()).unwrap();
        assert!(again.splice().unwrap().conflict.is_some());
        assert_eq!(counts(again.networks()), once);
    }

    #[test]
    fn test_dangling_external_support_fails() {
        let mut broken = external();
        broken["ietf-network:networks"]["network"][0]["node"][1]["ietf-network-topology:termination-point"][0]
            ["supporting-termination-point"][0]["tp-ref"] = json!("peer_10.0.0.1");
        let mut splicer = TopologySplicer::from_data(&internal(), &broken).unwrap();
        let before = splicer.networks().clone();

        let err = splicer.splice().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(err.to_string().contains("peer_10.0.0.1"));
        assert_eq!(splicer.networks(), &before);
    }

    #[test]
    fn test_segment_needs_an_address() {
        let mut no_ip = external();
        no_ip["ietf-network:networks"]["network"][2]["node"][0]["ietf-network-topology:termination-point"][0]
            ["mddo-topology:l3-termination-point-attributes"]["ip-address"] = json!([]);
        let mut internal = internal();
        internal["ietf-network:networks"]["network"][1]["node"][0]["ietf-network-topology:termination-point"][0]
            ["mddo-topology:l3-termination-point-attributes"]["ip-address"] = json!([]);

        let err = TopologySplicer::from_data(&internal, &no_ip)
            .unwrap()
            .splice()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn test_one_sided_address_is_enough() {
        let mut ext = external();
        ext["ietf-network:networks"]["network"][2]["node"][0]["ietf-network-topology:termination-point"][0]
            ["mddo-topology:l3-termination-point-attributes"]["ip-address"] = json!([]);
        let summary = TopologySplicer::from_data(&internal(), &ext)
            .unwrap()
            .splice()
            .unwrap();
        assert_eq!(summary.segment_nodes, vec![SEGMENT]);
    }

    #[test]
    fn test_bare_address_is_a_host_segment() {
        let mut ext = external();
        ext["ietf-network:networks"]["network"][2]["node"][0]["ietf-network-topology:termination-point"][0]
            ["mddo-topology:l3-termination-point-attributes"]["ip-address"] = json!([]);
        let mut int = internal();
        int["ietf-network:networks"]["network"][1]["node"][0]["ietf-network-topology:termination-point"][0]
            ["mddo-topology:l3-termination-point-attributes"]["ip-address"] = json!(["172.16.0.5"]);

        let mut splicer = TopologySplicer::from_data(&int, &ext).unwrap();
        let summary = splicer.splice().unwrap();
        assert_eq!(summary.segment_nodes, vec!["Seg_172.16.0.5/32"]);
        assert!(splicer.networks().verify().is_ok());
    }

    #[test]
    fn test_preferred_peer_on_spliced_topology() {
        let store = MemoryStore::new();
        let mut splicer = TopologySplicer::from_data(&internal(), &external()).unwrap();
        splicer.splice().unwrap();
        store
            .save_networks("mddo-bgp", "original_asis", splicer.networks())
            .unwrap();

        let mut networks = store.load_networks("mddo-bgp", "original_asis").unwrap();
        let peer = detect_preferred_peer(&mut networks, BGP_PROC, 65520, "edge-tk01", "ge-0/0/3.0").unwrap();
        assert_eq!(peer.node, "172.16.0.6");
        assert_eq!(peer.tp, "peer_172.16.0.5");

        let tp = networks
            .network(BGP_PROC)
            .unwrap()
            .find_term_point("172.16.0.6", "peer_172.16.0.5")
            .unwrap();
        assert!(tp.attribute.as_bgp_proc().unwrap().is_preferred());

        let err = detect_preferred_peer(&mut networks, BGP_PROC, 65000, "edge-tk01", "ge-0/0/3.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
