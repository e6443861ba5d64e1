#[cfg(test)]
mod candidate_regression_tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use topoconductor::candidate::{
        CandidateCondition, CandidateOptions, CandidateTopologyGenerator, CandidateTopologyInfo, FlowRow,
    };
    use topoconductor::store::{MemoryStore, TopologyStore};
    use topoconductor::topology::{Networks, BGP_PROC};
    use topoconductor::ErrorKind;

    const NETWORK: &str = "mddo-bgp";
    const SNAPSHOT: &str = "original_asis";
    const PREFIXES: [&str; 3] = ["10.100.0.0/16", "10.110.0.0/20", "10.120.0.0/17"];

    fn topology() -> Value {
        let prefixes: Vec<Value> = PREFIXES.iter().map(|p| json!({"prefix": p})).collect();
        json!({
            "ietf-network:networks": {"network": [
                {
                    "network-id": "bgp_proc",
                    "node": [{
                        "node-id": "192.168.255.5",
                        "supporting-node": [{"network-ref": "layer3", "node-ref": "edge-tk01"}],
                        "mddo-topology:bgp-proc-node-attributes": {
                            "router-id": "192.168.255.5",
                            "prefix-set": [
                                {"name": "default-ipv4", "prefixes": [{"prefix": "0.0.0.0/0"}]},
                                {"name": "as65550-advd-ipv4", "prefixes": prefixes}
                            ],
                            "flag": []
                        }
                    }]
                },
                {
                    "network-id": "layer3",
                    "node": [{"node-id": "edge-tk01"}]
                }
            ]}
        })
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.store_topology(NETWORK, SNAPSHOT, topology()).unwrap();
        store
            .insert_usecase_source(
                "pni_te",
                NETWORK,
                "params",
                json!({
                    "source_as": {"asn": 65550},
                    "expected_traffic": {"original_targets": [
                        {"node": "edge-tk01", "interface": "ge-0/0/3.0", "expected_max_bandwidth": 1.5e8}
                    ]}
                }),
            )
            .unwrap();
        store
    }

    fn options(count: usize, interface: &str, flow_data: Option<Vec<FlowRow>>) -> CandidateOptions {
        CandidateOptions {
            phase_number: 2,
            candidate_number: count,
            node: "edge-tk01".to_string(),
            interface: interface.to_string(),
            flow_data,
        }
    }

    fn flows() -> Vec<FlowRow> {
        serde_json::from_value(json!([
            {"source": "192.168.0.0/24", "dest": "10.100.1.0/24", "rate": 100},
            {"source": "192.168.0.0/24", "dest": "10.110.0.5", "rate": 60},
            {"source": "192.168.0.0/24", "dest": "10.120.2.0/24", "rate": 50}
        ]))
        .unwrap()
    }

    fn advertised(info: &CandidateTopologyInfo) -> Vec<String> {
        let networks = Networks::load(info.topology.as_ref().unwrap()).unwrap();
        let node = networks
            .network(BGP_PROC)
            .unwrap()
            .find_node("192.168.255.5")
            .unwrap();
        node.attribute
            .as_bgp_proc()
            .unwrap()
            .prefix_set
            .iter()
            .find(|ps| ps.name == "as65550-advd-ipv4")
            .unwrap()
            .prefix_strings()
    }

    #[test]
    fn test_simple_select_omits_a_distinct_prefix_each() {
        let store = store();
        let generator = CandidateTopologyGenerator::new(&store, NETWORK, SNAPSHOT, "pni_te").unwrap();
        let infos = generator.generate(&options(3, "ge-0/0/3.0", None)).unwrap();
        assert_eq!(infos.len(), 3);

        let mut omitted = BTreeSet::new();
        for (i, info) in infos.iter().enumerate() {
            assert!(info.is_ok());
            assert_eq!(info.candidate_index, i + 1);
            assert_eq!(info.snapshot, format!("original_asis_candidate_2_{}", i + 1));
            let remaining = advertised(info);
            assert_eq!(remaining.len(), 2);
            let missing: Vec<&str> = PREFIXES
                .iter()
                .copied()
                .filter(|p| !remaining.iter().any(|r| r == p))
                .collect();
            assert_eq!(missing, vec![PREFIXES[i]]);
            match &info.candidate_condition {
                CandidateCondition::Omit { omit_index, omit_policy } => {
                    assert_eq!(*omit_index, i + 1);
                    assert_eq!(omit_policy.as_ref().unwrap().prefix, PREFIXES[i]);
                }
                other => panic!("unexpected condition {:?}", other),
            }
            omitted.insert(missing[0]);
        }
        assert_eq!(omitted.len(), 3);

        // the base snapshot is untouched
        assert_eq!(store.fetch_topology(NETWORK, SNAPSHOT).unwrap(), topology());
    }

    #[test]
    fn test_simple_select_reports_out_of_range_candidate() {
        let store = store();
        let generator = CandidateTopologyGenerator::new(&store, NETWORK, SNAPSHOT, "pni_te").unwrap();
        let infos = generator.generate(&options(4, "ge-0/0/3.0", None)).unwrap();
        assert_eq!(infos.len(), 4);
        assert!(infos[..3].iter().all(CandidateTopologyInfo::is_ok));

        let failed = &infos[3];
        assert!(failed.topology.is_none());
        assert_eq!(failed.error.as_ref().unwrap().kind, ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn test_flow_matching_ranks_by_target_bandwidth() {
        let store = store();
        let generator = CandidateTopologyGenerator::new(&store, NETWORK, SNAPSHOT, "pni_te").unwrap();
        let infos = generator
            .generate(&options(2, "ge-0/0/3.0", Some(flows())))
            .unwrap();
        assert_eq!(infos.len(), 2);

        let conditions: Vec<(Vec<String>, f64, f64)> = infos
            .iter()
            .map(|info| match &info.candidate_condition {
                CandidateCondition::Flow(flow) => (flow.prefixes.clone(), flow.rate, flow.diff),
                other => panic!("unexpected condition {:?}", other),
            })
            .collect();
        assert_eq!(
            conditions,
            vec![
                (vec![PREFIXES[0].to_string(), PREFIXES[2].to_string()], 150.0, 0.0),
                (vec![PREFIXES[0].to_string(), PREFIXES[1].to_string()], 160.0, 10.0),
            ]
        );
        assert_eq!(advertised(&infos[0]), vec![PREFIXES[0], PREFIXES[2]]);
    }

    #[test]
    fn test_flow_matching_reduces_candidate_count() {
        let store = store();
        let generator = CandidateTopologyGenerator::new(&store, NETWORK, SNAPSHOT, "pni_te").unwrap();
        let infos = generator
            .generate(&options(10, "ge-0/0/3.0", Some(flows())))
            .unwrap();
        assert_eq!(infos.len(), 7);
    }

    #[test]
    fn test_unknown_interface_uses_default_bandwidth() {
        let store = store();
        let generator = CandidateTopologyGenerator::new(&store, NETWORK, SNAPSHOT, "pni_te").unwrap();
        let infos = generator
            .generate(&options(1, "ge-0/0/9.0", Some(flows())))
            .unwrap();
        match &infos[0].candidate_condition {
            CandidateCondition::Flow(flow) => {
                assert_eq!(flow.prefixes.len(), 3);
                assert_eq!(flow.rate, 210.0);
                assert_eq!(flow.diff, -590.0);
            }
            other => panic!("unexpected condition {:?}", other),
        }
    }

    #[test]
    fn test_store_candidates_writes_snapshots() {
        let store = store();
        let generator = CandidateTopologyGenerator::new(&store, NETWORK, SNAPSHOT, "pni_te").unwrap();
        let infos = generator.generate(&options(2, "ge-0/0/3.0", None)).unwrap();
        let stored = generator.store_candidates(infos).unwrap();

        assert!(stored.iter().all(|info| info.topology.is_none()));
        assert_eq!(
            store.snapshots(NETWORK).unwrap(),
            vec![
                "original_asis",
                "original_asis_candidate_2_1",
                "original_asis_candidate_2_2"
            ]
        );
        let candidate = store.load_networks(NETWORK, "original_asis_candidate_2_1").unwrap();
        assert!(candidate.network(BGP_PROC).is_ok());
    }

    #[test]
    fn test_missing_params_is_not_found() {
        let store = store();
        let err = CandidateTopologyGenerator::new(&store, NETWORK, SNAPSHOT, "multi_region_te")
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_missing_prefix_set_fails_the_batch() {
        let store = store();
        store
            .insert_usecase_source("pni_te", NETWORK, "params", json!({"source_as": {"asn": 65000}}))
            .unwrap();
        let generator = CandidateTopologyGenerator::new(&store, NETWORK, SNAPSHOT, "pni_te").unwrap();
        let err = generator.generate(&options(1, "ge-0/0/3.0", None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
