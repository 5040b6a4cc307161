use proptest::prelude::*;
use std::collections::BTreeSet;
use strata_domain::config::TopologyConfig;
use strata_domain::{HardwareFacts, UnitId, UnitLocality};
use strata_locality::{DomainPath, DomainTree, HostTopology, LocalityError, UnitMapping};

const HOSTS: [&str; 5] = ["a", "b", "a-mic0", "c", "a-mic1"];

fn mapping(units: &[(usize, u32, u32)]) -> UnitMapping {
    let units = units
        .iter()
        .enumerate()
        .map(|(i, &(host, numa_id, core_id))| UnitLocality {
            unit: UnitId(u32::try_from(i).unwrap()),
            host: HOSTS[host].to_owned(),
            hardware: HardwareFacts { numa_id, core_id, num_cores: 1, system_memory_mb: 64, ..HardwareFacts::default() },
        })
        .collect();
    UnitMapping::from_records(units).unwrap()
}

fn build(units: &UnitMapping, config: &TopologyConfig) -> DomainTree {
    let topology = HostTopology::build(units, config).unwrap();
    DomainTree::build(units, &topology, config).unwrap()
}

fn config(grouped: bool) -> TopologyConfig {
    let mut config = TopologyConfig::default();
    if grouped {
        config.groups.insert("rack".to_owned(), vec!["b".to_owned(), "c".to_owned()]);
    }
    config
}

fn units_strategy() -> impl Strategy<Value = Vec<(usize, u32, u32)>> {
    prop::collection::vec((0..HOSTS.len(), 0u32..2, 0u32..4), 0..24)
}

proptest! {
    #[test]
    fn every_domain_conserves_its_units(units in units_strategy(), grouped in any::<bool>()) {
        let mapping = mapping(&units);
        let tree = build(&mapping, &config(grouped));

        let all: Vec<UnitId> = (0..units.len()).map(|i| UnitId(u32::try_from(i).unwrap())).collect();
        let root: BTreeSet<UnitId> = tree.root().unit_ids.iter().copied().collect();
        prop_assert_eq!(tree.root().unit_ids.len(), units.len());
        prop_assert_eq!(root, all.iter().copied().collect::<BTreeSet<_>>());

        for domain in tree.iter() {
            if domain.is_leaf() {
                if domain.id != tree.root().id {
                    prop_assert_eq!(domain.unit_ids.len(), 1);
                }
                continue;
            }
            let from_children: Vec<UnitId> = domain
                .children
                .iter()
                .flat_map(|child| tree[*child].unit_ids.iter().copied())
                .collect();
            prop_assert_eq!(&domain.unit_ids, &from_children);
            prop_assert!(domain.children.iter().all(|child| !tree[*child].unit_ids.is_empty()));
        }

        for unit in all {
            let leaf = tree.unit_leaf(unit).unwrap();
            prop_assert_eq!(&leaf.unit_ids, &vec![unit]);
        }
    }

    #[test]
    fn every_tag_round_trips(units in units_strategy(), grouped in any::<bool>()) {
        let tree = build(&mapping(&units), &config(grouped));

        for domain in tree.iter() {
            let path: DomainPath = domain.tag.parse().unwrap();
            prop_assert_eq!(path.to_string(), domain.tag.clone());
            prop_assert_eq!(path.indices().len(), domain.level);
            prop_assert_eq!(tree.resolve(&path).unwrap().id, domain.id);
        }
    }

    #[test]
    fn out_of_range_indices_are_rejected_at_every_level(units in units_strategy()) {
        let tree = build(&mapping(&units), &TopologyConfig::default());

        for domain in tree.iter() {
            let path: DomainPath = domain.tag.parse().unwrap();
            let beyond = path.child(domain.num_children());
            let err = tree.resolve(&beyond).unwrap_err();
            if domain.level + 1 >= tree.depth() {
                let is_depth_exceeded = matches!(err, LocalityError::TagDepthExceeded { .. });
                prop_assert!(is_depth_exceeded);
            } else {
                let is_out_of_bounds = matches!(err, LocalityError::IndexOutOfBounds { .. });
                prop_assert!(is_out_of_bounds);
            }
        }
    }

    #[test]
    fn construction_is_deterministic(units in units_strategy(), grouped in any::<bool>()) {
        let mapping = mapping(&units);
        let first = build(&mapping, &config(grouped));
        let second = build(&mapping.clone(), &config(grouped));
        prop_assert_eq!(first, second);
    }
}
