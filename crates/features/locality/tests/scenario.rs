mod common;

use common::{init_all, probes, registries};
use strata_domain::{ErrorKind, Scope, ScopeSet, TeamId, UnitId};
use strata_locality::LocalityError;
use strata_transport::LocalFabric;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_hosts_two_units_each() {
    let fabric = LocalFabric::new(4);
    let registries = registries(&fabric, probes(&["A", "A", "B", "B"]), 4);
    let states = init_all(&registries).await;

    for state in &states {
        assert_eq!(state.team(), TeamId::ALL);
        assert_eq!(state.units().len(), 4);
        assert_eq!(state.topology().num_hosts(), 2);
    }

    let registry = &registries[2];
    let root = registry.domain(TeamId::ALL, ".").unwrap();
    assert_eq!(root.scope, Scope::Global);
    assert_eq!(root.num_children(), 2);
    assert_eq!(root.unit_ids, vec![UnitId(0), UnitId(1), UnitId(2), UnitId(3)]);

    let a = registry.domain(TeamId::ALL, ".0.").unwrap();
    assert_eq!(a.host, "A");
    assert_eq!(a.scope, Scope::Host);
    assert_eq!(a.num_children(), 2);
    assert_eq!(a.unit_ids, vec![UnitId(0), UnitId(1)]);

    let b = registry.domain(TeamId::ALL, ".1.").unwrap();
    assert_eq!(b.host, "B");
    assert_eq!(b.unit_ids, vec![UnitId(2), UnitId(3)]);

    let leaf = registry.domain(TeamId::ALL, ".0.1.").unwrap();
    assert!(leaf.is_leaf());
    assert_eq!(leaf.scope, Scope::Unit);
    assert_eq!(leaf.unit_ids, vec![UnitId(1)]);
    assert_eq!(leaf.parent().unwrap().tag, ".0.");

    let err = registry.domain(TeamId::ALL, ".2.").unwrap_err();
    assert!(matches!(err, LocalityError::IndexOutOfBounds { index: 2, children: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_unit_builds_the_same_tree() {
    let fabric = LocalFabric::new(5);
    let registries = registries(&fabric, probes(&["n1", "n0", "n1", "n0-mic0", "n0"]), 4);
    let states = init_all(&registries).await;

    let first = states[0].tree();
    for state in &states[1..] {
        assert_eq!(state.tree(), first);
    }
    assert_eq!(serde_json::to_value(first).unwrap(), serde_json::to_value(states[4].tree()).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tag_errors_by_depth() {
    let fabric = LocalFabric::new(4);
    let registries = registries(&fabric, probes(&["A", "A", "B", "B"]), 4);
    init_all(&registries).await;
    let registry = &registries[0];

    let err = registry.domain(TeamId::ALL, ".0.1.0.").unwrap_err();
    assert!(matches!(err, LocalityError::TagDepthExceeded { depth: 3, .. }));

    let err = registry.domain(TeamId::ALL, ".0.5.").unwrap_err();
    assert!(matches!(err, LocalityError::IndexOutOfBounds { index: 5, children: 2, .. }));

    for tag in [".x.", ".0..", "..1"] {
        let err = registry.domain(TeamId::ALL, tag).unwrap_err();
        assert!(matches!(err, LocalityError::MalformedTag { .. }), "{tag}");
    }

    assert_eq!(registry.domain(TeamId::ALL, "").unwrap().tag, ".");
    assert_eq!(registry.domain(TeamId::ALL, "1.0").unwrap().tag, ".1.0.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_node_resolves_by_its_own_tag() {
    let fabric = LocalFabric::new(6);
    let registries = registries(&fabric, probes(&["x", "y", "x", "y-mic0", "z", "y"]), 4);
    let states = init_all(&registries).await;

    for domain in states[0].tree().iter() {
        let resolved = registries[3].domain(TeamId::ALL, &domain.tag).unwrap();
        assert_eq!(resolved.id(), domain.id);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unit_queries() {
    let fabric = LocalFabric::new(4);
    let registries = registries(&fabric, probes(&["A", "A", "B", "B"]), 4);
    init_all(&registries).await;
    let registry = &registries[1];

    let unit = registry.unit(TeamId::ALL, UnitId(3)).unwrap();
    assert_eq!(unit.unit, UnitId(3));
    assert_eq!(unit.host, "B");
    assert_eq!(unit.hardware.core_id, 3);

    let err = registry.unit(TeamId::ALL, UnitId(4)).unwrap_err();
    assert!(matches!(err, LocalityError::UnknownUnit { unit: UnitId(4), .. }));

    let leaf = registry.unit_domain(TeamId::ALL, UnitId(2)).unwrap();
    assert_eq!(leaf.tag, ".1.0.");

    let hosts: Vec<String> =
        registry.scope_domains(TeamId::ALL, ScopeSet::HOST).unwrap().iter().map(|d| d.host.clone()).collect();
    assert_eq!(hosts, vec!["A".to_owned(), "B".to_owned()]);

    assert_eq!(registry.common_domain(TeamId::ALL, &[UnitId(0), UnitId(1)]).unwrap().tag, ".0.");
    assert_eq!(registry.common_domain(TeamId::ALL, &[UnitId(1), UnitId(2)]).unwrap().tag, ".");
    assert_eq!(registry.common_domain(TeamId::ALL, &[]).unwrap().tag, ".");
    assert!(registry.common_domain(TeamId::ALL, &[UnitId(9)]).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sub_team_renumbers_units() {
    let fabric = LocalFabric::new(4);
    fabric.register_team(TeamId(1), [3, 1]).unwrap();
    let registries = registries(&fabric, probes(&["A", "A", "B", "B"]), 4);
    init_all(&registries).await;

    let members = vec![registries[3].clone(), registries[1].clone()];
    let results = common::create_on(&members, TeamId(1)).await;
    for result in results {
        let state = result.unwrap();
        assert_eq!(state.units().len(), 2);
        assert_eq!(state.units().get(UnitId(0)).unwrap().host, "B");
        assert_eq!(state.units().get(UnitId(1)).unwrap().host, "A");
    }

    let root = registries[1].domain(TeamId(1), ".").unwrap();
    assert_eq!(root.num_children(), 2);
    assert_eq!(registries[1].domain(TeamId(1), ".0.").unwrap().host, "A");
    assert_eq!(registries[1].active_teams(), vec![TeamId::ALL, TeamId(1)]);
    assert_eq!(registries[0].active_teams(), vec![TeamId::ALL]);
    assert!(matches!(registries[0].domain(TeamId(1), ".").unwrap_err(), LocalityError::UnknownTeam { .. }));
}
