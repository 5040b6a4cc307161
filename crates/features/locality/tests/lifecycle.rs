mod common;

use common::{create_on, init_all, probes, registries};
use std::sync::Arc;
use std::time::Duration;
use strata_domain::{ErrorKind, HardwareFacts, LocalHardware, TeamId, UnitId};
use strata_kernel::probe::{HardwareProbe, ProbeError, StaticProbe};
use strata_locality::{LocalityError, LocalityRegistry};
use strata_transport::{Collective, LocalFabric, TransportError};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_is_idempotent() {
    let fabric = LocalFabric::new(2);
    let registries = registries(&fabric, probes(&["A", "B"]), 4);
    init_all(&registries).await;

    assert!(registries[0].delete(TeamId::ALL));
    assert!(!registries[0].delete(TeamId::ALL));
    assert!(!registries[0].delete(TeamId(7)));
    assert!(!registries[0].is_active(TeamId::ALL));

    let err = registries[0].domain(TeamId::ALL, ".").unwrap_err();
    assert!(matches!(err, LocalityError::UnknownTeam { .. }));
    let err = registries[0].unit(TeamId::ALL, UnitId(0)).unwrap_err();
    assert!(matches!(err, LocalityError::UnknownTeam { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_on_active_team_is_rejected() {
    let fabric = LocalFabric::new(1);
    let registries = registries(&fabric, probes(&["solo"]), 4);
    init_all(&registries).await;

    let err = registries[0].create(TeamId::ALL).await.unwrap_err();
    assert!(matches!(err, LocalityError::AlreadyActive { .. }));
    assert_eq!(err.kind(), ErrorKind::Lifecycle);
    assert!(registries[0].is_active(TeamId::ALL));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn recreate_reflects_current_hardware() {
    let fabric = LocalFabric::new(2);
    let first = registries(&fabric, probes(&["A", "A"]), 4);
    init_all(&first).await;
    assert_eq!(first[0].team(TeamId::ALL).unwrap().topology().num_hosts(), 1);

    for registry in &first {
        assert!(registry.delete(TeamId::ALL));
    }

    // Same fabric, new hardware report: a moved unit shows up after re-creation.
    let second: Vec<_> = fabric
        .endpoints()
        .into_iter()
        .zip(probes(&["A", "B"]))
        .map(|(endpoint, probe)| Arc::new(LocalityRegistry::builder().collective(endpoint).probe(probe).build()))
        .collect();
    init_all(&second).await;
    assert_eq!(second[1].team(TeamId::ALL).unwrap().topology().num_hosts(), 2);
    assert_eq!(second[1].domain(TeamId::ALL, ".1.").unwrap().host, "B");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_then_create_same_registry() {
    let fabric = LocalFabric::new(2);
    let registries = registries(&fabric, probes(&["A", "B"]), 4);
    let before = init_all(&registries).await;

    for registry in &registries {
        registry.delete(TeamId::ALL);
    }
    let after = init_all(&registries).await;

    assert_eq!(before[0].tree(), after[0].tree());
    assert!(!Arc::ptr_eq(&before[0], &after[0]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn handles_outlive_delete() {
    let fabric = LocalFabric::new(2);
    let registries = registries(&fabric, probes(&["A", "B"]), 4);
    init_all(&registries).await;

    let domain = registries[0].domain(TeamId::ALL, ".1.").unwrap();
    let unit = registries[0].unit(TeamId::ALL, UnitId(0)).unwrap();
    assert!(registries[0].delete(TeamId::ALL));

    assert_eq!(domain.host, "B");
    assert_eq!(unit.host, "A");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn team_limit_is_enforced() {
    let fabric = LocalFabric::new(1);
    fabric.register_team(TeamId(1), [0]).unwrap();
    fabric.register_team(TeamId(2), [0]).unwrap();
    let registries = registries(&fabric, probes(&["solo"]), 2);

    init_all(&registries).await;
    create_on(&registries, TeamId(1)).await.pop().unwrap().unwrap();

    let err = registries[0].create(TeamId(2)).await.unwrap_err();
    assert!(matches!(err, LocalityError::TeamLimit { limit: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert!(!registries[0].is_active(TeamId(2)));

    registries[0].delete(TeamId(1));
    registries[0].create(TeamId(2)).await.unwrap();
    assert_eq!(registries[0].active_teams(), vec![TeamId::ALL, TeamId(2)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn member_at_team_limit_fails_the_whole_team() {
    let fabric = LocalFabric::new(2);
    fabric.register_team(TeamId(1), [0]).unwrap();
    fabric.register_team(TeamId(2), [0, 1]).unwrap();
    let registries = registries(&fabric, probes(&["A", "B"]), 2);
    init_all(&registries).await;
    create_on(&registries[..1], TeamId(1)).await.pop().unwrap().unwrap();

    // Unit 0 holds two teams, unit 1 only one.
    let results = tokio::time::timeout(Duration::from_secs(5), create_on(&registries, TeamId(2)))
        .await
        .expect("every member returns");

    let limited = results[0].as_ref().unwrap_err();
    assert!(matches!(limited, LocalityError::TeamLimit { limit: 2, .. }));
    let peer = results[1].as_ref().unwrap_err();
    assert!(matches!(peer, LocalityError::PeerFailed { unit: UnitId(0), .. }));
    assert!(registries.iter().all(|registry| !registry.is_active(TeamId(2))));
    assert_eq!(registries[0].active_teams(), vec![TeamId::ALL, TeamId(1)]);

    registries[0].delete(TeamId(1));
    for result in create_on(&registries, TeamId(2)).await {
        result.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn member_already_active_fails_the_whole_team() {
    let fabric = LocalFabric::new(2);
    let registries = registries(&fabric, probes(&["A", "B"]), 4);
    init_all(&registries).await;
    assert!(registries[1].delete(TeamId::ALL));

    let results = tokio::time::timeout(Duration::from_secs(5), create_on(&registries, TeamId::ALL))
        .await
        .expect("every member returns");

    let active = results[0].as_ref().unwrap_err();
    assert_eq!(active.kind(), ErrorKind::Lifecycle);
    let peer = results[1].as_ref().unwrap_err();
    assert!(matches!(peer, LocalityError::PeerFailed { unit: UnitId(0), .. }));

    assert!(registries[0].is_active(TeamId::ALL));
    assert!(!registries[1].is_active(TeamId::ALL));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn finalize_deletes_everything() {
    let fabric = LocalFabric::new(3);
    fabric.register_team(TeamId(4), [0, 2]).unwrap();
    let registries = registries(&fabric, probes(&["A", "A", "B"]), 4);
    init_all(&registries).await;
    let members = vec![registries[0].clone(), registries[2].clone()];
    for result in create_on(&members, TeamId(4)).await {
        result.unwrap();
    }

    let handles: Vec<_> = registries
        .iter()
        .cloned()
        .map(|registry| tokio::spawn(async move { registry.finalize().await }))
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for registry in &registries {
        assert!(registry.active_teams().is_empty());
    }
}

#[tokio::test]
async fn unknown_transport_team_fails_without_publishing() {
    let fabric = LocalFabric::new(1);
    let registries = registries(&fabric, probes(&["solo"]), 4);

    let err = registries[0].create(TeamId(9)).await.unwrap_err();
    assert!(matches!(err, LocalityError::Transport { .. }));
    assert!(!registries[0].is_active(TeamId(9)));
    assert!(registries[0].active_teams().is_empty());
}

struct BrokenLink;

impl Collective for BrokenLink {
    fn team_size(&self, _team: TeamId) -> Result<usize, TransportError> {
        Ok(1)
    }

    fn my_unit(&self, _team: TeamId) -> Result<UnitId, TransportError> {
        Ok(UnitId(0))
    }

    async fn all_gather(&self, _team: TeamId, _record: &[u8]) -> Result<Vec<u8>, TransportError> {
        Err("link down".into())
    }

    async fn barrier(&self, _team: TeamId) -> Result<(), TransportError> {
        Err("link down".into())
    }
}

#[tokio::test]
async fn transport_failure_surfaces_as_is() {
    let registry = LocalityRegistry::builder()
        .collective(BrokenLink)
        .probe(StaticProbe::new("solo", HardwareFacts::default()))
        .build();

    let err = registry.init().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("link down"));
    assert!(registry.active_teams().is_empty());

    // The slot was released, so a retry fails the same way instead of "already active".
    let err = registry.init().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    assert_eq!(registry.finalize().await.unwrap_err().kind(), ErrorKind::Transport);
}

struct FailingProbe;

impl HardwareProbe for FailingProbe {
    fn local_hardware(&self) -> Result<LocalHardware, ProbeError> {
        Err("sensor offline".into())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn local_probe_failure_reaches_every_unit() {
    let fabric = LocalFabric::new(2);
    let probes: Vec<Arc<dyn HardwareProbe>> =
        vec![Arc::new(FailingProbe), Arc::new(StaticProbe::new("B", HardwareFacts::default()))];
    let registries = registries(&fabric, probes, 4);

    let results = create_on(&registries, TeamId::ALL).await;

    let failed = results[0].as_ref().unwrap_err();
    assert!(matches!(failed, LocalityError::Probe { .. }));
    let peer = results[1].as_ref().unwrap_err();
    assert!(matches!(peer, LocalityError::PeerFailed { unit: UnitId(0), .. }));
    assert_eq!(peer.kind(), ErrorKind::Transport);

    assert!(registries.iter().all(|registry| registry.active_teams().is_empty()));
}
