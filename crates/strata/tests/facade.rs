use std::sync::Arc;
use strata::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn default_simulation_builds_numa_domains() {
    let config = StrataConfig::default();
    let probes = StaticProbe::simulated(&config.simulation);
    let fabric = LocalFabric::new(probes.len());

    let registries: Vec<_> = fabric
        .endpoints()
        .into_iter()
        .zip(probes)
        .map(|(endpoint, probe)| Arc::new(strata::registry(endpoint, probe, &config)))
        .collect();

    let handles: Vec<_> = registries
        .iter()
        .cloned()
        .map(|registry| tokio::spawn(async move { registry.init().await.map(|_| ()) }))
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let registry = &registries[5];
    assert_eq!(registry.max_teams(), 32);

    let node_b = registry.domain(TeamId::ALL, ".1.").unwrap();
    assert_eq!(node_b.host, "node-b");
    assert_eq!(node_b.scope, Scope::Host);
    assert_eq!(node_b.hardware.num_numa, 2);

    let numa = registry.domain(TeamId::ALL, ".0.1.").unwrap();
    assert_eq!(numa.scope, Scope::Numa);
    assert_eq!(numa.unit_ids, vec![UnitId(2), UnitId(3)]);
    assert_eq!(registry.domain(TeamId::ALL, ".0.1.0.").unwrap().unit_ids, vec![UnitId(2)]);

    let numa_domains = registry.scope_domains(TeamId::ALL, ScopeSet::NUMA).unwrap();
    assert_eq!(numa_domains.len(), 4);
    assert!(strata::features::is_enabled("locality"));
}
