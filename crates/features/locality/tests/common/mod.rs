#![allow(dead_code)]

use std::sync::Arc;
use strata_domain::{HardwareFacts, TeamId};
use strata_kernel::probe::{HardwareProbe, StaticProbe};
use strata_locality::{LocalityError, LocalityRegistry, TeamLocality};
use strata_transport::{FabricEndpoint, LocalFabric};

pub type Registry<P = StaticProbe> = Arc<LocalityRegistry<FabricEndpoint, P>>;

/// One probe per unit; unit `i` runs on `hosts[i]` with its own core.
pub fn probes(hosts: &[&str]) -> Vec<StaticProbe> {
    hosts
        .iter()
        .enumerate()
        .map(|(i, host)| {
            let facts = HardwareFacts {
                core_id: u32::try_from(i).unwrap(),
                num_numa: 1,
                num_cores: 1,
                min_threads: 1,
                max_threads: 2,
                system_memory_mb: 1024,
                ..HardwareFacts::default()
            };
            StaticProbe::new(*host, facts)
        })
        .collect()
}

/// One registry per world unit of `fabric`.
pub fn registries<P: HardwareProbe>(fabric: &LocalFabric, probes: Vec<P>, max_teams: usize) -> Vec<Registry<P>> {
    fabric
        .endpoints()
        .into_iter()
        .zip(probes)
        .map(|(endpoint, probe)| {
            Arc::new(LocalityRegistry::builder().collective(endpoint).probe(probe).max_teams(max_teams).build())
        })
        .collect()
}

/// Runs `create(team)` concurrently on every given registry.
pub async fn create_on<P: HardwareProbe + 'static>(
    registries: &[Registry<P>],
    team: TeamId,
) -> Vec<Result<Arc<TeamLocality>, LocalityError>> {
    let handles: Vec<_> = registries
        .iter()
        .cloned()
        .map(|registry| tokio::spawn(async move { registry.create(team).await }))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

/// Runs `init()` on every registry and asserts success.
pub async fn init_all<P: HardwareProbe + 'static>(registries: &[Registry<P>]) -> Vec<Arc<TeamLocality>> {
    create_on(registries, TeamId::ALL).await.into_iter().map(Result::unwrap).collect()
}
