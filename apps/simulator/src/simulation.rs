use anyhow::{Context, Result, ensure};
use std::sync::Arc;
use strata::domain::TeamId;
use strata::domain::config::StrataConfig;
use strata::kernel::probe::StaticProbe;
use strata::locality::LocalityRegistry;
use strata::transport::{FabricEndpoint, LocalFabric};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// The registry each simulated unit owns.
pub type UnitRegistry = LocalityRegistry<FabricEndpoint, StaticProbe>;

/// Largest world one process simulates; every unit is a task with its own registry.
pub const MAX_SIMULATED_UNITS: u32 = 1 << 16;

/// A simulated world: one fabric endpoint, one probe and one registry per unit.
#[derive(Debug)]
pub struct Simulation {
    fabric: LocalFabric,
    units: Vec<Arc<UnitRegistry>>,
    /// Every team with its members as world units, in team order; the all-units team first.
    teams: Vec<(TeamId, Vec<usize>)>,
}

impl Simulation {
    /// Lays out the simulated hosts and registers the configured teams.
    ///
    /// # Errors
    /// Fails if no unit is declared, the world exceeds [`MAX_SIMULATED_UNITS`], a
    /// team reuses id 0 or an id twice, or a team names a unit outside the world.
    pub fn new(config: &StrataConfig) -> Result<Self> {
        let world = config.simulation.world_size();
        ensure!(world > 0, "the simulation declares no units");
        ensure!(world <= MAX_SIMULATED_UNITS, "{world} simulated units exceed the limit of {MAX_SIMULATED_UNITS}");

        let probes = StaticProbe::simulated(&config.simulation);

        let fabric = LocalFabric::new(probes.len());
        let mut teams = vec![(TeamId::ALL, (0..probes.len()).collect::<Vec<_>>())];
        for team in &config.simulation.teams {
            let id = TeamId(team.id);
            ensure!(id != TeamId::ALL, "team id 0 is reserved for the all-units team");
            let members: Vec<usize> = team.units.iter().map(|&unit| unit as usize).collect();
            fabric.register_team(id, members.iter().copied()).with_context(|| format!("Registering {id}"))?;
            teams.push((id, members));
        }

        let units: Vec<Arc<UnitRegistry>> = fabric
            .endpoints()
            .into_iter()
            .zip(probes)
            .map(|(endpoint, probe)| Arc::new(strata::registry(endpoint, probe, config)))
            .collect();

        info!(
            units = units.len(),
            hosts = config.simulation.hosts.len(),
            teams = teams.len(),
            "Simulation prepared"
        );
        Ok(Self { fabric, units, teams })
    }

    /// Creates every team on all of its members concurrently, then checks that all
    /// members of a team built the same tree.
    ///
    /// # Errors
    /// The first creation failure of any unit, or a tree mismatch.
    pub async fn start(&self) -> Result<()> {
        let mut tasks = JoinSet::new();
        for (world_unit, registry) in self.units.iter().enumerate() {
            let registry = Arc::clone(registry);
            let teams: Vec<TeamId> = self
                .teams
                .iter()
                .filter(|(_, members)| members.contains(&world_unit))
                .map(|(team, _)| *team)
                .collect();

            tasks.spawn(async move {
                for team in teams {
                    registry.create(team).await.with_context(|| format!("Unit {world_unit} creating {team}"))?;
                }
                Ok::<_, anyhow::Error>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            joined.context("Unit task panicked")??;
        }

        self.verify()
    }

    fn verify(&self) -> Result<()> {
        for (team, members) in &self.teams {
            let Some((&first, rest)) = members.split_first() else { continue };
            let reference = self.units[first].team(*team)?;
            for &member in rest {
                let state = self.units[member].team(*team)?;
                ensure!(
                    state.tree() == reference.tree(),
                    "world unit {member} built a different tree for {team} than unit {first}"
                );
            }
            debug!(team = %team, domains = reference.tree().len(), "Trees identical on every member");
        }
        Ok(())
    }

    /// Finalizes every unit and unregisters the configured teams.
    ///
    /// # Errors
    /// The first finalize failure.
    pub async fn shutdown(&self) -> Result<()> {
        let mut tasks = JoinSet::new();
        for registry in &self.units {
            let registry = Arc::clone(registry);
            tasks.spawn(async move { registry.finalize().await });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.context("Unit task panicked")?.context("Finalizing unit")?;
        }

        for (team, _) in self.teams.iter().skip(1) {
            self.fabric.unregister_team(*team);
        }
        info!("Simulation finished");
        Ok(())
    }

    /// The registry of world unit `world_unit`.
    ///
    /// # Errors
    /// Fails if the unit is outside the world.
    pub fn unit(&self, world_unit: usize) -> Result<&UnitRegistry> {
        self.units
            .get(world_unit)
            .map(Arc::as_ref)
            .with_context(|| format!("world unit {world_unit} is outside a world of {}", self.units.len()))
    }

    #[must_use]
    pub fn world_size(&self) -> usize {
        self.units.len()
    }

    /// Team ids in creation order.
    pub fn teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.teams.iter().map(|(team, _)| *team)
    }
}
