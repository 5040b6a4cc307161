//! Team locality registry: one published locality state per active team.

use crate::domain::{Domain, DomainId, DomainTree};
use crate::error::{LocalityError, LocalityErrorExt};
use crate::exchange::{UnitMapping, exchange, failure_record};
use crate::tag::DomainPath;
use crate::topology::HostTopology;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use strata_domain::config::{StrataConfig, TopologyConfig};
use strata_domain::constants::DEFAULT_MAX_TEAMS;
use strata_domain::{ScopeSet, TeamId, UnitId, UnitLocality};
use strata_kernel::probe::HardwareProbe;
use strata_transport::Collective;
use tracing::{debug, trace, warn};

/// Everything the registry owns for one team.
///
/// Fields drop in declaration order, so the tree goes first, then the host
/// topology, then the unit mapping.
#[derive(Debug)]
pub struct TeamLocality {
    team: TeamId,
    tree: DomainTree,
    topology: HostTopology,
    units: UnitMapping,
}

impl TeamLocality {
    #[must_use]
    pub const fn team(&self) -> TeamId {
        self.team
    }

    #[must_use]
    pub const fn tree(&self) -> &DomainTree {
        &self.tree
    }

    #[must_use]
    pub const fn topology(&self) -> &HostTopology {
        &self.topology
    }

    #[must_use]
    pub const fn units(&self) -> &UnitMapping {
        &self.units
    }

    fn release(self) {
        let Self { team, tree, topology, units } = self;
        drop(tree);
        trace!(team = %team, "Domain tree released");
        drop(topology);
        trace!(team = %team, "Host topology released");
        drop(units);
        trace!(team = %team, "Unit mapping released");
    }
}

/// A domain of a published tree. Keeps the team state alive while held.
#[derive(Debug, Clone)]
pub struct DomainHandle {
    locality: Arc<TeamLocality>,
    id: DomainId,
}

impl DomainHandle {
    #[must_use]
    pub const fn id(&self) -> DomainId {
        self.id
    }

    #[must_use]
    pub fn locality(&self) -> &Arc<TeamLocality> {
        &self.locality
    }

    /// Handle of the `index`-th child, if any.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        let id = self.locality.tree.get(self.id)?.child(index)?;
        Some(Self { locality: Arc::clone(&self.locality), id })
    }

    /// Handle of the parent domain; `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let id = self.locality.tree.get(self.id)?.parent?;
        Some(Self { locality: Arc::clone(&self.locality), id })
    }
}

impl Deref for DomainHandle {
    type Target = Domain;

    fn deref(&self) -> &Domain {
        &self.locality.tree[self.id]
    }
}

/// The locality record of one unit of a published team.
#[derive(Debug, Clone)]
pub struct UnitHandle {
    locality: Arc<TeamLocality>,
    unit: UnitId,
}

impl Deref for UnitHandle {
    type Target = UnitLocality;

    fn deref(&self) -> &UnitLocality {
        &self.locality.units.as_slice()[self.unit.index()]
    }
}

#[derive(Debug)]
enum Slot {
    /// Reserved by a `create` that has not published yet.
    Building,
    Active(Arc<TeamLocality>),
}

type Slots = RwLock<FxHashMap<TeamId, Slot>>;

/// Removes a reserved slot unless the state was published.
struct Reservation<'a> {
    slots: &'a Slots,
    team: TeamId,
    published: bool,
}

impl Reservation<'_> {
    fn publish(mut self, locality: Arc<TeamLocality>) {
        self.slots.write().insert(self.team, Slot::Active(locality));
        self.published = true;
    }
}

/// Why `reserve` refused a slot.
enum Refusal {
    /// This unit is already inside the exchange for the team.
    InProgress(LocalityError),
    /// Active team or limit reached; peers may still be waiting in the exchange.
    Declined(LocalityError),
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.published {
            self.slots.write().remove(&self.team);
            trace!(team = %self.team, "Reservation dropped");
        }
    }
}

/// Builder marker: no collective set yet.
#[derive(Debug)]
pub struct NoCollective;
/// Builder marker: no hardware probe set yet.
#[derive(Debug)]
pub struct NoProbe;

/// Builder for [`LocalityRegistry`]; `build` is available once a collective and a
/// probe are set.
#[derive(Debug)]
pub struct RegistryBuilder<C = NoCollective, P = NoProbe> {
    collective: C,
    probe: P,
    topology: TopologyConfig,
    max_teams: usize,
}

impl<P> RegistryBuilder<NoCollective, P> {
    /// Sets the collective used for the exchange and the final barrier.
    pub fn collective<C: Collective>(self, collective: C) -> RegistryBuilder<C, P> {
        RegistryBuilder { collective, probe: self.probe, topology: self.topology, max_teams: self.max_teams }
    }
}

impl<C> RegistryBuilder<C, NoProbe> {
    /// Sets the probe each `create` consults for the calling unit's hardware.
    pub fn probe<P: HardwareProbe>(self, probe: P) -> RegistryBuilder<C, P> {
        RegistryBuilder { collective: self.collective, probe, topology: self.topology, max_teams: self.max_teams }
    }
}

impl<C, P> RegistryBuilder<C, P> {
    /// Bound on concurrently active teams, at least one.
    #[must_use = "The builder must be configured before it can be used to build the registry."]
    pub fn max_teams(mut self, max_teams: usize) -> Self {
        self.max_teams = max_teams.max(1);
        self
    }

    /// Topology hints applied to every team.
    #[must_use = "The builder must be configured before it can be used to build the registry."]
    pub fn topology(mut self, topology: TopologyConfig) -> Self {
        self.topology = topology;
        self
    }

    /// Takes `registry.max_teams` and `topology` from a loaded configuration.
    #[must_use = "The builder must be configured before it can be used to build the registry."]
    pub fn config(self, config: &StrataConfig) -> Self {
        self.max_teams(config.registry.max_teams).topology(config.topology.clone())
    }
}

impl<C: Collective, P: HardwareProbe> RegistryBuilder<C, P> {
    #[must_use]
    pub fn build(self) -> LocalityRegistry<C, P> {
        debug!(max_teams = self.max_teams, "Locality registry created");
        LocalityRegistry {
            collective: self.collective,
            probe: self.probe,
            topology: self.topology,
            max_teams: self.max_teams,
            slots: RwLock::new(FxHashMap::default()),
        }
    }
}

/// Owns the locality state of every active team of the calling unit.
///
/// `create` and `finalize` are collective over the team; lookups are local and only
/// take a short read lock on the slot map.
pub struct LocalityRegistry<C, P> {
    collective: C,
    probe: P,
    topology: TopologyConfig,
    max_teams: usize,
    slots: Slots,
}

impl LocalityRegistry<NoCollective, NoProbe> {
    #[must_use = "The builder must be configured before it can be used to build the registry."]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            collective: NoCollective,
            probe: NoProbe,
            topology: TopologyConfig::default(),
            max_teams: DEFAULT_MAX_TEAMS,
        }
    }
}

impl<C, P> fmt::Debug for LocalityRegistry<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        f.debug_struct("LocalityRegistry")
            .field("max_teams", &self.max_teams)
            .field("teams", &slots.len())
            .finish_non_exhaustive()
    }
}

impl<C: Collective, P: HardwareProbe> LocalityRegistry<C, P> {
    /// Creates the all-units team.
    ///
    /// # Errors
    /// As [`LocalityRegistry::create`].
    pub async fn init(&self) -> Result<Arc<TeamLocality>, LocalityError> {
        self.create(TeamId::ALL).await
    }

    /// Exchanges locality across `team`, builds its topology and domain tree and
    /// publishes them. Collective: every member of the team must call it.
    ///
    /// # Errors
    /// * [`LocalityError::AlreadyActive`] if the team is active or being created.
    /// * [`LocalityError::TeamLimit`] if `max_teams` teams are already held.
    /// * [`LocalityError::Transport`] if the exchange fails.
    /// * Record and topology errors from the exchange and the builders.
    ///
    /// Nothing is published on failure and the team id stays free. A refused call
    /// still joins the exchange with a failure record, so the other members return
    /// [`LocalityError::PeerFailed`] instead of waiting for this unit.
    pub async fn create(&self, team: TeamId) -> Result<Arc<TeamLocality>, LocalityError> {
        let reservation = match self.reserve(team) {
            Ok(reservation) => reservation,
            Err(Refusal::InProgress(err)) => return Err(err),
            Err(Refusal::Declined(err)) => return Err(self.decline(team, err).await),
        };
        debug!(team = %team, "Creating team locality");

        let locality = match self.construct(team).await {
            Ok(locality) => Arc::new(locality),
            Err(err) => {
                warn!(team = %team, error = %err, "Team locality creation failed");
                return Err(err);
            },
        };

        reservation.publish(Arc::clone(&locality));
        debug!(
            team = %team,
            units = locality.units.len(),
            hosts = locality.topology.num_hosts(),
            domains = locality.tree.len(),
            "Team locality published"
        );
        Ok(locality)
    }

    fn reserve(&self, team: TeamId) -> Result<Reservation<'_>, Refusal> {
        let mut slots = self.slots.write();
        match slots.get(&team) {
            Some(Slot::Building) => {
                return Err(Refusal::InProgress(LocalityError::AlreadyActive {
                    team,
                    context: Some("creation in progress".into()),
                }));
            },
            Some(Slot::Active(_)) => {
                return Err(Refusal::Declined(LocalityError::AlreadyActive { team, context: None }));
            },
            None => {},
        }
        if slots.len() >= self.max_teams {
            return Err(Refusal::Declined(LocalityError::TeamLimit {
                limit: self.max_teams,
                context: Some(team.to_string().into()),
            }));
        }
        slots.insert(team, Slot::Building);
        Ok(Reservation { slots: &self.slots, team, published: false })
    }

    /// Contributes a failure record to the exchange of `team` and hands back `err`.
    /// The slot map is left untouched.
    async fn decline(&self, team: TeamId, err: LocalityError) -> LocalityError {
        warn!(team = %team, error = %err, "Declining team creation");
        if let Err(transport) = self.collective.all_gather(team, &failure_record()).await {
            warn!(team = %team, error = %transport, "Could not signal the refusal to peers");
        }
        err
    }

    async fn construct(&self, team: TeamId) -> Result<TeamLocality, LocalityError> {
        let units = exchange(&self.collective, &self.probe, team).await?;
        let topology = HostTopology::build(&units, &self.topology).context(team.to_string())?;
        let tree = DomainTree::build(&units, &topology, &self.topology).context(team.to_string())?;
        Ok(TeamLocality { team, tree, topology, units })
    }

    /// Deletes every active team, then waits on the all-units barrier.
    ///
    /// # Errors
    /// [`LocalityError::Transport`] if the barrier fails; teams are deleted regardless.
    pub async fn finalize(&self) -> Result<(), LocalityError> {
        for team in self.active_teams() {
            self.delete(team);
        }
        self.collective.barrier(TeamId::ALL).await.context("Final barrier")?;
        debug!("Locality registry finalized");
        Ok(())
    }
}

impl<C, P> LocalityRegistry<C, P> {
    /// Releases the state of `team`. Returns `false` if the team was not active.
    ///
    /// Deleting is local; callers synchronize collectively before reusing the id.
    /// Handles still held elsewhere keep their state alive until dropped.
    pub fn delete(&self, team: TeamId) -> bool {
        let removed = {
            let mut slots = self.slots.write();
            match slots.get(&team) {
                Some(Slot::Active(_)) => slots.remove(&team),
                _ => None,
            }
        };

        let Some(Slot::Active(locality)) = removed else {
            trace!(team = %team, "Delete of inactive team ignored");
            return false;
        };

        match Arc::try_unwrap(locality) {
            Ok(owned) => owned.release(),
            Err(shared) => debug!(
                team = %team,
                handles = Arc::strong_count(&shared) - 1,
                "Team deleted; state released with the last outstanding handle"
            ),
        }
        debug!(team = %team, "Team locality deleted");
        true
    }

    /// The published state of `team`.
    ///
    /// # Errors
    /// [`LocalityError::UnknownTeam`] if the team is not active.
    pub fn team(&self, team: TeamId) -> Result<Arc<TeamLocality>, LocalityError> {
        match self.slots.read().get(&team) {
            Some(Slot::Active(locality)) => Ok(Arc::clone(locality)),
            _ => Err(LocalityError::UnknownTeam { team, context: None }),
        }
    }

    #[must_use]
    pub fn is_active(&self, team: TeamId) -> bool {
        matches!(self.slots.read().get(&team), Some(Slot::Active(_)))
    }

    /// Active teams, ascending.
    #[must_use]
    pub fn active_teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = self
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Active(_)))
            .map(|(team, _)| *team)
            .collect();
        teams.sort_unstable();
        teams
    }

    #[must_use]
    pub const fn max_teams(&self) -> usize {
        self.max_teams
    }

    #[must_use]
    pub const fn collective(&self) -> &C {
        &self.collective
    }

    /// Resolves a dotted tag in the tree of `team`.
    ///
    /// # Errors
    /// [`LocalityError::UnknownTeam`], [`LocalityError::MalformedTag`],
    /// [`LocalityError::TagDepthExceeded`] or [`LocalityError::IndexOutOfBounds`].
    pub fn domain(&self, team: TeamId, tag: &str) -> Result<DomainHandle, LocalityError> {
        let locality = self.team(team)?;
        let path: DomainPath = tag.parse()?;
        let id = locality.tree.resolve(&path)?.id;
        Ok(DomainHandle { locality, id })
    }

    /// Resolves a parsed path in the tree of `team`.
    ///
    /// # Errors
    /// As [`LocalityRegistry::domain`], minus tag parsing.
    pub fn domain_at(&self, team: TeamId, path: &DomainPath) -> Result<DomainHandle, LocalityError> {
        let locality = self.team(team)?;
        let id = locality.tree.resolve(path)?.id;
        Ok(DomainHandle { locality, id })
    }

    /// The locality record of `unit` in `team`.
    ///
    /// # Errors
    /// [`LocalityError::UnknownTeam`] or [`LocalityError::UnknownUnit`].
    pub fn unit(&self, team: TeamId, unit: UnitId) -> Result<UnitHandle, LocalityError> {
        let locality = self.team(team)?;
        if locality.units.get(unit).is_none() {
            return Err(LocalityError::UnknownUnit { team, unit, context: None });
        }
        Ok(UnitHandle { locality, unit })
    }

    /// The leaf domain of `unit` in `team`.
    ///
    /// # Errors
    /// [`LocalityError::UnknownTeam`] or [`LocalityError::UnknownUnit`].
    pub fn unit_domain(&self, team: TeamId, unit: UnitId) -> Result<DomainHandle, LocalityError> {
        let locality = self.team(team)?;
        let id = locality
            .tree
            .unit_leaf(unit)
            .map(|leaf| leaf.id)
            .ok_or(LocalityError::UnknownUnit { team, unit, context: None })?;
        Ok(DomainHandle { locality, id })
    }

    /// Every domain of `team` whose scope is in `scopes`, in pre-order.
    ///
    /// # Errors
    /// [`LocalityError::UnknownTeam`].
    pub fn scope_domains(&self, team: TeamId, scopes: ScopeSet) -> Result<Vec<DomainHandle>, LocalityError> {
        let locality = self.team(team)?;
        let ids: Vec<DomainId> = locality.tree.scope_domains(scopes).map(|domain| domain.id).collect();
        Ok(ids.into_iter().map(|id| DomainHandle { locality: Arc::clone(&locality), id }).collect())
    }

    /// The deepest domain of `team` containing all `units`; the root for an empty list.
    ///
    /// # Errors
    /// [`LocalityError::UnknownTeam`] or [`LocalityError::UnknownUnit`].
    pub fn common_domain(&self, team: TeamId, units: &[UnitId]) -> Result<DomainHandle, LocalityError> {
        let locality = self.team(team)?;
        if let Some(&unit) = units.iter().find(|unit| locality.units.get(**unit).is_none()) {
            return Err(LocalityError::UnknownUnit { team, unit, context: None });
        }
        let id = locality.tree.common_ancestor(units).map_or(DomainId::ROOT, |domain| domain.id);
        Ok(DomainHandle { locality, id })
    }
}
