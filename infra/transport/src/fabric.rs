use crate::collective::Collective;
use crate::error::TransportError;
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use strata_domain::{TeamId, UnitId};
use tokio::sync::Barrier;
use tracing::{debug, trace, warn};

/// Rendezvous state of one team.
#[derive(Debug)]
struct TeamChannel {
    /// World unit of every team position.
    members: Vec<usize>,
    barrier: Barrier,
    slots: Mutex<Vec<Vec<u8>>>,
}

impl TeamChannel {
    fn new(members: Vec<usize>) -> Self {
        let size = members.len();
        Self { members, barrier: Barrier::new(size.max(1)), slots: Mutex::new(vec![Vec::new(); size]) }
    }

    fn position(&self, team: TeamId, world_unit: usize) -> Result<usize, TransportError> {
        self.members
            .iter()
            .position(|&member| member == world_unit)
            .ok_or(TransportError::NotMember { team, context: None })
    }

    fn collect(&self, expected: usize) -> Result<Vec<u8>, TransportError> {
        let slots = self.slots.lock();
        let mut gathered = Vec::with_capacity(expected * slots.len());
        for (unit, record) in slots.iter().enumerate() {
            if record.len() != expected {
                return Err(TransportError::RecordSize {
                    expected,
                    actual: record.len(),
                    unit,
                    context: None,
                });
            }
            gathered.extend_from_slice(record);
        }
        Ok(gathered)
    }
}

/// An in-process collective fabric shared by all simulated units of a world.
///
/// The all-units team ([`TeamId::ALL`]) is registered on construction; sub-teams
/// are registered explicitly with [`LocalFabric::register_team`].
#[derive(Debug, Clone)]
pub struct LocalFabric {
    world_size: usize,
    teams: Arc<RwLock<FxHashMap<TeamId, Arc<TeamChannel>>>>,
}

impl LocalFabric {
    /// Creates a fabric for `world_size` units.
    #[must_use]
    pub fn new(world_size: usize) -> Self {
        let mut teams = FxHashMap::default();
        teams.insert(TeamId::ALL, Arc::new(TeamChannel::new((0..world_size).collect())));
        debug!(world_size, "Local fabric created");
        Self { world_size, teams: Arc::new(RwLock::new(teams)) }
    }

    #[must_use]
    pub const fn world_size(&self) -> usize {
        self.world_size
    }

    /// Registers a team whose position `i` is world unit `members[i]`.
    ///
    /// # Errors
    /// [`TransportError::InvalidTeam`] if the id is taken or the member list is
    /// empty, repeats a unit, or names a unit outside the world.
    pub fn register_team(
        &self,
        team: TeamId,
        members: impl IntoIterator<Item = usize>,
    ) -> Result<(), TransportError> {
        let members: Vec<usize> = members.into_iter().collect();
        if members.is_empty() {
            return Err(TransportError::InvalidTeam {
                message: "member list is empty".into(),
                context: Some(team.to_string().into()),
            });
        }

        let mut seen = FxHashSet::default();
        for &member in &members {
            if member >= self.world_size || !seen.insert(member) {
                return Err(TransportError::InvalidTeam {
                    message: format!("world unit {member} is out of range or repeated").into(),
                    context: Some(team.to_string().into()),
                });
            }
        }

        let mut teams = self.teams.write();
        if teams.contains_key(&team) {
            return Err(TransportError::InvalidTeam {
                message: "team id already registered".into(),
                context: Some(team.to_string().into()),
            });
        }
        trace!(team = %team, size = members.len(), "Team registered");
        teams.insert(team, Arc::new(TeamChannel::new(members)));
        Ok(())
    }

    /// Removes a team. Returns `false` if it was not registered.
    pub fn unregister_team(&self, team: TeamId) -> bool {
        let removed = self.teams.write().remove(&team).is_some();
        if removed {
            trace!(team = %team, "Team unregistered");
        }
        removed
    }

    /// The endpoint through which world unit `world_unit` participates.
    ///
    /// # Errors
    /// [`TransportError::NotMember`] if the unit is outside the world.
    pub fn endpoint(&self, world_unit: usize) -> Result<FabricEndpoint, TransportError> {
        if world_unit >= self.world_size {
            return Err(TransportError::NotMember {
                team: TeamId::ALL,
                context: Some(format!("world unit {world_unit}").into()),
            });
        }
        Ok(FabricEndpoint { fabric: self.clone(), world_unit })
    }

    /// One endpoint per world unit, in unit order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<FabricEndpoint> {
        (0..self.world_size).map(|world_unit| FabricEndpoint { fabric: self.clone(), world_unit }).collect()
    }

    fn channel(&self, team: TeamId) -> Result<Arc<TeamChannel>, TransportError> {
        self.teams
            .read()
            .get(&team)
            .cloned()
            .ok_or(TransportError::UnknownTeam { team, context: None })
    }
}

/// One unit's view of a [`LocalFabric`].
#[derive(Debug, Clone)]
pub struct FabricEndpoint {
    fabric: LocalFabric,
    world_unit: usize,
}

impl FabricEndpoint {
    #[must_use]
    pub const fn world_unit(&self) -> usize {
        self.world_unit
    }

    #[must_use]
    pub const fn fabric(&self) -> &LocalFabric {
        &self.fabric
    }
}

impl Collective for FabricEndpoint {
    fn team_size(&self, team: TeamId) -> Result<usize, TransportError> {
        Ok(self.fabric.channel(team)?.members.len())
    }

    fn my_unit(&self, team: TeamId) -> Result<UnitId, TransportError> {
        let position = self.fabric.channel(team)?.position(team, self.world_unit)?;
        u32::try_from(position)
            .map(UnitId)
            .map_err(|_| TransportError::from(format!("team position {position} exceeds unit id range")))
    }

    async fn all_gather(&self, team: TeamId, record: &[u8]) -> Result<Vec<u8>, TransportError> {
        let channel = self.fabric.channel(team)?;
        let position = channel.position(team, self.world_unit)?;

        channel.slots.lock()[position] = record.to_vec();
        channel.barrier.wait().await;

        let gathered = channel.collect(record.len());
        // Nobody may overwrite a slot for the next round before everyone has read this one.
        channel.barrier.wait().await;

        match &gathered {
            Ok(bytes) => trace!(team = %team, unit = position, bytes = bytes.len(), "All-gather complete"),
            Err(err) => warn!(team = %team, unit = position, error = %err, "All-gather failed"),
        }
        gathered
    }

    async fn barrier(&self, team: TeamId) -> Result<(), TransportError> {
        let channel = self.fabric.channel(team)?;
        channel.position(team, self.world_unit)?;
        channel.barrier.wait().await;
        trace!(team = %team, world_unit = self.world_unit, "Barrier passed");
        Ok(())
    }
}
