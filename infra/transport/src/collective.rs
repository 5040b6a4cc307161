use crate::error::TransportError;
use std::future::Future;
use std::sync::Arc;
use strata_domain::{TeamId, UnitId};

/// Collective operations over a team of units.
///
/// Every operation except the two queries must be entered by all members of the
/// team; a member that never arrives blocks the others indefinitely.
pub trait Collective: Send + Sync {
    /// Number of units in `team`.
    ///
    /// # Errors
    /// [`TransportError::UnknownTeam`] if the team does not exist.
    fn team_size(&self, team: TeamId) -> Result<usize, TransportError>;

    /// Position of the calling unit in `team`.
    ///
    /// # Errors
    /// [`TransportError::UnknownTeam`] or [`TransportError::NotMember`].
    fn my_unit(&self, team: TeamId) -> Result<UnitId, TransportError>;

    /// Gathers one record from every member; the result holds the records
    /// concatenated in unit order. All records must have the same length.
    fn all_gather(
        &self,
        team: TeamId,
        record: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Waits until every member of `team` has entered the barrier.
    fn barrier(&self, team: TeamId) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<C: Collective> Collective for Arc<C> {
    fn team_size(&self, team: TeamId) -> Result<usize, TransportError> {
        (**self).team_size(team)
    }

    fn my_unit(&self, team: TeamId) -> Result<UnitId, TransportError> {
        (**self).my_unit(team)
    }

    fn all_gather(
        &self,
        team: TeamId,
        record: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send {
        (**self).all_gather(team, record)
    }

    fn barrier(&self, team: TeamId) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).barrier(team)
    }
}
