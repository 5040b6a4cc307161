use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a team, a set of units taking part in collective operations together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u16);

impl TeamId {
    /// The team every unit belongs to.
    pub const ALL: Self = Self(0);

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl From<u16> for TeamId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{}", self.0)
    }
}

/// Position of a unit inside its team, `0..team_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl UnitId {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The id as a slice index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for UnitId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}
