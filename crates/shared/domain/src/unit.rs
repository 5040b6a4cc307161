use crate::hardware::HardwareFacts;
use crate::ids::UnitId;
use serde::{Deserialize, Serialize};

/// What one unit reports about itself during the locality exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLocality {
    pub unit: UnitId,
    pub host: String,
    pub hardware: HardwareFacts,
}

/// Output of a hardware probe for the calling unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalHardware {
    pub host: String,
    pub facts: HardwareFacts,
}

impl LocalHardware {
    #[must_use]
    pub fn new(host: impl Into<String>, facts: HardwareFacts) -> Self {
        Self { host: host.into(), facts }
    }

    /// Binds the probed hardware to a unit id within a team.
    #[must_use]
    pub fn into_locality(self, unit: UnitId) -> UnitLocality {
        UnitLocality { unit, host: self.host, hardware: self.facts }
    }
}
