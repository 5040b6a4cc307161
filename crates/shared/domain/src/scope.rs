use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Level of the locality hierarchy a domain represents, coarsest first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Group,
    Host,
    Module,
    Numa,
    Core,
    Unit,
}

bitflags! {
    /// A set of scopes, used for multi-scope queries and intra-host level selection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct ScopeSet: u8 {
        const GLOBAL = 1 << 0;
        const GROUP = 1 << 1;
        const HOST = 1 << 2;
        const MODULE = 1 << 3;
        const NUMA = 1 << 4;
        const CORE = 1 << 5;
        const UNIT = 1 << 6;

        /// Levels that may partition the units of a single host or module.
        const INTRA_HOST = Self::NUMA.bits() | Self::CORE.bits();
    }
}

impl ScopeSet {
    #[must_use]
    pub const fn has(self, scope: Scope) -> bool {
        self.contains(Self::from_scope(scope))
    }

    #[must_use]
    pub const fn from_scope(scope: Scope) -> Self {
        match scope {
            Scope::Global => Self::GLOBAL,
            Scope::Group => Self::GROUP,
            Scope::Host => Self::HOST,
            Scope::Module => Self::MODULE,
            Scope::Numa => Self::NUMA,
            Scope::Core => Self::CORE,
            Scope::Unit => Self::UNIT,
        }
    }
}

impl From<Scope> for ScopeSet {
    fn from(scope: Scope) -> Self {
        Self::from_scope(scope)
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, scope| set | Self::from_scope(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn scope_names_round_trip() {
        for scope in Scope::iter() {
            assert_eq!(Scope::from_str(&scope.to_string()), Ok(scope));
        }
        assert_eq!(Scope::from_str("NUMA"), Ok(Scope::Numa));
        assert!(Scope::from_str("rack").is_err());
    }

    #[test]
    fn scope_set_membership() {
        let set: ScopeSet = [Scope::Host, Scope::Unit].into_iter().collect();
        assert!(set.has(Scope::Host));
        assert!(set.has(Scope::Unit));
        assert!(!set.has(Scope::Numa));
        assert!(ScopeSet::INTRA_HOST.has(Scope::Core));
    }
}
