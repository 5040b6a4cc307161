use crate::constants::{DEFAULT_MAX_TEAMS, DEFAULT_MODULE_SEPARATOR};
use crate::scope::ScopeSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration shared by every Strata component.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrataConfigInner {
    pub registry: RegistryConfig,
    pub topology: TopologyConfig,
    pub logging: LoggingConfig,
    pub simulation: SimulationConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct StrataConfig {
    #[serde(flatten, default)]
    inner: Arc<StrataConfigInner>,
}

impl Deref for StrataConfig {
    type Target = StrataConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for StrataConfig {
    fn deref_mut(&mut self) -> &mut StrataConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Limits of the team locality registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub max_teams: usize,
}

/// Hints that shape the host topology and the domain tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Nest `<host><sep><suffix>` under `<host>` when both are present.
    pub module_hints: bool,
    pub module_separator: String,
    /// Intra-host levels tried below a host or module, coarsest first.
    pub intra_host_levels: ScopeSet,
    /// Group name to member host names.
    pub groups: BTreeMap<String, Vec<String>>,
    /// Hosts known to the topology even when no unit runs there.
    pub declared_hosts: Vec<String>,
}

/// Subscriber settings consumed by `strata-logger`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Full `EnvFilter` directive; overrides `level` when set.
    pub filter: Option<String>,
    /// Enables the rolling file layer.
    pub directory: Option<PathBuf>,
    pub json: bool,
}

/// The simulated machine used by `strata-sim`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub hosts: Vec<SimulatedHost>,
    /// Extra teams created after the all-units team.
    pub teams: Vec<SimulatedTeam>,
}

/// One simulated host; its units get consecutive world ids in declaration order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatedHost {
    pub name: String,
    pub units: u32,
    pub numa: u32,
    pub cores_per_unit: u32,
    pub threads_per_core: u32,
    pub memory_mb: u64,
}

/// A simulated sub-team, listed by world unit ids.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulatedTeam {
    pub id: u16,
    pub units: Vec<u32>,
}

// --- Default ---

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { max_teams: DEFAULT_MAX_TEAMS }
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            module_hints: true,
            module_separator: DEFAULT_MODULE_SEPARATOR.to_owned(),
            intra_host_levels: ScopeSet::INTRA_HOST,
            groups: BTreeMap::new(),
            declared_hosts: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, directory: None, json: false }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hosts: vec![
                SimulatedHost { name: "node-a".to_owned(), ..SimulatedHost::default() },
                SimulatedHost { name: "node-b".to_owned(), ..SimulatedHost::default() },
            ],
            teams: Vec::new(),
        }
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self {
            name: "localhost".to_owned(),
            units: 4,
            numa: 2,
            cores_per_unit: 1,
            threads_per_core: 2,
            memory_mb: 65_536,
        }
    }
}

impl SimulationConfig {
    /// Total number of simulated units across all hosts.
    #[must_use]
    pub fn world_size(&self) -> u32 {
        self.hosts.iter().fold(0, |total: u32, host| total.saturating_add(host.units))
    }
}
