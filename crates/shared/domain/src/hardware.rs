use crate::unit::UnitLocality;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Hardware attributes of a single unit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HardwareFacts {
    /// NUMA node the unit is bound to, relative to its host.
    pub numa_id: u32,
    /// NUMA nodes on the unit's host.
    pub num_numa: u32,
    /// First core assigned to the unit.
    pub core_id: u32,
    /// Cores assigned to the unit.
    pub num_cores: u32,
    /// First logical CPU assigned to the unit.
    pub cpu_id: u32,
    pub min_threads: u32,
    pub max_threads: u32,
    pub system_memory_mb: u64,
}

/// Aggregated hardware of a domain's subtree.
///
/// Counts are derived from the set of units in the subtree rather than by summing
/// child snapshots, so a host split into several domains is never counted twice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HardwareSnapshot {
    pub num_units: u32,
    pub num_hosts: u32,
    /// Distinct `(host, numa_id)` pairs.
    pub num_numa: u32,
    pub num_cores: u32,
    pub min_threads: u32,
    pub max_threads: u32,
    /// Memory of every distinct host counted once.
    pub system_memory_mb: u64,
}

impl HardwareSnapshot {
    /// Aggregates the given units. An empty input yields the zero snapshot.
    pub fn aggregate<'a, I>(units: I) -> Self
    where
        I: IntoIterator<Item = &'a UnitLocality>,
    {
        let mut snapshot = Self::default();
        let mut host_memory: BTreeMap<&str, u64> = BTreeMap::new();
        let mut numa: BTreeSet<(&str, u32)> = BTreeSet::new();
        let mut min_threads = u32::MAX;

        for unit in units {
            let facts = &unit.hardware;
            snapshot.num_units += 1;
            snapshot.num_cores = snapshot.num_cores.saturating_add(facts.num_cores);
            snapshot.max_threads = snapshot.max_threads.max(facts.max_threads);
            min_threads = min_threads.min(facts.min_threads);

            let memory = host_memory.entry(unit.host.as_str()).or_default();
            *memory = (*memory).max(facts.system_memory_mb);
            numa.insert((unit.host.as_str(), facts.numa_id));
        }

        if snapshot.num_units > 0 {
            snapshot.min_threads = min_threads;
        }
        snapshot.num_hosts = u32::try_from(host_memory.len()).unwrap_or(u32::MAX);
        snapshot.num_numa = u32::try_from(numa.len()).unwrap_or(u32::MAX);
        snapshot.system_memory_mb = host_memory.values().sum();
        snapshot
    }
}
