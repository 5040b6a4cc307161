//! Hardware probes: where a unit learns its own host name and hardware facts before
//! the locality exchange.

#[cfg(feature = "system-probe")]
mod system;

#[cfg(feature = "system-probe")]
pub use system::SystemProbe;

use std::borrow::Cow;
use strata_domain::config::SimulationConfig;
use strata_domain::{HardwareFacts, LocalHardware};

#[strata_derive::strata_error]
pub enum ProbeError {
    #[error("Host lookup failed{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[kind(InvalidArgument)]
    #[error("Invalid host name{}: {message}", format_context(.context))]
    InvalidHost { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal probe error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Source of the calling unit's host name and hardware facts.
pub trait HardwareProbe: Send + Sync {
    /// Probes the hardware of the calling unit.
    ///
    /// # Errors
    /// Returns [`ProbeError`] when the platform cannot be queried.
    fn local_hardware(&self) -> Result<LocalHardware, ProbeError>;
}

impl<P: HardwareProbe + ?Sized> HardwareProbe for &P {
    fn local_hardware(&self) -> Result<LocalHardware, ProbeError> {
        (**self).local_hardware()
    }
}

impl<P: HardwareProbe + ?Sized> HardwareProbe for std::sync::Arc<P> {
    fn local_hardware(&self) -> Result<LocalHardware, ProbeError> {
        (**self).local_hardware()
    }
}

/// A probe that always reports the same hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProbe {
    hardware: LocalHardware,
}

impl StaticProbe {
    #[must_use]
    pub fn new(host: impl Into<String>, facts: HardwareFacts) -> Self {
        Self { hardware: LocalHardware::new(host, facts) }
    }

    /// One probe per simulated unit, indexed by world unit id.
    ///
    /// Units of a host get consecutive ids in declaration order, are spread evenly
    /// over the host's NUMA nodes and own `cores_per_unit` consecutive cores each.
    #[must_use]
    pub fn simulated(simulation: &SimulationConfig) -> Vec<Self> {
        let mut probes = Vec::with_capacity(simulation.world_size() as usize);

        for host in &simulation.hosts {
            let num_numa = host.numa.clamp(1, host.units.max(1));
            for local in 0..host.units {
                let core_id = local.saturating_mul(host.cores_per_unit);
                let facts = HardwareFacts {
                    numa_id: numa_of(local, num_numa, host.units),
                    num_numa,
                    core_id,
                    num_cores: host.cores_per_unit,
                    cpu_id: core_id.saturating_mul(host.threads_per_core),
                    min_threads: 1,
                    max_threads: host.threads_per_core.max(1),
                    system_memory_mb: host.memory_mb,
                };
                probes.push(Self::new(host.name.clone(), facts));
            }
        }

        probes
    }

    #[must_use]
    pub const fn hardware(&self) -> &LocalHardware {
        &self.hardware
    }
}

/// NUMA node of the `local`-th of `units` units spread evenly over `num_numa` nodes.
fn numa_of(local: u32, num_numa: u32, units: u32) -> u32 {
    let numa = u64::from(local) * u64::from(num_numa) / u64::from(units.max(1));
    u32::try_from(numa).unwrap_or(u32::MAX)
}

impl HardwareProbe for StaticProbe {
    fn local_hardware(&self) -> Result<LocalHardware, ProbeError> {
        Ok(self.hardware.clone())
    }
}
