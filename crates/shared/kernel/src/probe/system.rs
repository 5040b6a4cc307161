use super::{HardwareProbe, ProbeError, ProbeErrorExt};
use std::num::NonZero;
use std::thread::available_parallelism;
use strata_domain::constants::MAX_HOST_LEN;
use strata_domain::{HardwareFacts, LocalHardware};
use sysinfo::System;
use tracing::{debug, warn};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Best-effort probe of the calling process: host name, logical CPUs and total memory.
///
/// NUMA placement is not discovered; the whole machine reports as one NUMA node.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl HardwareProbe for SystemProbe {
    fn local_hardware(&self) -> Result<LocalHardware, ProbeError> {
        let host = hostname::get()
            .context("Reading host name")?
            .into_string()
            .map_err(|_| ProbeError::InvalidHost { message: "not valid UTF-8".into(), context: None })?;

        if host.is_empty() || host.len() > MAX_HOST_LEN {
            return Err(ProbeError::InvalidHost {
                message: format!("length {} outside 1..={MAX_HOST_LEN}", host.len()).into(),
                context: None,
            });
        }

        let cpus = available_parallelism().map_or_else(
            |err| {
                warn!(error = %err, "Available parallelism unknown, assuming one CPU");
                1
            },
            NonZero::get,
        );

        let mut system = System::new();
        system.refresh_memory();
        let memory_mb = system.total_memory() / BYTES_PER_MB;

        let facts = HardwareFacts {
            numa_id: 0,
            num_numa: 1,
            core_id: 0,
            num_cores: u32::try_from(cpus).unwrap_or(u32::MAX),
            cpu_id: 0,
            min_threads: 1,
            max_threads: 1,
            system_memory_mb: memory_mb,
        };
        debug!(host = %host, cpus, memory_mb, "Probed local hardware");

        Ok(LocalHardware::new(host, facts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_probe_reports_this_machine() {
        let hardware = SystemProbe.local_hardware().unwrap();
        assert!(!hardware.host.is_empty());
        assert!(hardware.facts.num_cores >= 1);
        assert_eq!(hardware.facts.num_numa, 1);
    }
}
