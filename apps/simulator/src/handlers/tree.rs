use crate::simulation::UnitRegistry;
use anyhow::Result;
use std::io::Write;
use strata::domain::TeamId;
use strata::locality::Domain;

pub(super) fn print_tree(registry: &UnitRegistry, team: TeamId, json: bool, out: &mut impl Write) -> Result<()> {
    let state = registry.team(team)?;
    let tree = state.tree();

    if json {
        serde_json::to_writer_pretty(&mut *out, tree)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{team}: {} units, {} domains, depth {}", state.units().len(), tree.len(), tree.depth())?;
    for domain in tree.iter() {
        writeln!(out, "{}{}", "  ".repeat(domain.level), summary(domain))?;
    }
    Ok(())
}

/// One line per domain: tag, scope, owner and the aggregated hardware.
pub(super) fn summary(domain: &Domain) -> String {
    let hw = &domain.hardware;
    let owner = if domain.host.is_empty() { "-" } else { domain.host.as_str() };
    format!(
        "{} {} {} units={} hosts={} numa={} cores={} threads={}..{} mem={}MiB",
        domain.tag,
        domain.scope,
        owner,
        hw.num_units,
        hw.num_hosts,
        hw.num_numa,
        hw.num_cores,
        hw.min_threads,
        hw.max_threads,
        hw.system_memory_mb,
    )
}
