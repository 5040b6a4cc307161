use super::tree::summary;
use crate::simulation::UnitRegistry;
use anyhow::Result;
use std::io::Write;
use strata::domain::{Scope, ScopeSet, TeamId, UnitId};
use strata::locality::DomainHandle;

pub(super) fn resolve(registry: &UnitRegistry, team: TeamId, tag: &str, json: bool, out: &mut impl Write) -> Result<()> {
    let domain = registry.domain(team, tag)?;
    print_domains(std::slice::from_ref(&domain), json, out)
}

pub(super) fn unit(registry: &UnitRegistry, team: TeamId, id: u32, json: bool, out: &mut impl Write) -> Result<()> {
    let unit = registry.unit(team, UnitId(id))?;
    let leaf = registry.unit_domain(team, UnitId(id))?;

    if json {
        let value = serde_json::json!({ "unit": &*unit, "leaf": leaf.tag });
        serde_json::to_writer_pretty(&mut *out, &value)?;
        writeln!(out)?;
        return Ok(());
    }

    let hw = &unit.hardware;
    writeln!(out, "{} on {} (leaf {})", unit.unit, unit.host, leaf.tag)?;
    writeln!(
        out,
        "  numa {}/{} core {} ({} cores) cpu {} threads {}..{} mem {}MiB",
        hw.numa_id, hw.num_numa, hw.core_id, hw.num_cores, hw.cpu_id, hw.min_threads, hw.max_threads, hw.system_memory_mb
    )?;

    let path: Vec<String> = registry
        .team(team)?
        .tree()
        .ancestors(leaf.id())
        .map(|domain| format!("{} {}", domain.tag, domain.scope))
        .collect();
    writeln!(out, "  ancestors: {}", path.join(" <- "))?;
    Ok(())
}

pub(super) fn scope(registry: &UnitRegistry, team: TeamId, scope: Scope, json: bool, out: &mut impl Write) -> Result<()> {
    let domains = registry.scope_domains(team, ScopeSet::from(scope))?;
    print_domains(&domains, json, out)
}

pub(super) fn common(registry: &UnitRegistry, team: TeamId, units: &[u32], json: bool, out: &mut impl Write) -> Result<()> {
    let units: Vec<UnitId> = units.iter().copied().map(UnitId).collect();
    let domain = registry.common_domain(team, &units)?;
    print_domains(std::slice::from_ref(&domain), json, out)
}

fn print_domains(domains: &[DomainHandle], json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        let list: Vec<_> = domains.iter().map(|domain| &**domain).collect();
        serde_json::to_writer_pretty(&mut *out, &list)?;
        writeln!(out)?;
        return Ok(());
    }

    for domain in domains {
        writeln!(out, "{}", summary(domain))?;
        let units: Vec<String> = domain.unit_ids.iter().map(|unit| unit.get().to_string()).collect();
        writeln!(out, "  units: [{}] children: {}", units.join(", "), domain.num_children())?;
    }
    Ok(())
}
