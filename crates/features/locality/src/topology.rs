//! Host topology: which units run on which host, and how hosts nest.

use crate::error::LocalityError;
use crate::exchange::UnitMapping;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use strata_domain::UnitId;
use strata_domain::config::TopologyConfig;
use tracing::{debug, trace};

/// One host of the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostEntry {
    /// Units running on this host, ascending.
    pub units: Vec<UnitId>,
    /// 0 for a top-level host, +1 per module nesting.
    pub level: u32,
    /// Module parent host for modules, group name for grouped top-level hosts.
    pub parent: Option<String>,
    /// Hosts nested under this one, sorted.
    pub modules: Vec<String>,
}

/// Host-indexed topology of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostTopology {
    hosts: BTreeMap<String, HostEntry>,
    /// Group name to member top-level hosts, sorted; groups without known hosts are dropped.
    groups: BTreeMap<String, Vec<String>>,
}

impl HostTopology {
    /// Builds the topology from the exchanged unit records and the configured hints.
    ///
    /// # Errors
    /// [`LocalityError::InvalidTopology`] if a group shares its name with a host, a
    /// host is listed in more than one group, or a module host is listed in a group.
    pub fn build(units: &UnitMapping, config: &TopologyConfig) -> Result<Self, LocalityError> {
        let mut hosts: BTreeMap<String, HostEntry> = BTreeMap::new();
        for unit in units {
            hosts.entry(unit.host.clone()).or_insert_with(empty_entry).units.push(unit.unit);
        }
        for declared in &config.declared_hosts {
            hosts.entry(declared.clone()).or_insert_with(empty_entry);
        }

        if config.module_hints {
            link_modules(&mut hosts, &config.module_separator);
        }

        let groups = resolve_groups(&hosts, &config.groups)?;
        for (group, members) in &groups {
            for member in members {
                if let Some(entry) = hosts.get_mut(member) {
                    entry.parent = Some(group.clone());
                }
            }
        }

        for (name, entry) in &hosts {
            trace!(host = %name, units = entry.units.len(), level = entry.level, parent = ?entry.parent, "Host");
        }
        debug!(hosts = hosts.len(), groups = groups.len(), "Host topology built");

        Ok(Self { hosts, groups })
    }

    #[must_use]
    pub fn host(&self, name: &str) -> Option<&HostEntry> {
        self.hosts.get(name)
    }

    /// All hosts, sorted by name.
    pub fn hosts(&self) -> impl Iterator<Item = (&str, &HostEntry)> {
        self.hosts.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    #[must_use]
    pub fn num_hosts(&self) -> usize {
        self.hosts.len()
    }

    /// Groups and their member hosts, sorted by name.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(name, members)| (name.as_str(), members.as_slice()))
    }

    #[must_use]
    pub fn group_of(&self, host: &str) -> Option<&str> {
        self.groups.iter().find(|(_, members)| members.iter().any(|m| m == host)).map(|(g, _)| g.as_str())
    }

    /// Top-level hosts that belong to no group, sorted.
    pub fn ungrouped_hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().filter(|(_, entry)| entry.level == 0 && entry.parent.is_none()).map(|(n, _)| n.as_str())
    }

    /// Units on `host` and all of its modules, recursively.
    #[must_use]
    pub fn subtree_units(&self, host: &str) -> usize {
        self.hosts.get(host).map_or(0, |entry| {
            entry.units.len() + entry.modules.iter().map(|m| self.subtree_units(m)).sum::<usize>()
        })
    }

    /// Whether any unit runs on `host` or one of its modules.
    #[must_use]
    pub fn is_populated(&self, host: &str) -> bool {
        self.subtree_units(host) > 0
    }
}

const fn empty_entry() -> HostEntry {
    HostEntry { units: Vec::new(), level: 0, parent: None, modules: Vec::new() }
}

/// Nests every `<parent><sep><suffix>` host under the longest matching `<parent>`.
fn link_modules(hosts: &mut BTreeMap<String, HostEntry>, separator: &str) {
    if separator.is_empty() {
        return;
    }

    let names: Vec<String> = hosts.keys().cloned().collect();
    let mut parents: BTreeMap<String, String> = BTreeMap::new();
    for name in &names {
        let parent = names
            .iter()
            .filter(|candidate| {
                name.len() > candidate.len() + separator.len()
                    && name.starts_with(candidate.as_str())
                    && name[candidate.len()..].starts_with(separator)
            })
            .max_by_key(|candidate| candidate.len());
        if let Some(parent) = parent {
            parents.insert(name.clone(), parent.clone());
        }
    }

    for (module, parent) in &parents {
        if let Some(entry) = hosts.get_mut(parent) {
            entry.modules.push(module.clone());
        }
        if let Some(entry) = hosts.get_mut(module) {
            entry.parent = Some(parent.clone());
        }
    }

    // Parent names are strictly shorter, so the chain always ends at a top-level host.
    for name in &names {
        let mut level = 0;
        let mut current = name;
        while let Some(parent) = parents.get(current) {
            level += 1;
            current = parent;
        }
        if let Some(entry) = hosts.get_mut(name) {
            entry.level = level;
            entry.modules.sort();
        }
    }
}

fn resolve_groups(
    hosts: &BTreeMap<String, HostEntry>,
    configured: &BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<String, Vec<String>>, LocalityError> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    let mut groups = BTreeMap::new();

    for (group, members) in configured {
        if hosts.contains_key(group) {
            return Err(LocalityError::InvalidTopology {
                message: format!("group '{group}' has the same name as a host").into(),
                context: None,
            });
        }

        let mut known = BTreeSet::new();
        for member in members {
            if let Some(other) = seen.insert(member.as_str(), group.as_str())
                && other != group.as_str()
            {
                return Err(LocalityError::InvalidTopology {
                    message: format!("host '{member}' is listed in groups '{other}' and '{group}'").into(),
                    context: None,
                });
            }
            let Some(entry) = hosts.get(member) else { continue };
            if entry.level > 0 {
                return Err(LocalityError::InvalidTopology {
                    message: format!("module host '{member}' cannot be grouped").into(),
                    context: None,
                });
            }
            known.insert(member.clone());
        }

        if !known.is_empty() {
            groups.insert(group.clone(), known.into_iter().collect());
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_domain::{HardwareFacts, UnitLocality};

    fn mapping(hosts: &[&str]) -> UnitMapping {
        let units = hosts
            .iter()
            .enumerate()
            .map(|(i, host)| UnitLocality {
                unit: UnitId(u32::try_from(i).unwrap()),
                host: (*host).to_owned(),
                hardware: HardwareFacts::default(),
            })
            .collect();
        UnitMapping::from_records(units).unwrap()
    }

    #[test]
    fn flat_topology_groups_units_by_host() {
        let topology = HostTopology::build(&mapping(&["b", "a", "b", "a"]), &TopologyConfig::default()).unwrap();

        assert_eq!(topology.num_hosts(), 2);
        assert_eq!(topology.host("a").unwrap().units, vec![UnitId(1), UnitId(3)]);
        assert_eq!(topology.host("b").unwrap().units, vec![UnitId(0), UnitId(2)]);
        assert_eq!(topology.ungrouped_hosts().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(topology.hosts().all(|(_, e)| e.level == 0 && e.parent.is_none()));
    }

    #[test]
    fn module_hint_nests_longest_prefix() {
        let topology = HostTopology::build(
            &mapping(&["n", "n-mic0", "n-mic0-x", "nx", "m-1"]),
            &TopologyConfig::default(),
        )
        .unwrap();

        let root = topology.host("n").unwrap();
        assert_eq!(root.modules, vec!["n-mic0".to_owned()]);
        assert_eq!(topology.host("n-mic0").unwrap().parent.as_deref(), Some("n"));
        assert_eq!(topology.host("n-mic0").unwrap().level, 1);
        assert_eq!(topology.host("n-mic0-x").unwrap().parent.as_deref(), Some("n-mic0"));
        assert_eq!(topology.host("n-mic0-x").unwrap().level, 2);
        assert_eq!(topology.host("nx").unwrap().level, 0);
        assert_eq!(topology.host("m-1").unwrap().level, 0);
        assert_eq!(topology.subtree_units("n"), 3);
    }

    #[test]
    fn module_hints_can_be_disabled() {
        let config = TopologyConfig { module_hints: false, ..TopologyConfig::default() };
        let topology = HostTopology::build(&mapping(&["n", "n-mic0"]), &config).unwrap();
        assert_eq!(topology.host("n-mic0").unwrap().level, 0);
        assert!(topology.host("n").unwrap().modules.is_empty());
    }

    #[test]
    fn groups_and_declared_hosts() {
        let mut config = TopologyConfig::default();
        config.groups.insert("rack0".to_owned(), vec!["b".to_owned(), "a".to_owned(), "ghost".to_owned()]);
        config.groups.insert("rack1".to_owned(), vec!["phantom".to_owned()]);
        config.declared_hosts.push("spare".to_owned());

        let topology = HostTopology::build(&mapping(&["a", "b", "c"]), &config).unwrap();

        assert_eq!(topology.groups().collect::<Vec<_>>(), vec![("rack0", &["a".to_owned(), "b".to_owned()][..])]);
        assert_eq!(topology.group_of("a"), Some("rack0"));
        assert_eq!(topology.host("a").unwrap().parent.as_deref(), Some("rack0"));
        assert_eq!(topology.ungrouped_hosts().collect::<Vec<_>>(), vec!["c", "spare"]);
        assert!(!topology.is_populated("spare"));
    }

    #[test]
    fn invalid_groups_are_rejected() {
        let mut config = TopologyConfig::default();
        config.groups.insert("a".to_owned(), vec!["b".to_owned()]);
        assert!(HostTopology::build(&mapping(&["a", "b"]), &config).is_err());

        let mut config = TopologyConfig::default();
        config.groups.insert("g0".to_owned(), vec!["a".to_owned()]);
        config.groups.insert("g1".to_owned(), vec!["a".to_owned()]);
        assert!(HostTopology::build(&mapping(&["a"]), &config).is_err());

        let mut config = TopologyConfig::default();
        config.groups.insert("g0".to_owned(), vec!["n-mic0".to_owned()]);
        assert!(HostTopology::build(&mapping(&["n", "n-mic0"]), &config).is_err());
    }
}
