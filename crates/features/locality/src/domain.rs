//! The domain tree: a recursive partition of a team's units following host
//! topology and intra-host hardware hierarchy.
//!
//! Nodes live in an arena in pre-order; [`DomainId`] indexes into it. Child `i`
//! of a domain tagged `T` is tagged `T` followed by `i.`, the root is tagged `.`.

use crate::error::LocalityError;
use crate::exchange::UnitMapping;
use crate::topology::HostTopology;
use serde::Serialize;
use std::collections::BTreeMap;
use strata_domain::config::TopologyConfig;
use strata_domain::constants::ROOT_TAG;
use strata_domain::{HardwareSnapshot, Scope, ScopeSet, UnitId};
use tracing::{debug, trace};

/// Index of a domain in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DomainId(u32);

impl DomainId {
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the domain tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Domain {
    pub id: DomainId,
    pub scope: Scope,
    /// Depth below the root.
    pub level: usize,
    pub tag: String,
    /// Owning host; the group name for group domains, empty for the root.
    pub host: String,
    pub hardware: HardwareSnapshot,
    /// Units of the subtree, in child order.
    pub unit_ids: Vec<UnitId>,
    pub children: Vec<DomainId>,
    pub parent: Option<DomainId>,
}

impl Domain {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[must_use]
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<DomainId> {
        self.children.get(index).copied()
    }
}

/// The domain tree of one team, identical on every unit for identical inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainTree {
    depth: usize,
    #[serde(rename = "domains")]
    nodes: Vec<Domain>,
    #[serde(skip)]
    leaf_of: Vec<DomainId>,
}

impl DomainTree {
    /// Builds the tree for a team.
    ///
    /// # Errors
    /// [`LocalityError::Internal`] if the topology does not cover every unit exactly
    /// once; nothing is returned in that case.
    pub fn build(
        units: &UnitMapping,
        topology: &HostTopology,
        config: &TopologyConfig,
    ) -> Result<Self, LocalityError> {
        let levels: Vec<Scope> = [Scope::Numa, Scope::Core]
            .into_iter()
            .filter(|scope| config.intra_host_levels.has(*scope))
            .collect();

        let mut builder = TreeBuilder {
            units,
            topology,
            levels,
            nodes: Vec::new(),
            leaf_of: vec![None; units.len()],
        };
        builder.build_root()?;
        builder.finish_tree()
    }

    #[must_use]
    pub fn root(&self) -> &Domain {
        &self.nodes[0]
    }

    #[must_use]
    pub fn get(&self, id: DomainId) -> Option<&Domain> {
        self.nodes.get(id.index())
    }

    /// Number of levels, the root counting as one.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// All domains in pre-order.
    pub fn iter(&self) -> std::slice::Iter<'_, Domain> {
        self.nodes.iter()
    }

    /// The leaf domain holding `unit`.
    #[must_use]
    pub fn unit_leaf(&self, unit: UnitId) -> Option<&Domain> {
        self.leaf_of.get(unit.index()).and_then(|id| self.get(*id))
    }

    /// Parent chain of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: DomainId) -> impl Iterator<Item = &Domain> {
        std::iter::successors(self.get(id).and_then(|d| d.parent).and_then(|p| self.get(p)), |d| {
            d.parent.and_then(|p| self.get(p))
        })
    }

    /// Domains whose scope is in `scopes`, in pre-order.
    pub fn scope_domains(&self, scopes: ScopeSet) -> impl Iterator<Item = &Domain> {
        self.nodes.iter().filter(move |domain| scopes.has(domain.scope))
    }

    /// The deepest domain containing every unit in `units`.
    ///
    /// Returns `None` for an empty list or a unit outside the team.
    #[must_use]
    pub fn common_ancestor(&self, units: &[UnitId]) -> Option<&Domain> {
        let leaves: Vec<&Domain> = units.iter().map(|unit| self.unit_leaf(*unit)).collect::<Option<_>>()?;
        let first = *leaves.first()?;

        std::iter::once(first)
            .chain(self.ancestors(first.id))
            .find(|candidate| leaves.iter().all(|leaf| leaf.tag.starts_with(&candidate.tag)))
    }
}

impl std::ops::Index<DomainId> for DomainTree {
    type Output = Domain;

    fn index(&self, id: DomainId) -> &Domain {
        &self.nodes[id.index()]
    }
}

struct TreeBuilder<'a> {
    units: &'a UnitMapping,
    topology: &'a HostTopology,
    levels: Vec<Scope>,
    nodes: Vec<Domain>,
    leaf_of: Vec<Option<DomainId>>,
}

impl TreeBuilder<'_> {
    fn push(&mut self, scope: Scope, parent: Option<DomainId>, host: &str) -> Result<DomainId, LocalityError> {
        let id = DomainId(u32::try_from(self.nodes.len()).map_err(|_| "domain count exceeds u32")?);
        let (level, tag) = match parent {
            None => (0, ROOT_TAG.to_owned()),
            Some(parent) => {
                let parent = &mut self.nodes[parent.index()];
                let tag = format!("{}{}.", parent.tag, parent.children.len());
                parent.children.push(id);
                (parent.level + 1, tag)
            },
        };

        self.nodes.push(Domain {
            id,
            scope,
            level,
            tag,
            host: host.to_owned(),
            hardware: HardwareSnapshot::default(),
            unit_ids: Vec::new(),
            children: Vec::new(),
            parent,
        });
        Ok(id)
    }

    /// Fills `unit_ids` from the children and aggregates the hardware snapshot.
    fn seal(&mut self, id: DomainId) {
        let children = self.nodes[id.index()].children.clone();
        if !children.is_empty() {
            let unit_ids: Vec<UnitId> =
                children.iter().flat_map(|child| self.nodes[child.index()].unit_ids.iter().copied()).collect();
            self.nodes[id.index()].unit_ids = unit_ids;
        }

        let domain = &mut self.nodes[id.index()];
        domain.hardware = HardwareSnapshot::aggregate(domain.unit_ids.iter().filter_map(|u| self.units.get(*u)));
        trace!(tag = %domain.tag, scope = %domain.scope, units = domain.unit_ids.len(), "Domain sealed");
    }

    fn build_root(&mut self) -> Result<(), LocalityError> {
        let root = self.push(Scope::Global, None, "")?;
        let topology = self.topology;

        for (group, members) in topology.groups() {
            let populated: Vec<&String> = members.iter().filter(|m| topology.is_populated(m)).collect();
            if populated.is_empty() {
                continue;
            }
            let group_id = self.push(Scope::Group, Some(root), group)?;
            for member in populated {
                self.build_host(member, Scope::Host, group_id)?;
            }
            self.seal(group_id);
        }

        let ungrouped: Vec<&str> = topology.ungrouped_hosts().filter(|h| topology.is_populated(h)).collect();
        for host in ungrouped {
            self.build_host(host, Scope::Host, root)?;
        }

        self.seal(root);
        Ok(())
    }

    fn build_host(&mut self, name: &str, scope: Scope, parent: DomainId) -> Result<(), LocalityError> {
        let topology = self.topology;
        let Some(entry) = topology.host(name) else {
            return Err(LocalityError::Internal {
                message: format!("host '{name}' missing from topology").into(),
                context: None,
            });
        };

        let id = self.push(scope, Some(parent), name)?;
        let modules: Vec<&String> = entry.modules.iter().filter(|m| topology.is_populated(m)).collect();

        if modules.is_empty() {
            self.build_intra(id, name, &entry.units, 0)?;
        } else {
            if !entry.units.is_empty() {
                let own = self.push(Scope::Module, Some(id), name)?;
                self.build_intra(own, name, &entry.units, 0)?;
                self.seal(own);
            }
            for module in modules {
                self.build_host(module, Scope::Module, id)?;
            }
        }

        self.seal(id);
        Ok(())
    }

    /// Partitions `units` of `host` below `id`, trying `self.levels[from..]` in order.
    fn build_intra(&mut self, id: DomainId, host: &str, units: &[UnitId], from: usize) -> Result<(), LocalityError> {
        let levels = self.levels[from..].to_vec();
        for (offset, level) in levels.into_iter().enumerate() {
            let groups = self.partition(units, level);
            let splits = groups.len() > 1 && groups.iter().any(|group| group.len() > 1);
            if !splits {
                continue;
            }

            let next = from + offset + 1;
            for group in groups {
                let child = self.push(level, Some(id), host)?;
                self.build_intra(child, host, &group, next)?;
                self.seal(child);
            }
            return Ok(());
        }

        for &unit in units {
            let leaf = self.push(Scope::Unit, Some(id), host)?;
            self.nodes[leaf.index()].unit_ids.push(unit);
            if let Some(slot) = self.leaf_of.get_mut(unit.index()) {
                *slot = Some(leaf);
            }
            self.seal(leaf);
        }
        Ok(())
    }

    fn partition(&self, units: &[UnitId], level: Scope) -> Vec<Vec<UnitId>> {
        let mut groups: BTreeMap<u32, Vec<UnitId>> = BTreeMap::new();
        for &unit in units {
            let facts = self.units.get(unit).map(|u| u.hardware).unwrap_or_default();
            let key = match level {
                Scope::Numa => facts.numa_id,
                _ => facts.core_id,
            };
            groups.entry(key).or_default().push(unit);
        }
        groups.into_values().collect()
    }

    fn finish_tree(self) -> Result<DomainTree, LocalityError> {
        let leaf_of: Vec<DomainId> = self
            .leaf_of
            .iter()
            .enumerate()
            .map(|(unit, leaf)| {
                leaf.ok_or_else(|| LocalityError::Internal {
                    message: format!("unit {unit} has no leaf domain").into(),
                    context: None,
                })
            })
            .collect::<Result<_, _>>()?;

        if self.nodes[0].unit_ids.len() != self.units.len() {
            return Err(LocalityError::Internal {
                message: "root does not hold every unit exactly once".into(),
                context: None,
            });
        }

        let depth = self.nodes.iter().map(|domain| domain.level).max().unwrap_or(0) + 1;
        debug!(domains = self.nodes.len(), depth, "Domain tree built");
        Ok(DomainTree { depth, nodes: self.nodes, leaf_of })
    }
}
