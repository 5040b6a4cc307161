//! Dotted domain tags (`.0.1.`) and their resolution against a tree.

use crate::domain::{Domain, DomainTree};
use crate::error::LocalityError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strata_domain::constants::ROOT_TAG;

/// A parsed domain tag: the child index taken at every level below the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainPath(Vec<usize>);

impl DomainPath {
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path of the `index`-th child of this path.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

impl From<Vec<usize>> for DomainPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl FromStr for DomainPath {
    type Err = LocalityError;

    /// Accepts `.`-separated indices with optional leading and trailing dots; the
    /// empty string and `.` denote the root.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        if tag.is_empty() || tag == ROOT_TAG {
            return Ok(Self::root());
        }

        let body = tag.strip_prefix('.').unwrap_or(tag);
        let body = body.strip_suffix('.').unwrap_or(body);
        if body.is_empty() {
            return Err(malformed(tag, "no index between dots"));
        }

        body.split('.')
            .map(|component| {
                if component.is_empty() {
                    return Err(malformed(tag, "empty component"));
                }
                if !component.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed(tag, "component is not a non-negative integer"));
                }
                component.parse::<usize>().map_err(|_| malformed(tag, "index out of range"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

fn malformed(tag: &str, reason: &str) -> LocalityError {
    LocalityError::MalformedTag { message: format!("'{tag}': {reason}").into(), context: None }
}

impl fmt::Display for DomainPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ROOT_TAG)?;
        for index in &self.0 {
            write!(f, "{index}.")?;
        }
        Ok(())
    }
}

impl Serialize for DomainPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DomainPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

impl DomainTree {
    /// Walks `path` from the root.
    ///
    /// # Errors
    /// [`LocalityError::TagDepthExceeded`] if the walk would go below the deepest level
    /// of the tree, [`LocalityError::IndexOutOfBounds`] if an index is not smaller than
    /// the current domain's child count.
    pub fn resolve(&self, path: &DomainPath) -> Result<&Domain, LocalityError> {
        let mut domain = self.root();

        for (step, &index) in path.indices().iter().enumerate() {
            if step + 1 >= self.depth() {
                return Err(LocalityError::TagDepthExceeded {
                    tag: path.to_string(),
                    depth: self.depth(),
                    context: None,
                });
            }
            let Some(child) = domain.child(index).and_then(|id| self.get(id)) else {
                return Err(LocalityError::IndexOutOfBounds {
                    tag: path.to_string(),
                    index,
                    children: domain.num_children(),
                    context: Some(format!("at '{}'", domain.tag).into()),
                });
            };
            domain = child;
        }

        Ok(domain)
    }

    /// Parses `tag` and resolves it.
    ///
    /// # Errors
    /// [`LocalityError::MalformedTag`] plus everything [`DomainTree::resolve`] returns.
    pub fn resolve_tag(&self, tag: &str) -> Result<&Domain, LocalityError> {
        self.resolve(&tag.parse()?)
    }
}
