//! # Team Locality
//!
//! Hardware locality of the units of a team, organized into a hierarchical domain
//! tree that every unit builds identically.
//!
//! ## Architecture
//!
//! 1.  **Exchange ([`exchange`]):** every unit probes its own hardware and the team
//!     all-gathers fixed-size records into a [`UnitMapping`].
//! 2.  **Host topology ([`topology`]):** units grouped by host, module hosts nested
//!     under their parent host, configured host groups applied.
//! 3.  **Domain tree ([`domain`]):** a recursive partition of the team
//!     (global, group, host, module, NUMA, core, unit) stored in a pre-order arena.
//! 4.  **Tags ([`tag`]):** dotted paths such as `.0.1.` addressing tree nodes.
//! 5.  **Registry ([`registry`]):** per-team lifecycle with atomic publication of the
//!     whole state.
//!
//! Construction is collective and runs once per team; every lookup afterwards is
//! local and lock-light.

pub mod domain;
mod error;
pub mod exchange;
pub mod registry;
pub mod tag;
pub mod topology;

pub use crate::domain::{Domain, DomainId, DomainTree};
pub use crate::error::{LocalityError, LocalityErrorExt};
pub use crate::exchange::UnitMapping;
pub use crate::registry::{DomainHandle, LocalityRegistry, RegistryBuilder, TeamLocality, UnitHandle};
pub use crate::tag::DomainPath;
pub use crate::topology::{HostEntry, HostTopology};
