//! Facade crate for Strata.
//! Re-exports the domain types, the kernel utilities, the transport seam and the
//! locality layer, and wires a registry from a loaded configuration.
//! Keep this crate thin: it composes the other crates.
//!
//! ## Usage
//! - Build a [`LocalityRegistry`] with [`registry`] (or [`node_registry`] to probe the
//!   real host), call `init` on every unit, then query domains by tag.

pub use strata_domain as domain;
pub use strata_kernel as kernel;
pub use strata_locality as locality;
pub use strata_transport as transport;

use strata_domain::config::StrataConfig;
use strata_kernel::probe::HardwareProbe;
use strata_locality::LocalityRegistry;
use strata_transport::Collective;

/// The names most callers need.
pub mod prelude {
    pub use strata_domain::config::StrataConfig;
    pub use strata_domain::{ErrorKind, Scope, ScopeSet, TeamId, UnitId};
    pub use strata_kernel::probe::{HardwareProbe, StaticProbe};
    pub use strata_locality::{
        Domain, DomainHandle, DomainPath, LocalityError, LocalityErrorExt, LocalityRegistry, UnitHandle,
    };
    pub use strata_transport::{Collective, LocalFabric};
}

/// Build-time enabled features (by Cargo feature).
pub mod features {
    pub const ENABLED: &[&str] = &[
        "locality",
        #[cfg(feature = "system-probe")]
        "system-probe",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// A registry over `collective` and `probe`, limits and topology hints taken from `config`.
#[must_use]
pub fn registry<C: Collective, P: HardwareProbe>(collective: C, probe: P, config: &StrataConfig) -> LocalityRegistry<C, P> {
    LocalityRegistry::builder().collective(collective).probe(probe).config(config).build()
}

/// A registry that probes the host it runs on.
#[cfg(feature = "system-probe")]
#[must_use]
pub fn node_registry<C: Collective>(
    collective: C,
    config: &StrataConfig,
) -> LocalityRegistry<C, strata_kernel::probe::SystemProbe> {
    registry(collective, strata_kernel::probe::SystemProbe, config)
}
