//! Kernel utilities shared across Strata crates.
//! Keep this crate lightweight: config loading and the hardware probes that feed
//! the locality exchange.
//!
//! ## Config loading (non-wasm)
//! ```rust,ignore
//! use strata_kernel::config::load_config;
//! use strata_kernel::domain::config::StrataConfig;
//!
//! let cfg: StrataConfig = load_config(Some("strata.toml"))?;
//! ```
//!
//! ## Probing
//! ```rust
//! use strata_kernel::probe::{HardwareProbe, StaticProbe};
//!
//! let probe = StaticProbe::new("node-a", Default::default());
//! assert_eq!(probe.local_hardware().unwrap().host, "node-a");
//! ```
#[cfg(not(target_arch = "wasm32"))]
pub mod config;
pub mod probe;

pub use strata_domain as domain;
