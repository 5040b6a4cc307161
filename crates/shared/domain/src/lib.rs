//! # Domain Models
//!
//! Pure data shared by every Strata crate: identifiers, scopes, hardware facts and
//! snapshots, per-unit locality records, configuration and the error taxonomy.
//! Keep it lean: no I/O, networking, or heavy logic, just data and small helpers.

pub mod config;
pub mod constants;
pub mod error;
pub mod hardware;
pub mod ids;
pub mod scope;
pub mod unit;

pub use error::ErrorKind;
pub use hardware::{HardwareFacts, HardwareSnapshot};
pub use ids::{TeamId, UnitId};
pub use scope::{Scope, ScopeSet};
pub use unit::{LocalHardware, UnitLocality};
