//! # Strata Simulator
//!
//! Runs every unit of a configured world as a task in one process, connected by a
//! [`LocalFabric`](strata::transport::LocalFabric). Each unit probes a simulated host,
//! creates the all-units team and any extra configured teams, and the simulator
//! checks that every member of a team built the same domain tree before answering
//! queries against it.

pub mod args;
pub mod handlers;
mod simulation;

pub use crate::simulation::{MAX_SIMULATED_UNITS, Simulation, UnitRegistry};
