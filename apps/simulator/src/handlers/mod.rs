//! Query handlers. Each one writes its answer, as text or JSON, to `out`.

mod query;
mod tree;

use crate::Simulation;
use crate::args::{Cli, Command};
use anyhow::Result;
use std::io::Write;
use strata::domain::TeamId;

/// Answers `cli.command` from the registry of `cli.viewpoint`.
///
/// # Errors
/// Unknown viewpoint, any locality error of the query, or a failed write.
pub fn run(simulation: &Simulation, cli: &Cli, out: &mut impl Write) -> Result<()> {
    let registry = simulation.unit(cli.viewpoint)?;
    let team = TeamId(cli.team);

    match &cli.command {
        Command::Tree {} => tree::print_tree(registry, team, cli.json, out),
        Command::Resolve { tag } => query::resolve(registry, team, tag, cli.json, out),
        Command::Unit { id } => query::unit(registry, team, *id, cli.json, out),
        Command::Scope { scope } => query::scope(registry, team, *scope, cli.json, out),
        Command::Common { units } => query::common(registry, team, units, cli.json, out),
    }
}
