//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strata::domain::Scope;

/// Simulates a team in one process and inspects its locality.
#[derive(Debug, Parser)]
#[command(name = "strata-sim")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Builds the domain tree of a simulated team and queries it")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON); `strata.*` in the working directory by default
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Team to query
    #[arg(short, long, global = true, default_value_t = 0)]
    pub team: u16,

    /// World unit whose registry answers the query
    #[arg(short = 'u', long = "as-unit", global = true, default_value_t = 0)]
    pub viewpoint: usize,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the whole domain tree
    Tree {},
    /// Resolve a dotted domain tag such as `.0.1.`
    Resolve {
        /// The tag; the empty string and `.` are the root
        tag: String,
    },
    /// Show the locality of a unit and its leaf domain
    Unit {
        /// Unit id within the team
        id: u32,
    },
    /// List every domain at a scope
    Scope {
        /// One of global, group, host, module, numa, core, unit
        scope: Scope,
    },
    /// Find the deepest domain containing the given units
    Common {
        /// Unit ids within the team
        #[arg(required = true)]
        units: Vec<u32>,
    },
}
