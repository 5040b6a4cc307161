use anyhow::Context;
use clap::Parser;
use strata::domain::config::StrataConfig;
use strata::kernel::config::load_config_or_default;
use strata_logger::Logger;
use strata_sim::Simulation;
use strata_sim::args::Cli;

#[strata_runtime::main(simulation)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: StrataConfig =
        load_config_or_default(cli.config.as_deref()).context("Critical: Configuration is malformed")?;
    let _log = Logger::from_config(env!("CARGO_PKG_NAME"), &config.logging)?;

    let simulation = Simulation::new(&config)?;
    simulation.start().await?;

    {
        let mut out = std::io::stdout().lock();
        strata_sim::handlers::run(&simulation, &cli, &mut out)?;
    }

    simulation.shutdown().await
}
