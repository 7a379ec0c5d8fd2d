//! roletools binary.

use clap::Parser;
use roletools::cli::{Cli, Commands, check_config, run_bot};
use roletools::{RoletoolsConfig, init_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = RoletoolsConfig::load(cli.config.as_deref())?;
    init_logging(config.logging(), cli.verbose)?;

    match cli.command {
        Commands::Run => run_bot(&config).await?,
        Commands::CheckConfig => check_config(&config)?,
    }
    Ok(())
}
