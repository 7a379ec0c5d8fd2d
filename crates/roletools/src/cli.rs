//! Command-line interface.

use crate::{RoletoolsConfig, discord_token};
use clap::{Parser, Subcommand};
use roletools_error::RoletoolsResult;
use std::path::PathBuf;
use tracing::info;

/// Discord role assignment bot.
#[derive(Parser, Debug)]
#[command(name = "roletools", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file used instead of ./roletools.toml
    #[arg(short, long, global = true, env = "ROLETOOLS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Connect to Discord and serve role commands
    Run,

    /// Load the configuration and print the effective values
    CheckConfig,
}

/// Print the effective configuration.
///
/// # Errors
///
/// Fails when the configuration cannot be loaded.
pub fn check_config(config: &RoletoolsConfig) -> RoletoolsResult<()> {
    println!("{config:#?}");
    match discord_token() {
        Ok(_) => println!("Discord token: set"),
        Err(e) => println!("Discord token: {e}"),
    }
    info!("Configuration is valid");
    Ok(())
}

/// Open the state store and run the bot until it disconnects.
///
/// # Errors
///
/// Fails when the token is missing, the state file is unreadable, or the
/// gateway connection ends with an error.
#[cfg(feature = "discord")]
pub async fn run_bot(config: &RoletoolsConfig) -> RoletoolsResult<()> {
    use roletools_social::{CommandParser, RoletoolsBot, RoletoolsHandler};
    use roletools_storage::{CachedSettingsStore, StateStore};
    use std::sync::Arc;

    let token = discord_token()?;
    let store = StateStore::open(config.bot().state_path())
        .await?
        .with_ledger_config(config.ledger());
    let store = Arc::new(CachedSettingsStore::new(store, config.cache().clone()));
    let parser = CommandParser::new(config.bot().prefix())?;
    let handler =
        RoletoolsHandler::new(store.clone(), config.engine().clone(), parser).with_ledger(store);

    let mut bot = RoletoolsBot::new(token, handler).await?;
    bot.start().await
}

/// Without the `discord` feature there is nothing to connect to.
///
/// # Errors
///
/// Always fails.
#[cfg(not(feature = "discord"))]
pub async fn run_bot(_config: &RoletoolsConfig) -> RoletoolsResult<()> {
    Err(roletools_error::ConfigError::new("roletools was built without the discord feature").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_config() {
        let cli = Cli::parse_from(["roletools", "run", "--config", "bot.toml", "-v"]);
        assert_eq!(cli.command, Commands::Run);
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_check_config() {
        let cli = Cli::parse_from(["roletools", "check-config"]);
        assert_eq!(cli.command, Commands::CheckConfig);
        assert!(!cli.verbose);
    }
}
