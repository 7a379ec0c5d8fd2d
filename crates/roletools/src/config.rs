//! Layered application configuration.
//!
//! Sources in order of precedence (later sources override earlier):
//! 1. Bundled defaults (`roletools.toml` shipped with the binary)
//! 2. `~/.config/roletools/roletools.toml`
//! 3. `./roletools.toml`, or the file given with `--config`
//! 4. `ROLETOOLS_<SECTION>__<KEY>` environment variables

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use roletools_engine::EngineConfig;
use roletools_error::{ConfigError, RoletoolsResult};
use roletools_storage::{LedgerConfig, SettingsCacheConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../roletools.toml");

/// Environment variable holding the bot token.
pub const TOKEN_VAR: &str = "DISCORD_TOKEN";

/// `[bot]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct BotConfig {
    /// Text command prefix.
    #[serde(default = "default_prefix")]
    prefix: String,

    /// JSON state file.
    #[serde(default = "default_state_path")]
    state_path: PathBuf,
}

fn default_prefix() -> String {
    "!roletools".to_string()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("roletools_state.json")
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            state_path: default_state_path(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    level: String,

    /// JSON lines instead of text.
    #[serde(default)]
    json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Complete roletools configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RoletoolsConfig {
    /// Bot surface settings.
    #[serde(default)]
    bot: BotConfig,

    /// Rule engine tuning.
    #[serde(default)]
    engine: EngineConfig,

    /// Settings cache.
    #[serde(default)]
    cache: SettingsCacheConfig,

    /// Currency ledger.
    #[serde(default)]
    ledger: LedgerConfig,

    /// Log output.
    #[serde(default)]
    logging: LoggingConfig,
}

impl RoletoolsConfig {
    /// The bundled defaults alone.
    ///
    /// # Errors
    ///
    /// Fails only if the bundled file is malformed.
    pub fn bundled() -> RoletoolsResult<Self> {
        build(Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)))
    }

    /// Load with the full precedence chain.
    ///
    /// `path` replaces `./roletools.toml` and must exist when given.
    ///
    /// # Errors
    ///
    /// Fails when a file cannot be read or a value has the wrong type.
    #[instrument]
    pub fn load(path: Option<&Path>) -> RoletoolsResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/roletools/roletools.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match path {
            Some(path) => {
                debug!(path = %path.display(), "Using explicit configuration file");
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name("roletools").required(false)),
        };

        build(builder.add_source(
            Environment::with_prefix("ROLETOOLS")
                .separator("__")
                .try_parsing(true),
        ))
    }

    /// Parse a TOML document layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Fails when the document is not valid TOML or a value has the wrong
    /// type.
    pub fn from_toml_str(toml: &str) -> RoletoolsResult<Self> {
        build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }
}

fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> RoletoolsResult<RoletoolsConfig> {
    let config = builder
        .build()
        .map_err(|e| ConfigError::new(format!("Failed to build configuration: {e}")))?
        .try_deserialize()
        .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {e}")))?;
    debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Read the bot token from the environment, loading `.env` first.
///
/// # Errors
///
/// Fails when the variable is unset or empty.
pub fn discord_token() -> RoletoolsResult<String> {
    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "No .env file loaded");
    }
    match std::env::var(TOKEN_VAR) {
        Ok(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(ConfigError::new(format!("{TOKEN_VAR} is not set")).into()),
    }
}
