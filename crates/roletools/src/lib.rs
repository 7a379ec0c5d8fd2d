//! roletools - Discord role assignment bot.
//!
//! Members pick roles through commands, reactions, buttons and select
//! menus. Admins configure each role: required roles, roles granted
//! alongside, mutually exclusive roles, prices, sticky roles restored on
//! rejoin, roles given on join and roles that expire.
//!
//! This crate is the binary facade. It loads layered configuration,
//! installs logging and starts the Discord client from `roletools_social`
//! over the rule engine in `roletools_engine`.
//!
//! # Cargo Features
//!
//! - `discord` (default) - Discord gateway client
//! - `observability` - OpenTelemetry span export

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
mod config;
mod observability;

pub use config::{BotConfig, LoggingConfig, RoletoolsConfig, TOKEN_VAR, discord_token};
pub use observability::init_logging;

pub use roletools_core::{GuildId, RoleId, RoleOutcome, RoleOutcomeKind, RoleSetting, UserId};
pub use roletools_engine::{EngineConfig, RoleEngine};
pub use roletools_error::{RoletoolsError, RoletoolsErrorKind, RoletoolsResult};
pub use roletools_storage::{CachedSettingsStore, SettingsCacheConfig, StateStore};
