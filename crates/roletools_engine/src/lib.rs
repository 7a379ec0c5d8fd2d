//! Role assignment rule engine for roletools.
//!
//! [`RoleEngine`] evaluates grant and revoke requests against per-role
//! settings: required roles, inclusive roles granted alongside, exclusive
//! roles swapped out, prices and guild verification. Every entry point of
//! the bot (commands, reactions, buttons, member joins and the temporary
//! role scheduler) goes through it, so the rules apply the same way
//! everywhere.
//!
//! The engine reaches the outside world only through the traits in
//! `roletools_interface`. Enable the `testing` feature for in-memory
//! doubles of the platform and the currency ledger.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod admin;
mod auto;
mod bulk;
mod config;
mod cost;
mod engine;
mod grant;
mod interactive;
mod revoke;
mod selfrole;
mod sticky;
mod temporary;
mod verification;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use admin::{SettingFlag, describe_setting};
pub use auto::AUTO_REASON;
pub use bulk::{BulkReport, BulkTarget, CooldownTracker};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::RoleEngine;
pub use grant::GrantOptions;
pub use interactive::{COMPONENT_REASON, REACTION_REASON, ReactionEvent};
pub use sticky::STICKY_REASON;
pub use temporary::{ArmedRemoval, EXPIRY_REASON, SweepReport, TemporaryRoleScheduler};
pub use verification::{check_guild_verification, wait_for_verification};
