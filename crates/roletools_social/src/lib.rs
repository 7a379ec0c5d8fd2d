//! Chat command surfaces for roletools.
//!
//! Commands arrive either as prefixed text messages or as slash commands.
//! Both are turned into a [`RoleCommand`] and run by the
//! [`CommandDispatcher`], which checks permissions, calls the rule engine
//! and renders a [`Reply`].
//!
//! # Platform Support
//!
//! The Discord adapter lives behind the `discord` feature:
//! - `SerenityPlatform` implements the engine's platform traits over the
//!   Discord HTTP API
//! - `RoletoolsHandler` routes gateway events (joins, leaves, member
//!   updates, reactions, interactions, messages) into the engine
//! - `RoletoolsBot` builds the client and starts the temporary role
//!   scheduler

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod dispatcher;
mod parser;
mod surface;

#[cfg(feature = "discord")]
mod discord;

pub use command::{CommandContext, Reply, RoleCommand};
pub use dispatcher::{CommandDispatcher, SELF_ROLE_REASON, error_reply};
pub use parser::CommandParser;
pub use surface::MessageSurface;

#[cfg(feature = "discord")]
pub use discord::{RoletoolsBot, RoletoolsHandler, SerenityPlatform, gateway_error, slash_commands};
