//! Discord integration over serenity.

mod client;
mod error;
mod handler;
mod platform;
mod slash;

pub use client::RoletoolsBot;
pub use error::gateway_error;
pub(crate) use error::is_not_found;
pub use handler::RoletoolsHandler;
pub(crate) use platform::member_snapshot;
pub use platform::SerenityPlatform;
pub use slash::slash_commands;
