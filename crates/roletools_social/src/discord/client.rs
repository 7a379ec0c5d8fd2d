//! Discord bot client setup and lifecycle management.

use super::{RoletoolsHandler, gateway_error};
use roletools_error::{ConfigError, RoletoolsResult};
use serenity::Client;
use tracing::{info, instrument};

/// Discord client for roletools.
///
/// # Example
/// ```no_run
/// use roletools_engine::EngineConfig;
/// use roletools_social::{CommandParser, RoletoolsBot, RoletoolsHandler};
/// use roletools_storage::StateStore;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let token = std::env::var("DISCORD_TOKEN")?;
///     let store = StateStore::open("roletools.json").await?;
///     let handler = RoletoolsHandler::new(
///         Arc::new(store),
///         EngineConfig::default(),
///         CommandParser::new("!roletools")?,
///     );
///     let mut bot = RoletoolsBot::new(token, handler).await?;
///     bot.start().await?;
///     Ok(())
/// }
/// ```
pub struct RoletoolsBot {
    client: Client,
}

impl RoletoolsBot {
    /// Build the client around `handler`.
    ///
    /// # Errors
    ///
    /// Fails if the token is malformed or the client cannot be built.
    #[instrument(skip(token, handler), fields(token_len = token.len()))]
    pub async fn new(token: String, handler: RoletoolsHandler) -> RoletoolsResult<Self> {
        if token.trim().is_empty() {
            return Err(ConfigError::new("Discord token is empty").into());
        }
        let intents = RoletoolsHandler::intents();
        info!(?intents, "Building Serenity client");
        let client = Client::builder(&token, intents)
            .event_handler(handler)
            .await
            .map_err(gateway_error)?;
        Ok(Self { client })
    }

    /// Connect and process events until the connection closes.
    ///
    /// # Errors
    ///
    /// Returns the gateway error that ended the connection.
    pub async fn start(&mut self) -> RoletoolsResult<()> {
        info!("Starting Discord bot");
        self.client.start().await.map_err(gateway_error)
    }

    /// Close every shard.
    pub async fn shutdown(&self) {
        self.client.shard_manager.shutdown_all().await;
        info!("Discord bot stopped");
    }
}
