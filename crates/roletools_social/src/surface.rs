//! Message side effects some commands need beyond a text reply.

use async_trait::async_trait;
use roletools_core::{ChannelId, ComponentBinding, GuildId, MessageId};
use roletools_error::RoletoolsResult;

/// Posts bot-owned UI into channels.
#[async_trait]
pub trait MessageSurface: Send + Sync {
    /// React to a message so members can click the emoji.
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> RoletoolsResult<()>;

    /// Post a message carrying the binding's button or select menu.
    async fn post_components(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        binding: &ComponentBinding,
    ) -> RoletoolsResult<MessageId>;
}
