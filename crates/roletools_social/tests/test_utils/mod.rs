//! Shared fixture for command surface tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use roletools_core::{
    ChannelId, ComponentBinding, GuildId, GuildSnapshot, MemberSnapshot, MessageId, RoleId,
    UserId,
};
use roletools_engine::testing::FakePlatform;
use roletools_engine::{EngineConfig, RoleEngine};
use roletools_error::RoletoolsResult;
use roletools_social::{CommandContext, CommandDispatcher, CommandParser, MessageSurface};
use roletools_storage::StateStore;
use std::sync::{Arc, Mutex};

pub const GUILD: GuildId = GuildId(1000);
pub const CHANNEL: ChannelId = ChannelId(500);
pub const ADMIN: u64 = 1;
pub const MEMBER: u64 = 2;

/// Something the dispatcher asked the surface to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Posted {
    Reaction(ChannelId, MessageId, String),
    Components(ChannelId, ComponentBinding),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    posted: Mutex<Vec<Posted>>,
}

impl RecordingSurface {
    pub fn posted(&self) -> Vec<Posted> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSurface for RecordingSurface {
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> RoletoolsResult<()> {
        self.posted
            .lock()
            .unwrap()
            .push(Posted::Reaction(channel_id, message_id, emoji.to_string()));
        Ok(())
    }

    async fn post_components(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
        binding: &ComponentBinding,
    ) -> RoletoolsResult<MessageId> {
        self.posted
            .lock()
            .unwrap()
            .push(Posted::Components(channel_id, binding.clone()));
        Ok(MessageId(9000))
    }
}

pub struct Fixture {
    pub dispatcher: CommandDispatcher,
    pub parser: CommandParser,
    pub platform: Arc<FakePlatform>,
    pub surface: Arc<RecordingSurface>,
}

fn settled(user: u64, roles: &[u64]) -> MemberSnapshot {
    let month_ago = Utc::now() - Duration::days(30);
    MemberSnapshot::new(GUILD, UserId(user), month_ago)
        .with_joined_at(month_ago)
        .with_roles(roles.iter().copied().map(RoleId))
}

impl Fixture {
    /// Guild with roles 1 through 10 below the bot, an admin and a member.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Same guild, with balances kept by the state store.
    pub fn with_ledger() -> Self {
        Self::build(true)
    }

    fn build(ledger: bool) -> Self {
        let guild = (1..=10u16).fold(GuildSnapshot::new(GUILD, 0, 100), |guild, id| {
            guild.with_role(RoleId(u64::from(id)), id)
        });
        let platform = Arc::new(
            FakePlatform::new()
                .with_guild(guild)
                .with_member(settled(ADMIN, &[]))
                .with_member(settled(MEMBER, &[])),
        );
        let store = Arc::new(StateStore::in_memory());
        let engine = RoleEngine::new(store.clone(), platform.clone(), EngineConfig::default());
        let engine = if ledger {
            engine.with_ledger(store)
        } else {
            engine
        };
        let surface = Arc::new(RecordingSurface::default());
        Self {
            dispatcher: CommandDispatcher::new(engine).with_surface(surface.clone()),
            parser: CommandParser::new("!roletools").unwrap(),
            platform,
            surface,
        }
    }

    pub fn admin(&self) -> CommandContext {
        CommandContext::new(Some(GUILD), UserId(ADMIN), CHANNEL).with_manage_roles(true)
    }

    pub fn member(&self) -> CommandContext {
        CommandContext::new(Some(GUILD), UserId(MEMBER), CHANNEL)
    }

    /// Parse and run a prefix command, returning the reply text.
    pub async fn run(&self, ctx: &CommandContext, text: &str) -> String {
        let command = self
            .parser
            .parse(text)
            .expect("addressed to the bot")
            .expect("parses");
        self.dispatcher.dispatch(ctx, command).await.content
    }

    pub fn roles(&self, user: u64) -> Vec<u64> {
        self.platform
            .roles_of(GUILD, UserId(user))
            .into_iter()
            .map(RoleId::get)
            .collect()
    }
}
