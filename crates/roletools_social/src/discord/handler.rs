//! Serenity event handler routing gateway events into the rule engine.

use super::{SerenityPlatform, member_snapshot, slash::command_from_slash, slash_commands};
use crate::{CommandContext, CommandDispatcher, CommandParser, Reply, RoleCommand, error_reply};
use roletools_core::{ChannelId, GuildId, MessageId, RoleOutcome, UserId, summarize};
use roletools_engine::{EngineConfig, ReactionEvent, RoleEngine, TemporaryRoleScheduler};
use roletools_error::RoletoolsResult;
use roletools_interface::{CurrencyLedger, RoleStore};
use serenity::all::{
    Command, CommandInteraction, ComponentInteraction, ComponentInteractionDataKind,
    CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
    GuildMemberUpdateEvent, Interaction, Message, Reaction, Ready, User,
};
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::gateway::GatewayIntents;
use serenity::model::guild::Member;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, instrument, warn};

/// Engine and dispatcher, built once the client is connected.
struct Runtime {
    engine: RoleEngine,
    dispatcher: CommandDispatcher,
}

/// Event handler for the roletools bot.
///
/// The rule engine needs the connected client's HTTP client and cache, so
/// it is assembled on the first `ready` event. Events arriving before that
/// are dropped.
pub struct RoletoolsHandler {
    store: Arc<dyn RoleStore>,
    ledger: Option<Arc<dyn CurrencyLedger>>,
    config: EngineConfig,
    parser: CommandParser,
    runtime: OnceLock<Runtime>,
}

impl RoletoolsHandler {
    /// Handler persisting to `store` and answering `parser`'s prefix.
    pub fn new(store: Arc<dyn RoleStore>, config: EngineConfig, parser: CommandParser) -> Self {
        Self {
            store,
            ledger: None,
            config,
            parser,
            runtime: OnceLock::new(),
        }
    }

    /// Charge paid roles against a currency ledger.
    pub fn with_ledger(mut self, ledger: Arc<dyn CurrencyLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn runtime(&self) -> Option<&Runtime> {
        let runtime = self.runtime.get();
        if runtime.is_none() {
            debug!("Event before ready, ignoring");
        }
        runtime
    }

    fn build_runtime(&self, ctx: &Context) -> Runtime {
        let platform = Arc::new(SerenityPlatform::new(ctx.http.clone(), ctx.cache.clone()));
        let mut engine = RoleEngine::new(self.store.clone(), platform.clone(), self.config.clone());
        if let Some(ledger) = &self.ledger {
            engine = engine.with_ledger(ledger.clone());
        }
        let dispatcher = CommandDispatcher::new(engine.clone()).with_surface(platform);
        Runtime { engine, dispatcher }
    }

    async fn reply_to_slash(&self, ctx: &Context, runtime: &Runtime, command: &CommandInteraction) {
        let Some(guild_id) = command.guild_id else {
            respond(ctx, command, Reply::private("Roletools commands only work in a server.")).await;
            return;
        };
        let parsed = command_from_slash(&self.parser, &command.data.name, &command.data.options);
        let role_command = match parsed {
            Ok(role_command) => role_command,
            Err(e) => {
                respond(ctx, command, error_reply(&e)).await;
                return;
            }
        };

        let deferred = if is_public(&role_command) {
            command.defer(&ctx.http).await
        } else {
            command.defer_ephemeral(&ctx.http).await
        };
        if let Err(e) = deferred {
            error!(error = %e, "Failed to defer interaction");
            return;
        }

        let can_manage = command
            .member
            .as_ref()
            .and_then(|member| member.permissions)
            .is_some_and(|perms| perms.manage_roles() || perms.administrator());
        let context = CommandContext::new(
            Some(GuildId(guild_id.get())),
            UserId(command.user.id.get()),
            ChannelId(command.channel_id.get()),
        )
        .with_manage_roles(can_manage);
        let reply = runtime.dispatcher.dispatch(&context, role_command).await;
        if let Err(e) = command
            .edit_response(&ctx.http, EditInteractionResponse::new().content(reply.truncated()))
            .await
        {
            error!(error = %e, "Failed to send command reply");
        }
    }

    async fn reply_to_component(
        &self,
        ctx: &Context,
        runtime: &Runtime,
        component: &ComponentInteraction,
    ) {
        let Some(guild_id) = component.guild_id else {
            return;
        };
        let guild_id = GuildId(guild_id.get());
        let user_id = UserId(component.user.id.get());
        let custom_id = component.data.custom_id.as_str();
        let result = match &component.data.kind {
            ComponentInteractionDataKind::Button => {
                runtime.engine.on_button_press(guild_id, user_id, custom_id).await
            }
            ComponentInteractionDataKind::StringSelect { values } => {
                runtime
                    .engine
                    .on_select_submit(guild_id, user_id, custom_id, values)
                    .await
            }
            _ => Ok(Vec::new()),
        };

        let response = match result {
            Ok(outcomes) if outcomes.is_empty() => CreateInteractionResponse::Acknowledge,
            Ok(outcomes) => message_response(&Reply::outcomes(&outcomes)),
            Err(e) => message_response(&error_reply(&e)),
        };
        if let Err(e) = component.create_response(&ctx.http, response).await {
            error!(error = %e, "Failed to answer component interaction");
        }
    }

    async fn can_manage_roles(&self, ctx: &Context, guild_id: serenity::all::GuildId, user: &User) -> bool {
        let member = match guild_id.member(ctx, user.id).await {
            Ok(member) => member,
            Err(e) => {
                warn!(error = %e, "Could not fetch command author");
                return false;
            }
        };
        ctx.cache
            .guild(guild_id)
            .map(|guild| guild.member_permissions(&member))
            .is_some_and(|perms| perms.manage_roles() || perms.administrator())
    }
}

fn is_public(command: &RoleCommand) -> bool {
    matches!(
        command,
        RoleCommand::GiveRole { .. }
            | RoleCommand::RemoveRole { .. }
            | RoleCommand::ForceRole { .. }
            | RoleCommand::ForceRoleRemove { .. }
    )
}

fn message_response(reply: &Reply) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(reply.truncated())
            .ephemeral(reply.ephemeral),
    )
}

async fn respond(ctx: &Context, command: &CommandInteraction, reply: Reply) {
    if let Err(e) = command.create_response(&ctx.http, message_response(&reply)).await {
        error!(error = %e, "Failed to answer slash command");
    }
}

fn reaction_event(reaction: &Reaction) -> Option<ReactionEvent> {
    Some(ReactionEvent {
        guild_id: GuildId(reaction.guild_id?.get()),
        channel_id: ChannelId(reaction.channel_id.get()),
        message_id: MessageId(reaction.message_id.get()),
        user_id: UserId(reaction.user_id?.get()),
        emoji: reaction.emoji.to_string(),
    })
}

fn log_outcomes(what: &str, result: RoletoolsResult<Vec<RoleOutcome>>) {
    match result {
        Ok(outcomes) if outcomes.is_empty() => {}
        Ok(outcomes) => info!(event = what, outcomes = %summarize(&outcomes), "Applied roles"),
        Err(e) => error!(event = what, error = %e, "Role handling failed"),
    }
}

#[async_trait]
impl EventHandler for RoletoolsHandler {
    /// Build the engine, register slash commands and start the scheduler.
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_user = %ready.user.name,
            bot_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "Bot connected to Discord"
        );
        let mut first = false;
        let runtime = self.runtime.get_or_init(|| {
            first = true;
            self.build_runtime(&ctx)
        });
        if !first {
            debug!("Reconnected, runtime already running");
            return;
        }

        match Command::set_global_commands(&ctx.http, slash_commands()).await {
            Ok(commands) => info!(count = commands.len(), "Registered slash commands"),
            Err(e) => error!(error = %e, "Failed to register slash commands"),
        }
        TemporaryRoleScheduler::new(runtime.engine.clone()).spawn();
    }

    #[instrument(skip(self, _ctx, new_member), fields(guild_id = %new_member.guild_id, user_id = %new_member.user.id))]
    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        let Some(runtime) = self.runtime() else {
            return;
        };
        info!("Member joined guild");
        let member = member_snapshot(&new_member);
        log_outcomes("join", runtime.engine.on_member_join(&member).await);
    }

    #[instrument(skip(self, _ctx, user, member_data_if_available), fields(guild_id = %guild_id, user_id = %user.id))]
    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: serenity::all::GuildId,
        user: User,
        member_data_if_available: Option<Member>,
    ) {
        let Some(runtime) = self.runtime() else {
            return;
        };
        let Some(member) = member_data_if_available else {
            warn!("Member left but their roles were not cached");
            return;
        };
        match runtime.engine.on_member_leave(&member_snapshot(&member)).await {
            Ok(saved) => info!(saved = saved.len(), "Member left guild"),
            Err(e) => error!(error = %e, "Failed to save sticky roles"),
        }
    }

    async fn guild_member_update(
        &self,
        _ctx: Context,
        old_if_available: Option<Member>,
        new: Option<Member>,
        _event: GuildMemberUpdateEvent,
    ) {
        let Some(runtime) = self.runtime() else {
            return;
        };
        let (Some(old), Some(new)) = (old_if_available, new) else {
            debug!("Member update without cached roles");
            return;
        };
        let before: BTreeSet<_> = member_snapshot(&old).roles;
        let after = member_snapshot(&new);
        if before == after.roles {
            return;
        }
        if let Err(e) = runtime.engine.on_member_update(&before, &after).await {
            error!(user_id = %after.user_id, error = %e, "Failed to track sticky roles");
        }
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        let Some(runtime) = self.runtime() else {
            return;
        };
        if reaction.user_id == Some(ctx.cache.current_user().id) {
            return;
        }
        if let Some(event) = reaction_event(&reaction) {
            log_outcomes("reaction add", runtime.engine.on_reaction_add(&event).await);
        }
    }

    async fn reaction_remove(&self, _ctx: Context, reaction: Reaction) {
        let Some(runtime) = self.runtime() else {
            return;
        };
        if let Some(event) = reaction_event(&reaction) {
            log_outcomes("reaction remove", runtime.engine.on_reaction_remove(&event).await);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Some(runtime) = self.runtime() else {
            return;
        };
        match interaction {
            Interaction::Command(command) => self.reply_to_slash(&ctx, runtime, &command).await,
            Interaction::Component(component) => {
                self.reply_to_component(&ctx, runtime, &component).await
            }
            _ => {}
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(parsed) = self.parser.parse(&msg.content) else {
            return;
        };
        let Some(runtime) = self.runtime() else {
            return;
        };
        let reply = match parsed {
            Ok(command) => {
                let can_manage = match msg.guild_id {
                    Some(guild_id) => self.can_manage_roles(&ctx, guild_id, &msg.author).await,
                    None => false,
                };
                let context = CommandContext::new(
                    msg.guild_id.map(|guild_id| GuildId(guild_id.get())),
                    UserId(msg.author.id.get()),
                    ChannelId(msg.channel_id.get()),
                )
                .with_manage_roles(can_manage);
                runtime.dispatcher.dispatch(&context, command).await
            }
            Err(e) => error_reply(&e),
        };
        if let Err(e) = msg.reply(&ctx.http, reply.truncated()).await {
            error!(error = %e, "Failed to send command reply");
        }
    }
}
