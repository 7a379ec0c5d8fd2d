//! Executes parsed commands against the rule engine and renders replies.

use crate::{CommandContext, MessageSurface, Reply, RoleCommand};
use roletools_core::{ReactionBinding, RoleSetting};
use roletools_engine::{RoleEngine, describe_setting};
use roletools_error::{
    CommandError, CommandErrorKind, GatewayErrorKind, RoletoolsError, RoletoolsErrorKind,
    RoletoolsResult,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Audit log reason for roles members pick themselves.
pub const SELF_ROLE_REASON: &str = "Self Role";

const HELP: &str = "\
**Self service**
`selfrole add <role>` / `selfrole remove <role>`
**Role settings** (manage roles)
`required|include|exclude add|remove <role> <roles...>`
`sticky|autorole|selfadd|selfrem <role> <true|false>`
`cost <role> <amount>` · `temporary set <role> <duration>` · `temporary clear <role>`
`reset <role>` · `info <role>` · `list`
**Bulk** (manage roles)
`giverole|removerole <role> <everyone|humans|bots|role|user...>`
`forcerole|forceroleremove <role> <users...>`
**Interactive** (manage roles)
`reaction add <channel> <message> <emoji> <role>` · `reaction remove <message> <emoji>`
`reaction list` · `reaction cleanup`
`button create <name> <role> [label]` · `select create <name> <roles...>`
`component delete <name>` · `component list`
**Currency**
`balance` · `balance <user>` (manage roles) · `balance set <user> <amount>` (manage roles)";

/// Runs [`RoleCommand`]s for both the text and slash adapters.
#[derive(Clone)]
pub struct CommandDispatcher {
    engine: RoleEngine,
    surface: Option<Arc<dyn MessageSurface>>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("engine", &self.engine)
            .field("has_surface", &self.surface.is_some())
            .finish()
    }
}

impl CommandDispatcher {
    /// Dispatcher without a message surface. Reactions and components are
    /// bound but nothing is posted.
    pub fn new(engine: RoleEngine) -> Self {
        Self {
            engine,
            surface: None,
        }
    }

    /// Attach the surface used to post reactions and components.
    pub fn with_surface(mut self, surface: Arc<dyn MessageSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// The engine commands run against.
    pub fn engine(&self) -> &RoleEngine {
        &self.engine
    }

    /// Run a command and always produce a reply.
    ///
    /// Errors are rendered for the invoker; unexpected ones are logged.
    #[instrument(skip(self, ctx, command), fields(command = command.name(), user_id = %ctx.user_id()))]
    pub async fn dispatch(&self, ctx: &CommandContext, command: RoleCommand) -> Reply {
        match self.execute(ctx, command).await {
            Ok(reply) => reply,
            Err(e) => error_reply(&e),
        }
    }

    /// Run a command.
    ///
    /// # Errors
    ///
    /// Fails for commands outside a guild, admin commands from members
    /// without manage-roles, rejected setting writes and platform failures.
    pub async fn execute(
        &self,
        ctx: &CommandContext,
        command: RoleCommand,
    ) -> RoletoolsResult<Reply> {
        if command == RoleCommand::Help {
            return Ok(Reply::private(HELP));
        }
        let guild_id = ctx.guild()?;
        if command.requires_admin() && !*ctx.can_manage_roles() {
            warn!(command = command.name(), "Admin command refused");
            return Err(CommandError::new(CommandErrorKind::PermissionDenied(
                command.name().to_string(),
            ))
            .into());
        }
        let engine = &self.engine;
        let reason = format!("{} by {}", command.name(), ctx.user_id());

        let reply = match command {
            RoleCommand::Help => Reply::private(HELP),
            RoleCommand::SelfAdd(role_id) => {
                let member = self.invoker(ctx).await?;
                Reply::outcomes(&engine.self_assign(&member, &[role_id], SELF_ROLE_REASON).await?)
            }
            RoleCommand::SelfRemove(role_id) => {
                let member = self.invoker(ctx).await?;
                Reply::outcomes(&engine.self_remove(&member, &[role_id], SELF_ROLE_REASON).await?)
            }
            RoleCommand::AddRelation {
                role_id,
                kind,
                others,
            } => setting_reply(&engine.add_relation(guild_id, role_id, kind, &others).await?),
            RoleCommand::RemoveRelation {
                role_id,
                kind,
                others,
            } => setting_reply(&engine.remove_relation(guild_id, role_id, kind, &others).await?),
            RoleCommand::SetFlag {
                role_id,
                flag,
                value,
            } => {
                engine.set_flag(guild_id, role_id, flag, value).await?;
                Reply::private(format!("{} {flag}: {value}", role_id.mention()))
            }
            RoleCommand::SetCost { role_id, cost } => {
                engine.set_cost(guild_id, role_id, cost).await?;
                Reply::private(format!("{} now costs {cost}.", role_id.mention()))
            }
            RoleCommand::SetDuration { role_id, seconds } => {
                let setting = engine.set_duration(guild_id, role_id, seconds).await?;
                match setting.duration {
                    Some(secs) => Reply::private(format!(
                        "{} is now removed {secs}s after it is given.",
                        role_id.mention()
                    )),
                    None => Reply::private(format!("{} is no longer temporary.", role_id.mention())),
                }
            }
            RoleCommand::Reset(role_id) => {
                if engine.reset_setting(guild_id, role_id).await? {
                    Reply::private(format!("Reset settings for {}.", role_id.mention()))
                } else {
                    Reply::private(format!("{} had no settings.", role_id.mention()))
                }
            }
            RoleCommand::Info(role_id) => {
                setting_reply(&engine.role_setting(guild_id, role_id).await?)
            }
            RoleCommand::List => {
                let settings = engine.configured_roles(guild_id).await?;
                if settings.is_empty() {
                    Reply::private("No roles are configured.")
                } else {
                    Reply::private(
                        settings
                            .iter()
                            .map(brief)
                            .collect::<Vec<_>>()
                            .join("\n"),
                    )
                }
            }
            RoleCommand::GiveRole { role_id, targets } => {
                let report = engine.bulk_give(guild_id, role_id, &targets, &reason).await?;
                Reply::text(report.summary())
            }
            RoleCommand::RemoveRole { role_id, targets } => {
                let report = engine
                    .bulk_remove(guild_id, role_id, &targets, &reason)
                    .await?;
                Reply::text(report.summary())
            }
            RoleCommand::ForceRole { role_id, users } => {
                let report = engine.force_add(guild_id, role_id, &users, &reason).await?;
                Reply::text(report.summary())
            }
            RoleCommand::ForceRoleRemove { role_id, users } => {
                let report = engine
                    .force_remove(guild_id, role_id, &users, &reason)
                    .await?;
                Reply::text(report.summary())
            }
            RoleCommand::ReactionAdd {
                channel_id,
                message_id,
                emoji,
                role_id,
            } => {
                engine
                    .bind_reaction(
                        guild_id,
                        ReactionBinding {
                            channel_id,
                            message_id,
                            emoji: emoji.clone(),
                            role_id,
                        },
                    )
                    .await?;
                if let Some(surface) = &self.surface {
                    surface.add_reaction(channel_id, message_id, &emoji).await?;
                }
                Reply::private(format!("Reacting with {emoji} now gives {}.", role_id.mention()))
            }
            RoleCommand::ReactionRemove { message_id, emoji } => {
                if engine.unbind_reaction(guild_id, message_id, &emoji).await? {
                    Reply::private(format!("Removed the {emoji} reaction role."))
                } else {
                    Reply::private(format!("No {emoji} reaction role on that message."))
                }
            }
            RoleCommand::ReactionList => {
                let bindings = engine.reaction_bindings(guild_id).await?;
                if bindings.is_empty() {
                    Reply::private("No reaction roles.")
                } else {
                    Reply::private(
                        bindings
                            .iter()
                            .map(|b| {
                                format!(
                                    "{} → {} on message {} in <#{}>",
                                    b.emoji,
                                    b.role_id.mention(),
                                    b.message_id,
                                    b.channel_id
                                )
                            })
                            .collect::<Vec<_>>()
                            .join("\n"),
                    )
                }
            }
            RoleCommand::ReactionCleanup => {
                let removed = engine.cleanup_reaction_bindings(guild_id).await?;
                Reply::private(format!("Removed {} stale reaction roles.", removed.len()))
            }
            RoleCommand::ButtonCreate {
                name,
                role_id,
                label,
            } => {
                let binding = engine.create_button(guild_id, &name, role_id, label).await?;
                self.post(ctx, &binding).await?;
                Reply::private(format!("Created button `{name}` for {}.", role_id.mention()))
            }
            RoleCommand::SelectCreate {
                name,
                role_ids,
                label,
            } => {
                let binding = engine.create_select(guild_id, &name, &role_ids, label).await?;
                self.post(ctx, &binding).await?;
                Reply::private(format!(
                    "Created select menu `{name}` with {} roles.",
                    binding.role_ids.len()
                ))
            }
            RoleCommand::ComponentDelete(name) => {
                if engine.delete_component(guild_id, &name).await? {
                    Reply::private(format!("Deleted `{name}`."))
                } else {
                    Reply::private(format!("No component named `{name}`."))
                }
            }
            RoleCommand::Balance(user) => {
                let user_id = user.unwrap_or(*ctx.user_id());
                let balance = engine.balance(guild_id, user_id).await?;
                Reply::private(format!("{} has {balance}.", user_id.mention()))
            }
            RoleCommand::SetBalance { user_id, amount } => {
                engine.set_balance(guild_id, user_id, amount).await?;
                Reply::private(format!("{} now has {amount}.", user_id.mention()))
            }
            RoleCommand::ComponentList => {
                let bindings = engine.component_bindings(guild_id).await?;
                if bindings.is_empty() {
                    Reply::private("No buttons or select menus.")
                } else {
                    Reply::private(
                        bindings
                            .iter()
                            .map(|b| {
                                format!(
                                    "`{}` ({}): {}",
                                    b.name,
                                    b.kind,
                                    roletools_core::mention_roles(&b.role_ids)
                                )
                            })
                            .collect::<Vec<_>>()
                            .join("\n"),
                    )
                }
            }
        };
        info!("Command completed");
        Ok(reply)
    }

    async fn invoker(&self, ctx: &CommandContext) -> RoletoolsResult<roletools_core::MemberSnapshot> {
        let guild_id = ctx.guild()?;
        self.engine
            .member(guild_id, *ctx.user_id())
            .await?
            .ok_or_else(|| {
                CommandError::new(CommandErrorKind::Rejected(
                    "You are not a member of this server.".to_string(),
                ))
                .into()
            })
    }

    async fn post(
        &self,
        ctx: &CommandContext,
        binding: &roletools_core::ComponentBinding,
    ) -> RoletoolsResult<()> {
        if let Some(surface) = &self.surface {
            surface
                .post_components(ctx.guild()?, *ctx.channel_id(), binding)
                .await?;
        }
        Ok(())
    }
}

fn setting_reply(setting: &RoleSetting) -> Reply {
    Reply::private(describe_setting(setting))
}

fn brief(setting: &RoleSetting) -> String {
    let mut traits = Vec::new();
    if setting.self_assignable {
        traits.push("selfadd".to_string());
    }
    if setting.self_removable {
        traits.push("selfrem".to_string());
    }
    if setting.sticky {
        traits.push("sticky".to_string());
    }
    if setting.auto {
        traits.push("auto".to_string());
    }
    if setting.cost > 0 {
        traits.push(format!("cost {}", setting.cost));
    }
    if let Some(secs) = setting.duration {
        traits.push(format!("{secs}s"));
    }
    if !setting.required.is_empty() {
        traits.push(format!("{} required", setting.required.len()));
    }
    if !setting.inclusive_with.is_empty() {
        traits.push(format!("{} inclusive", setting.inclusive_with.len()));
    }
    if !setting.exclusive_to.is_empty() {
        traits.push(format!("{} exclusive", setting.exclusive_to.len()));
    }
    format!("{}: {}", setting.role_id.mention(), traits.join(", "))
}

/// Render an error for the invoker.
pub fn error_reply(err: &RoletoolsError) -> Reply {
    match err.kind() {
        RoletoolsErrorKind::Command(e) => Reply::private(e.kind().to_string()),
        RoletoolsErrorKind::Settings(e) => Reply::private(e.kind().to_string()),
        RoletoolsErrorKind::Gateway(e) => match e.kind() {
            GatewayErrorKind::Forbidden(_) => {
                Reply::private("I don't have permission to do that.")
            }
            GatewayErrorKind::RateLimited { retry_after_secs } => Reply::private(format!(
                "Discord is rate limiting me, try again in {retry_after_secs}s."
            )),
            _ => {
                error!(error = %err, "Platform call failed");
                Reply::private("Discord did not respond, please try again later.")
            }
        },
        _ => {
            error!(error = %err, "Command failed");
            Reply::private("Something went wrong, please try again later.")
        }
    }
}
