//! The engine's platform traits over the Discord HTTP API.

use super::{gateway_error, is_not_found};
use crate::MessageSurface;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roletools_core::{
    ChannelId, ComponentBinding, ComponentKind, GuildId, GuildSnapshot, MemberSnapshot, MessageId,
    RoleId, UserId,
};
use roletools_error::{CommandError, CommandErrorKind, RoletoolsResult};
use roletools_interface::{MembershipProvider, RoleMutationGateway};
use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateMessage, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption, Http, Member, Permissions, ReactionType,
};
use serenity::cache::Cache;
use std::sync::Arc;
use tracing::{debug, instrument};

const MEMBER_PAGE: u64 = 1000;

/// Discord access for the rule engine.
///
/// Reads go to the HTTP API so role positions and memberships are current
/// when rules are evaluated. Writes are one HTTP call per role with the
/// reason recorded in the audit log.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl std::fmt::Debug for SerenityPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityPlatform").finish_non_exhaustive()
    }
}

impl SerenityPlatform {
    /// Platform over a connected client's HTTP client and cache.
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

fn timestamp(ts: serenity::all::Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0).unwrap_or_default()
}

/// Snapshot of a serenity member.
pub(crate) fn member_snapshot(member: &Member) -> MemberSnapshot {
    let snapshot = MemberSnapshot::new(
        GuildId(member.guild_id.get()),
        UserId(member.user.id.get()),
        timestamp(member.user.id.created_at()),
    )
    .with_roles(member.roles.iter().map(|role| RoleId(role.get())))
    .with_bot(member.user.bot);
    match member.joined_at {
        Some(joined_at) => snapshot.with_joined_at(timestamp(joined_at)),
        None => snapshot,
    }
}

fn to_guild(guild_id: GuildId) -> serenity::all::GuildId {
    serenity::all::GuildId::new(guild_id.get())
}

fn to_user(user_id: UserId) -> serenity::all::UserId {
    serenity::all::UserId::new(user_id.get())
}

fn to_role(role_id: RoleId) -> serenity::all::RoleId {
    serenity::all::RoleId::new(role_id.get())
}

#[async_trait]
impl MembershipProvider for SerenityPlatform {
    #[instrument(skip(self))]
    async fn guild(&self, guild_id: GuildId) -> RoletoolsResult<GuildSnapshot> {
        let guild = self
            .http
            .get_guild(to_guild(guild_id))
            .await
            .map_err(gateway_error)?;
        let bot_id = self.cache.current_user().id;
        let bot = self
            .http
            .get_member(guild.id, bot_id)
            .await
            .map_err(gateway_error)?;

        let bot_roles: Vec<_> = bot
            .roles
            .iter()
            .filter_map(|role_id| guild.roles.get(role_id))
            .collect();
        let top = bot_roles.iter().map(|role| role.position).max().unwrap_or(0);
        let manage = guild.owner_id == bot_id
            || bot_roles.iter().any(|role| {
                role.permissions
                    .intersects(Permissions::MANAGE_ROLES | Permissions::ADMINISTRATOR)
            })
            || guild
                .roles
                .get(&serenity::all::RoleId::new(guild.id.get()))
                .is_some_and(|everyone| everyone.permissions.contains(Permissions::MANAGE_ROLES));

        let snapshot = guild.roles.values().fold(
            GuildSnapshot::new(guild_id, u8::from(guild.verification_level), top),
            |snapshot, role| snapshot.with_role(RoleId(role.id.get()), role.position),
        );
        debug!(roles = guild.roles.len(), top, manage, "Fetched guild");
        Ok(snapshot.with_manage_roles(manage))
    }

    async fn member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> RoletoolsResult<Option<MemberSnapshot>> {
        match self.http.get_member(to_guild(guild_id), to_user(user_id)).await {
            Ok(member) => Ok(Some(member_snapshot(&member))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(gateway_error(e)),
        }
    }

    #[instrument(skip(self))]
    async fn members(&self, guild_id: GuildId) -> RoletoolsResult<Vec<MemberSnapshot>> {
        let mut members = Vec::new();
        let mut after = None;
        loop {
            let page = self
                .http
                .get_guild_members(to_guild(guild_id), Some(MEMBER_PAGE), after)
                .await
                .map_err(gateway_error)?;
            let full = page.len() as u64 == MEMBER_PAGE;
            after = page.last().map(|member| member.user.id.get());
            members.extend(page.iter().map(member_snapshot));
            if !full {
                break;
            }
        }
        debug!(count = members.len(), "Fetched guild members");
        Ok(members)
    }
}

#[async_trait]
impl RoleMutationGateway for SerenityPlatform {
    #[instrument(skip(self, roles), fields(roles = ?roles))]
    async fn add_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> RoletoolsResult<()> {
        for role_id in roles {
            self.http
                .add_member_role(
                    to_guild(guild_id),
                    to_user(user_id),
                    to_role(*role_id),
                    Some(reason),
                )
                .await
                .map_err(gateway_error)?;
        }
        Ok(())
    }

    #[instrument(skip(self, roles), fields(roles = ?roles))]
    async fn remove_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> RoletoolsResult<()> {
        for role_id in roles {
            self.http
                .remove_member_role(
                    to_guild(guild_id),
                    to_user(user_id),
                    to_role(*role_id),
                    Some(reason),
                )
                .await
                .map_err(gateway_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSurface for SerenityPlatform {
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> RoletoolsResult<()> {
        let reaction = ReactionType::try_from(emoji).map_err(|_| {
            CommandError::new(CommandErrorKind::InvalidArgument {
                command: "reaction add".to_string(),
                arg_name: "emoji".to_string(),
                reason: format!("'{emoji}' is not an emoji"),
            })
        })?;
        self.http
            .create_reaction(
                serenity::all::ChannelId::new(channel_id.get()),
                serenity::all::MessageId::new(message_id.get()),
                &reaction,
            )
            .await
            .map_err(gateway_error)
    }

    #[instrument(skip(self, binding), fields(name = %binding.name))]
    async fn post_components(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        binding: &ComponentBinding,
    ) -> RoletoolsResult<MessageId> {
        let roles = self
            .http
            .get_guild_roles(to_guild(guild_id))
            .await
            .map_err(gateway_error)?;
        let role_name = |role_id: RoleId| {
            roles
                .iter()
                .find(|role| role.id.get() == role_id.get())
                .map(|role| role.name.clone())
                .unwrap_or_else(|| role_id.to_string())
        };

        let row = match binding.kind {
            ComponentKind::Button => CreateActionRow::Buttons(
                binding
                    .role_ids
                    .iter()
                    .zip(binding.custom_ids())
                    .map(|(role_id, custom_id)| {
                        CreateButton::new(custom_id)
                            .label(binding.label.clone().unwrap_or_else(|| role_name(*role_id)))
                            .style(ButtonStyle::Primary)
                    })
                    .collect(),
            ),
            ComponentKind::Select => {
                let options = binding
                    .role_ids
                    .iter()
                    .map(|role_id| CreateSelectMenuOption::new(role_name(*role_id), role_id.to_string()))
                    .collect();
                let custom_id = binding.custom_ids().into_iter().next().unwrap_or_default();
                let mut menu = CreateSelectMenu::new(custom_id, CreateSelectMenuKind::String { options })
                    .min_values(0)
                    .max_values(u8::try_from(binding.role_ids.len()).unwrap_or(u8::MAX));
                if let Some(label) = &binding.label {
                    menu = menu.placeholder(label.clone());
                }
                CreateActionRow::SelectMenu(menu)
            }
        };

        let message = serenity::all::ChannelId::new(channel_id.get())
            .send_message(
                &self.http,
                CreateMessage::new()
                    .content("Pick your roles:")
                    .components(vec![row]),
            )
            .await
            .map_err(gateway_error)?;
        Ok(MessageId(message.id.get()))
    }
}
