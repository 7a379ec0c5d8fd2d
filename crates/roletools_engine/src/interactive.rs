//! Reaction roles, role buttons and role select menus.

use crate::{GrantOptions, RoleEngine, wait_for_verification};
use roletools_core::{
    ChannelId, ComponentBinding, ComponentId, ComponentKind, GuildId, MessageId, ReactionBinding,
    RoleId, RoleOutcome, RoleOutcomeKind, UserId,
};
use roletools_error::{CommandError, CommandErrorKind, RoletoolsResult};
use tracing::{debug, info, instrument};

/// Audit log reason for reaction roles.
pub const REACTION_REASON: &str = "Reaction Role";
/// Audit log reason for buttons and select menus.
pub const COMPONENT_REASON: &str = "Role Component";

const MAX_COMPONENT_NAME: usize = 64;
const MAX_SELECT_OPTIONS: usize = 25;

/// A reaction added to or removed from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    /// Guild of the message.
    pub guild_id: GuildId,
    /// Channel of the message.
    pub channel_id: ChannelId,
    /// Reacted message.
    pub message_id: MessageId,
    /// Member who reacted.
    pub user_id: UserId,
    /// Emoji in display form.
    pub emoji: String,
}

impl RoleEngine {
    /// Bind an emoji on a message to a role.
    #[instrument(skip(self, binding), fields(message_id = %binding.message_id, role_id = %binding.role_id))]
    pub async fn bind_reaction(
        &self,
        guild_id: GuildId,
        binding: ReactionBinding,
    ) -> RoletoolsResult<()> {
        self.ensure_roles_exist(guild_id, [binding.role_id]).await?;
        self.store().add_reaction_binding(guild_id, binding).await?;
        info!("Bound reaction role");
        Ok(())
    }

    /// Remove the binding for a message and emoji.
    pub async fn unbind_reaction(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
        emoji: &str,
    ) -> RoletoolsResult<bool> {
        self.store()
            .remove_reaction_binding(guild_id, message_id, emoji)
            .await
    }

    /// Reaction bindings in the guild.
    pub async fn reaction_bindings(&self, guild_id: GuildId) -> RoletoolsResult<Vec<ReactionBinding>> {
        self.store().reaction_bindings(guild_id).await
    }

    /// Drop bindings whose role was deleted. Returns the dropped bindings.
    #[instrument(skip(self))]
    pub async fn cleanup_reaction_bindings(
        &self,
        guild_id: GuildId,
    ) -> RoletoolsResult<Vec<ReactionBinding>> {
        let guild = self.platform().guild(guild_id).await?;
        let mut removed = Vec::new();
        for binding in self.store().reaction_bindings(guild_id).await? {
            if guild.role_exists(binding.role_id) {
                continue;
            }
            self.store()
                .remove_reaction_binding(guild_id, binding.message_id, &binding.emoji)
                .await?;
            removed.push(binding);
        }
        info!(removed = removed.len(), "Cleaned up reaction roles");
        Ok(removed)
    }

    /// Grant the bound role to a member who reacted.
    ///
    /// Waits out guild verification. Cost is not consulted. Reactions on
    /// unbound messages and reactions by bots are ignored.
    #[instrument(skip(self, event), fields(message_id = %event.message_id, user_id = %event.user_id))]
    pub async fn on_reaction_add(&self, event: &ReactionEvent) -> RoletoolsResult<Vec<RoleOutcome>> {
        let Some(binding) = self.find_reaction_binding(event).await? else {
            return Ok(Vec::new());
        };
        let Some(member) = self.member(event.guild_id, event.user_id).await? else {
            return Ok(Vec::new());
        };
        if member.bot {
            debug!("Ignoring reaction from bot");
            return Ok(Vec::new());
        }
        let setting = self.store().setting(event.guild_id, binding.role_id).await?;
        if !setting.self_assignable {
            debug!(role_id = %binding.role_id, "Reaction role is not self-assignable");
            return Ok(vec![RoleOutcome::new(
                binding.role_id,
                RoleOutcomeKind::NotSelfAssignable,
            )]);
        }

        let guild = self.platform().guild(event.guild_id).await?;
        let waited = wait_for_verification(&member, *guild.verification_level()).await;
        let member = if waited.is_zero() {
            member
        } else {
            match self.member(event.guild_id, event.user_id).await? {
                Some(member) => member,
                None => return Ok(Vec::new()),
            }
        };

        self.give_roles(&member, &[binding.role_id], REACTION_REASON, GrantOptions::default())
            .await
    }

    /// Revoke the bound role from a member who removed their reaction.
    #[instrument(skip(self, event), fields(message_id = %event.message_id, user_id = %event.user_id))]
    pub async fn on_reaction_remove(
        &self,
        event: &ReactionEvent,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        let Some(binding) = self.find_reaction_binding(event).await? else {
            return Ok(Vec::new());
        };
        let Some(member) = self.member(event.guild_id, event.user_id).await? else {
            return Ok(Vec::new());
        };
        if member.bot {
            return Ok(Vec::new());
        }
        self.self_remove(&member, &[binding.role_id], REACTION_REASON)
            .await
    }

    async fn find_reaction_binding(
        &self,
        event: &ReactionEvent,
    ) -> RoletoolsResult<Option<ReactionBinding>> {
        Ok(self
            .store()
            .reaction_bindings(event.guild_id)
            .await?
            .into_iter()
            .find(|binding| binding.matches(event.message_id, &event.emoji)))
    }

    /// Create a named button binding for one role.
    #[instrument(skip(self, label))]
    pub async fn create_button(
        &self,
        guild_id: GuildId,
        name: &str,
        role_id: RoleId,
        label: Option<String>,
    ) -> RoletoolsResult<ComponentBinding> {
        validate_component_name(name)?;
        self.ensure_roles_exist(guild_id, [role_id]).await?;
        let mut binding = ComponentBinding::button(name, role_id);
        binding.label = label;
        self.store()
            .add_component_binding(guild_id, binding.clone())
            .await?;
        info!("Created role button");
        Ok(binding)
    }

    /// Create a named select menu binding offering several roles.
    #[instrument(skip(self, label))]
    pub async fn create_select(
        &self,
        guild_id: GuildId,
        name: &str,
        role_ids: &[RoleId],
        label: Option<String>,
    ) -> RoletoolsResult<ComponentBinding> {
        validate_component_name(name)?;
        if role_ids.is_empty() || role_ids.len() > MAX_SELECT_OPTIONS {
            return Err(CommandError::new(CommandErrorKind::InvalidArgument {
                command: "select create".to_string(),
                arg_name: "roles".to_string(),
                reason: format!("expected between 1 and {MAX_SELECT_OPTIONS} roles"),
            })
            .into());
        }
        self.ensure_roles_exist(guild_id, role_ids.iter().copied())
            .await?;
        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if !roles.contains(role_id) {
                roles.push(*role_id);
            }
        }
        let mut binding = ComponentBinding::select(name, roles);
        binding.label = label;
        self.store()
            .add_component_binding(guild_id, binding.clone())
            .await?;
        info!("Created role select menu");
        Ok(binding)
    }

    /// Delete a component binding.
    pub async fn delete_component(&self, guild_id: GuildId, name: &str) -> RoletoolsResult<bool> {
        self.store().remove_component_binding(guild_id, name).await
    }

    /// Component bindings in the guild.
    pub async fn component_bindings(
        &self,
        guild_id: GuildId,
    ) -> RoletoolsResult<Vec<ComponentBinding>> {
        self.store().component_bindings(guild_id).await
    }

    async fn find_component(
        &self,
        guild_id: GuildId,
        id: &ComponentId,
        kind: ComponentKind,
    ) -> RoletoolsResult<Option<ComponentBinding>> {
        Ok(self
            .store()
            .component_bindings(guild_id)
            .await?
            .into_iter()
            .find(|binding| binding.name == id.name() && binding.kind == kind))
    }

    /// Toggle the role behind a pressed button.
    ///
    /// Self-assign and self-remove flags apply. Cost is not consulted.
    ///
    /// Unknown custom ids yield no outcomes so other components on the same
    /// message are left alone.
    #[instrument(skip(self))]
    pub async fn on_button_press(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        custom_id: &str,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        let Some(id) = ComponentId::parse(custom_id) else {
            return Ok(Vec::new());
        };
        let ComponentId::Button { role_id, .. } = id else {
            return Ok(Vec::new());
        };
        let Some(binding) = self.find_component(guild_id, &id, ComponentKind::Button).await? else {
            debug!("No binding for button");
            return Ok(Vec::new());
        };
        if !binding.role_ids.contains(&role_id) {
            return Ok(Vec::new());
        }
        let Some(member) = self.member(guild_id, user_id).await? else {
            return Ok(Vec::new());
        };
        if member.has_role(role_id) {
            self.self_remove(&member, &[role_id], COMPONENT_REASON).await
        } else {
            self.assign_permitted(&member, &[role_id], COMPONENT_REASON, GrantOptions::default())
                .await
        }
    }

    /// Apply a select menu submission.
    ///
    /// Chosen roles the member lacks are added; offered roles the member
    /// holds but did not choose are removed.
    #[instrument(skip(self, values), fields(values = values.len()))]
    pub async fn on_select_submit(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        custom_id: &str,
        values: &[String],
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        let Some(id) = ComponentId::parse(custom_id) else {
            return Ok(Vec::new());
        };
        if !matches!(id, ComponentId::Select { .. }) {
            return Ok(Vec::new());
        }
        let Some(binding) = self.find_component(guild_id, &id, ComponentKind::Select).await? else {
            debug!("No binding for select menu");
            return Ok(Vec::new());
        };
        let Some(member) = self.member(guild_id, user_id).await? else {
            return Ok(Vec::new());
        };

        let chosen: Vec<RoleId> = values
            .iter()
            .filter_map(|value| value.parse::<RoleId>().ok())
            .filter(|role_id| binding.role_ids.contains(role_id))
            .collect();
        let to_add: Vec<RoleId> = chosen
            .iter()
            .copied()
            .filter(|role_id| !member.has_role(*role_id))
            .collect();
        let to_remove: Vec<RoleId> = binding
            .role_ids
            .iter()
            .copied()
            .filter(|role_id| !chosen.contains(role_id) && member.has_role(*role_id))
            .collect();

        let mut outcomes = Vec::new();
        if !to_add.is_empty() {
            outcomes.extend(
                self.assign_permitted(&member, &to_add, COMPONENT_REASON, GrantOptions::default())
                    .await?,
            );
        }
        if !to_remove.is_empty() {
            outcomes.extend(
                self.self_remove(&member, &to_remove, COMPONENT_REASON)
                    .await?,
            );
        }
        Ok(outcomes)
    }
}

fn validate_component_name(name: &str) -> RoletoolsResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_COMPONENT_NAME
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        return Ok(());
    }
    Err(CommandError::new(CommandErrorKind::InvalidArgument {
        command: "component".to_string(),
        arg_name: "name".to_string(),
        reason: format!(
            "use 1 to {MAX_COMPONENT_NAME} letters, digits, dashes or underscores"
        ),
    })
    .into())
}
