//! Platform-neutral command model shared by the text and slash adapters.

use derive_getters::Getters;
use roletools_core::{
    ChannelId, GuildId, MessageId, RelationKind, RoleId, RoleOutcome, UserId, summarize,
};
use roletools_engine::{BulkTarget, SettingFlag};
use roletools_error::{CommandError, CommandErrorKind, RoletoolsResult};

/// A parsed roletools command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCommand {
    /// Grant a self-assignable role to the invoker.
    SelfAdd(RoleId),
    /// Remove a self-removable role from the invoker.
    SelfRemove(RoleId),
    /// Add roles to a relationship list.
    AddRelation {
        /// Role being configured
        role_id: RoleId,
        /// List to edit
        kind: RelationKind,
        /// Roles to add
        others: Vec<RoleId>,
    },
    /// Remove roles from a relationship list.
    RemoveRelation {
        /// Role being configured
        role_id: RoleId,
        /// List to edit
        kind: RelationKind,
        /// Roles to remove
        others: Vec<RoleId>,
    },
    /// Set a boolean flag.
    SetFlag {
        /// Role being configured
        role_id: RoleId,
        /// Flag to set
        flag: SettingFlag,
        /// New value
        value: bool,
    },
    /// Set the self-service price.
    SetCost {
        /// Role being configured
        role_id: RoleId,
        /// Price, zero for free
        cost: u64,
    },
    /// Set or clear the temporary duration.
    SetDuration {
        /// Role being configured
        role_id: RoleId,
        /// Seconds the role lasts, `None` to make it permanent
        seconds: Option<u64>,
    },
    /// Forget a role's configuration.
    Reset(RoleId),
    /// Show a role's configuration.
    Info(RoleId),
    /// List configured roles.
    List,
    /// Grant a role to many members under the normal rules.
    GiveRole {
        /// Role to grant
        role_id: RoleId,
        /// Who receives it
        targets: Vec<BulkTarget>,
    },
    /// Revoke a role from many members under the normal rules.
    RemoveRole {
        /// Role to revoke
        role_id: RoleId,
        /// Who loses it
        targets: Vec<BulkTarget>,
    },
    /// Add a role bypassing every rule.
    ForceRole {
        /// Role to add
        role_id: RoleId,
        /// Users to add it to, present or not
        users: Vec<UserId>,
    },
    /// Remove a role bypassing every rule.
    ForceRoleRemove {
        /// Role to remove
        role_id: RoleId,
        /// Users to remove it from
        users: Vec<UserId>,
    },
    /// Bind an emoji on a message to a role.
    ReactionAdd {
        /// Channel of the message
        channel_id: ChannelId,
        /// Message to bind
        message_id: MessageId,
        /// Emoji in display form
        emoji: String,
        /// Role granted by the reaction
        role_id: RoleId,
    },
    /// Unbind an emoji from a message.
    ReactionRemove {
        /// Bound message
        message_id: MessageId,
        /// Bound emoji
        emoji: String,
    },
    /// List reaction roles.
    ReactionList,
    /// Drop reaction roles whose role was deleted.
    ReactionCleanup,
    /// Post a role button in the current channel.
    ButtonCreate {
        /// Binding name
        name: String,
        /// Role toggled by the button
        role_id: RoleId,
        /// Button label
        label: Option<String>,
    },
    /// Post a role select menu in the current channel.
    SelectCreate {
        /// Binding name
        name: String,
        /// Roles offered
        role_ids: Vec<RoleId>,
        /// Placeholder text
        label: Option<String>,
    },
    /// Delete a button or select menu binding.
    ComponentDelete(String),
    /// List buttons and select menus.
    ComponentList,
    /// Show a currency balance, the invoker's when no user is given.
    Balance(Option<UserId>),
    /// Overwrite a member's currency balance.
    SetBalance {
        /// Member whose balance changes
        user_id: UserId,
        /// New balance
        amount: u64,
    },
    /// Show usage.
    Help,
}

impl RoleCommand {
    /// Command name used in logs and permission errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelfAdd(_) => "selfrole add",
            Self::SelfRemove(_) => "selfrole remove",
            Self::AddRelation { kind, .. } => match kind {
                RelationKind::Required => "required add",
                RelationKind::Inclusive => "include add",
                RelationKind::Exclusive => "exclude add",
            },
            Self::RemoveRelation { kind, .. } => match kind {
                RelationKind::Required => "required remove",
                RelationKind::Inclusive => "include remove",
                RelationKind::Exclusive => "exclude remove",
            },
            Self::SetFlag { flag, .. } => match flag {
                SettingFlag::SelfAssignable => "selfadd",
                SettingFlag::SelfRemovable => "selfrem",
                SettingFlag::Sticky => "sticky",
                SettingFlag::Auto => "autorole",
            },
            Self::SetCost { .. } => "cost",
            Self::SetDuration { .. } => "temporary",
            Self::Reset(_) => "reset",
            Self::Info(_) => "info",
            Self::List => "list",
            Self::GiveRole { .. } => "giverole",
            Self::RemoveRole { .. } => "removerole",
            Self::ForceRole { .. } => "forcerole",
            Self::ForceRoleRemove { .. } => "forceroleremove",
            Self::ReactionAdd { .. } => "reaction add",
            Self::ReactionRemove { .. } => "reaction remove",
            Self::ReactionList => "reaction list",
            Self::ReactionCleanup => "reaction cleanup",
            Self::ButtonCreate { .. } => "button create",
            Self::SelectCreate { .. } => "select create",
            Self::ComponentDelete(_) => "component delete",
            Self::ComponentList => "component list",
            Self::Balance(_) => "balance",
            Self::SetBalance { .. } => "balance set",
            Self::Help => "help",
        }
    }

    /// Whether only members with manage-roles may run the command.
    pub fn requires_admin(&self) -> bool {
        !matches!(
            self,
            Self::SelfAdd(_)
                | Self::SelfRemove(_)
                | Self::Info(_)
                | Self::Balance(None)
                | Self::Help
        )
    }
}

/// Who invoked a command and where.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct CommandContext {
    guild_id: Option<GuildId>,
    user_id: UserId,
    channel_id: ChannelId,
    /// Whether the invoker holds manage-roles in the guild.
    can_manage_roles: bool,
}

impl CommandContext {
    /// Context for a command sent in `channel_id` by `user_id`.
    pub fn new(guild_id: Option<GuildId>, user_id: UserId, channel_id: ChannelId) -> Self {
        Self {
            guild_id,
            user_id,
            channel_id,
            can_manage_roles: false,
        }
    }

    /// Record whether the invoker can manage roles.
    pub fn with_manage_roles(mut self, allowed: bool) -> Self {
        self.can_manage_roles = allowed;
        self
    }

    /// The guild, or an error for direct messages.
    pub fn guild(&self) -> RoletoolsResult<GuildId> {
        self.guild_id
            .ok_or_else(|| CommandError::new(CommandErrorKind::NotInGuild).into())
    }
}

/// Text sent back to the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message body.
    pub content: String,
    /// Visible only to the invoker where the surface supports it.
    pub ephemeral: bool,
}

impl Reply {
    /// Discord's message length limit.
    pub const MAX_LEN: usize = 2000;

    /// Public reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    /// Reply only the invoker sees.
    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }

    /// Private reply rendering role outcomes one per line.
    pub fn outcomes(outcomes: &[RoleOutcome]) -> Self {
        Self::private(summarize(outcomes))
    }

    /// Content cut to [`Reply::MAX_LEN`] characters.
    pub fn truncated(&self) -> &str {
        match self.content.char_indices().nth(Self::MAX_LEN) {
            Some((end, _)) => &self.content[..end],
            None => &self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_commands() {
        assert!(!RoleCommand::SelfAdd(RoleId(1)).requires_admin());
        assert!(!RoleCommand::Help.requires_admin());
        assert!(RoleCommand::List.requires_admin());
        assert!(!RoleCommand::Balance(None).requires_admin());
        assert!(RoleCommand::Balance(Some(UserId(3))).requires_admin());
        assert!(
            RoleCommand::ForceRole {
                role_id: RoleId(1),
                users: vec![]
            }
            .requires_admin()
        );
    }

    #[test]
    fn test_reply_truncation() {
        let reply = Reply::text("é".repeat(2500));
        assert_eq!(reply.truncated().chars().count(), Reply::MAX_LEN);
        assert_eq!(Reply::text("short").truncated(), "short");
    }

    #[test]
    fn test_direct_messages_have_no_guild() {
        let ctx = CommandContext::new(None, UserId(1), ChannelId(2));
        assert!(ctx.guild().is_err());
    }
}
