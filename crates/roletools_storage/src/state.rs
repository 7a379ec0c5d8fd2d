//! Serializable snapshot of everything roletools persists.

use roletools_core::{
    ComponentBinding, GuildId, MessageId, ReactionBinding, RoleId, RoleSetting,
    TemporaryRoleRecord, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted state of one guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildState {
    /// Role settings keyed by role.
    pub settings: BTreeMap<RoleId, RoleSetting>,
    /// Sticky roles per member, in the order they were recorded.
    pub sticky: BTreeMap<UserId, Vec<RoleId>>,
    /// Pending temporary role removals.
    pub temporary: Vec<TemporaryRoleRecord>,
    /// Reaction role bindings.
    pub reactions: Vec<ReactionBinding>,
    /// Button and select menu bindings.
    pub components: Vec<ComponentBinding>,
    /// Currency balances. Zero balances are not stored.
    pub balances: BTreeMap<UserId, u64>,
}

impl GuildState {
    /// Whether nothing is stored for the guild.
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
            && self.sticky.is_empty()
            && self.temporary.is_empty()
            && self.reactions.is_empty()
            && self.components.is_empty()
            && self.balances.is_empty()
    }

    pub(crate) fn set_balance(&mut self, user_id: UserId, amount: u64) {
        if amount == 0 {
            self.balances.remove(&user_id);
        } else {
            self.balances.insert(user_id, amount);
        }
    }

    pub(crate) fn add_sticky(&mut self, user_id: UserId, role_id: RoleId) -> bool {
        let roles = self.sticky.entry(user_id).or_default();
        if roles.contains(&role_id) {
            return false;
        }
        roles.push(role_id);
        true
    }

    pub(crate) fn remove_sticky(&mut self, user_id: UserId, role_id: RoleId) -> bool {
        let Some(roles) = self.sticky.get_mut(&user_id) else {
            return false;
        };
        let before = roles.len();
        roles.retain(|role| *role != role_id);
        let removed = roles.len() != before;
        if roles.is_empty() {
            self.sticky.remove(&user_id);
        }
        removed
    }

    pub(crate) fn put_temporary(&mut self, record: TemporaryRoleRecord) {
        self.temporary
            .retain(|existing| !existing.matches(record.user_id, record.role_id));
        self.temporary.push(record);
    }

    pub(crate) fn take_temporary(
        &mut self,
        user_id: UserId,
        role_id: RoleId,
    ) -> Option<TemporaryRoleRecord> {
        let index = self
            .temporary
            .iter()
            .position(|record| record.matches(user_id, role_id))?;
        Some(self.temporary.remove(index))
    }

    pub(crate) fn put_reaction(&mut self, binding: ReactionBinding) {
        self.reactions
            .retain(|existing| !existing.matches(binding.message_id, &binding.emoji));
        self.reactions.push(binding);
    }

    pub(crate) fn remove_reaction(&mut self, message_id: MessageId, emoji: &str) -> bool {
        let before = self.reactions.len();
        self.reactions
            .retain(|existing| !existing.matches(message_id, emoji));
        self.reactions.len() != before
    }

    pub(crate) fn put_component(&mut self, binding: ComponentBinding) {
        self.components.retain(|existing| existing.name != binding.name);
        self.components.push(binding);
    }

    pub(crate) fn remove_component(&mut self, name: &str) -> bool {
        let before = self.components.len();
        self.components.retain(|existing| existing.name != name);
        self.components.len() != before
    }
}

/// Persisted state of every guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoletoolsState {
    /// Per-guild state.
    pub guilds: BTreeMap<GuildId, GuildState>,
}

impl RoletoolsState {
    /// State of a guild, if any is stored.
    pub fn guild(&self, guild_id: GuildId) -> Option<&GuildState> {
        self.guilds.get(&guild_id)
    }

    /// Mutable state of a guild, created empty if absent.
    pub fn guild_mut(&mut self, guild_id: GuildId) -> &mut GuildState {
        self.guilds.entry(guild_id).or_default()
    }

    /// Drop guilds with nothing stored.
    pub fn prune(&mut self) {
        self.guilds.retain(|_, guild| !guild.is_empty());
    }
}
