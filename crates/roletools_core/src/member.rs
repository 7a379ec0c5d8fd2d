//! Point-in-time views of guild members and guilds.

use crate::{GuildId, RoleId, UserId};
use chrono::{DateTime, Duration, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A member as seen by the platform cache at one moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    /// Guild the member belongs to.
    pub guild_id: GuildId,
    /// The member's user id.
    pub user_id: UserId,
    /// Roles currently held, excluding the implicit everyone role.
    pub roles: BTreeSet<RoleId>,
    /// When the member joined the guild, if known.
    pub joined_at: Option<DateTime<Utc>>,
    /// When the member's platform account was created.
    pub created_at: DateTime<Utc>,
    /// Whether the account is a bot.
    pub bot: bool,
}

impl MemberSnapshot {
    /// Create a role-less human member.
    pub fn new(guild_id: GuildId, user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            guild_id,
            user_id,
            roles: BTreeSet::new(),
            joined_at: None,
            created_at,
            bot: false,
        }
    }

    /// Set the join timestamp.
    pub fn with_joined_at(mut self, joined_at: DateTime<Utc>) -> Self {
        self.joined_at = Some(joined_at);
        self
    }

    /// Set the held roles.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    /// Mark the member as a bot account.
    pub fn with_bot(mut self, bot: bool) -> Self {
        self.bot = bot;
        self
    }

    /// Whether the member holds the role.
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }

    /// Age of the platform account at `now`.
    pub fn account_age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Time since the member joined the guild. Unknown join times count as
    /// joined at account creation.
    pub fn join_age(&self, now: DateTime<Utc>) -> Duration {
        now - self.joined_at.unwrap_or(self.created_at)
    }
}

/// Whether the bot can touch a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignability {
    /// The role no longer exists.
    Missing,
    /// The role ranks at or above the bot's top role, or the bot cannot
    /// manage roles at all.
    AboveCeiling,
    /// The bot may add or remove the role.
    Assignable,
}

/// Guild facts the rule engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GuildSnapshot {
    guild_id: GuildId,
    /// Platform verification level, 0 (none) to 4 (highest).
    verification_level: u8,
    /// Position of every existing role.
    role_positions: HashMap<RoleId, u16>,
    /// Position of the bot's highest role.
    bot_top_position: u16,
    /// Whether the bot holds the manage-roles permission.
    bot_can_manage_roles: bool,
}

impl GuildSnapshot {
    /// Create a snapshot with no roles and a bot that can manage roles.
    pub fn new(guild_id: GuildId, verification_level: u8, bot_top_position: u16) -> Self {
        Self {
            guild_id,
            verification_level,
            role_positions: HashMap::new(),
            bot_top_position,
            bot_can_manage_roles: true,
        }
    }

    /// Register a role at a position.
    pub fn with_role(mut self, role: RoleId, position: u16) -> Self {
        self.role_positions.insert(role, position);
        self
    }

    /// Set whether the bot holds manage-roles.
    pub fn with_manage_roles(mut self, allowed: bool) -> Self {
        self.bot_can_manage_roles = allowed;
        self
    }

    /// Whether the role exists.
    pub fn role_exists(&self, role: RoleId) -> bool {
        self.role_positions.contains_key(&role)
    }

    /// Classify a role against the bot's permission ceiling.
    pub fn assignability(&self, role: RoleId) -> Assignability {
        match self.role_positions.get(&role) {
            None => Assignability::Missing,
            Some(_) if !self.bot_can_manage_roles => Assignability::AboveCeiling,
            Some(position) if *position >= self.bot_top_position => Assignability::AboveCeiling,
            Some(_) => Assignability::Assignable,
        }
    }

    /// Whether the bot can add or remove the role.
    pub fn is_assignable(&self, role: RoleId) -> bool {
        self.assignability(role) == Assignability::Assignable
    }
}
