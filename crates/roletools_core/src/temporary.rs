//! Pending expiry of temporarily granted roles.

use crate::{GuildId, RoleId, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A role grant that must be undone at `remove_at`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporaryRoleRecord {
    /// Guild the grant happened in.
    pub guild_id: GuildId,
    /// Member holding the role.
    pub user_id: UserId,
    /// The temporary role.
    pub role_id: RoleId,
    /// When the role must be removed.
    pub remove_at: DateTime<Utc>,
}

impl TemporaryRoleRecord {
    /// Record a grant made at `granted_at` that lasts `duration`.
    pub fn new(
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        granted_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            guild_id,
            user_id,
            role_id,
            remove_at: granted_at + duration,
        }
    }

    /// Whether removal falls within `window` of `now` (or is overdue).
    pub fn is_due_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.remove_at - now <= window
    }

    /// Whether the record refers to the same member and role.
    pub fn matches(&self, user_id: UserId, role_id: RoleId) -> bool {
        self.user_id == user_id && self.role_id == role_id
    }
}
