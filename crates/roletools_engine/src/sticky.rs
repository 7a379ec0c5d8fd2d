//! Sticky roles: remembered on leave, restored on rejoin.

use crate::RoleEngine;
use crate::engine::mutation_outcomes;
use roletools_core::{Assignability, MemberSnapshot, RoleId, RoleOutcome, RoleOutcomeKind};
use roletools_error::RoletoolsResult;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

/// Audit log reason for restored roles.
pub const STICKY_REASON: &str = "Sticky Roles";

impl RoleEngine {
    /// Remember the sticky roles a departing member holds.
    ///
    /// Returns the roles newly recorded.
    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn on_member_leave(&self, member: &MemberSnapshot) -> RoletoolsResult<Vec<RoleId>> {
        let mut recorded = Vec::new();
        for role_id in member.roles.iter().copied() {
            if !self.store().setting(member.guild_id, role_id).await?.sticky {
                continue;
            }
            if self
                .store()
                .add_sticky_role(member.guild_id, member.user_id, role_id)
                .await?
            {
                recorded.push(role_id);
            }
        }
        if !recorded.is_empty() {
            info!(roles = ?recorded, "Recorded sticky roles");
        }
        Ok(recorded)
    }

    /// Give a rejoining member their sticky roles back.
    ///
    /// Restored roles skip every relationship check and are added in one
    /// call. Entries for deleted roles are pruned; entries for roles the bot
    /// can no longer manage are kept for a later rejoin.
    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn restore_sticky_roles(
        &self,
        member: &MemberSnapshot,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        let stored = self
            .store()
            .sticky_roles(member.guild_id, member.user_id)
            .await?;
        if stored.is_empty() {
            return Ok(Vec::new());
        }

        let guild = self.platform().guild(member.guild_id).await?;
        let mut outcomes = Vec::new();
        let mut restore = Vec::new();
        for role_id in stored {
            match guild.assignability(role_id) {
                Assignability::Missing => {
                    debug!(role_id = %role_id, "Pruning deleted sticky role");
                    self.store()
                        .remove_sticky_role(member.guild_id, member.user_id, role_id)
                        .await?;
                    outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::RoleMissing));
                }
                Assignability::AboveCeiling => {
                    warn!(role_id = %role_id, "Sticky role above bot ceiling, keeping for later");
                    outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::AboveCeiling));
                }
                Assignability::Assignable if member.has_role(role_id) => {
                    self.store()
                        .remove_sticky_role(member.guild_id, member.user_id, role_id)
                        .await?;
                    outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::AlreadyHeld));
                }
                Assignability::Assignable => restore.push(role_id),
            }
        }

        if !restore.is_empty() {
            let result = self
                .platform()
                .add_roles(member.guild_id, member.user_id, &restore, STICKY_REASON)
                .await;
            let granted = mutation_outcomes(result, &restore, RoleOutcomeKind::Granted)?;
            for outcome in granted.iter().filter(|o| o.is_change()) {
                self.store()
                    .remove_sticky_role(member.guild_id, member.user_id, outcome.role_id)
                    .await?;
            }
            info!(roles = ?restore, "Restored sticky roles");
            outcomes.extend(granted);
        }
        Ok(outcomes)
    }

    /// Keep sticky state in step with role changes of a present member.
    #[instrument(skip(self, before, after), fields(guild_id = %after.guild_id, user_id = %after.user_id))]
    pub async fn on_member_update(
        &self,
        before: &BTreeSet<RoleId>,
        after: &MemberSnapshot,
    ) -> RoletoolsResult<()> {
        for added in after.roles.difference(before).copied() {
            if self.store().setting(after.guild_id, added).await?.sticky {
                self.store()
                    .add_sticky_role(after.guild_id, after.user_id, added)
                    .await?;
            }
        }
        for removed in before.difference(&after.roles).copied() {
            if self.store().setting(after.guild_id, removed).await?.sticky {
                self.store()
                    .remove_sticky_role(after.guild_id, after.user_id, removed)
                    .await?;
            }
        }
        Ok(())
    }
}
