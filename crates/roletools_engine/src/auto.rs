//! Automatic roles for new members.

use crate::{GrantOptions, RoleEngine, wait_for_verification};
use roletools_core::{GuildId, MemberSnapshot, RoleId, RoleOutcome};
use roletools_error::RoletoolsResult;
use tracing::{debug, instrument};

/// Audit log reason for automatic roles.
pub const AUTO_REASON: &str = "Automatic Roles";

impl RoleEngine {
    /// Roles flagged as automatic in the guild.
    pub async fn auto_roles(&self, guild_id: GuildId) -> RoletoolsResult<Vec<RoleId>> {
        Ok(self
            .store()
            .settings(guild_id)
            .await?
            .into_iter()
            .filter(|setting| setting.auto)
            .map(|setting| setting.role_id)
            .collect())
    }

    /// Grant the automatic roles to a member who just joined.
    ///
    /// Waits out the guild verification period first, then grants through
    /// the normal rules without consulting cost. Bots and members who left
    /// while waiting get nothing.
    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn apply_auto_roles(
        &self,
        member: &MemberSnapshot,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        if member.bot {
            debug!("Skipping auto roles for bot");
            return Ok(Vec::new());
        }
        let roles = self.auto_roles(member.guild_id).await?;
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let guild = self.platform().guild(member.guild_id).await?;
        let waited = wait_for_verification(member, *guild.verification_level()).await;
        let member = if waited.is_zero() {
            member.clone()
        } else {
            match self.member(member.guild_id, member.user_id).await? {
                Some(member) => member,
                None => {
                    debug!("Member left during verification wait");
                    return Ok(Vec::new());
                }
            }
        };

        self.give_roles(&member, &roles, AUTO_REASON, GrantOptions::default())
            .await
    }

    /// Everything that happens when a member joins: sticky roles are
    /// restored, then automatic roles granted.
    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn on_member_join(&self, member: &MemberSnapshot) -> RoletoolsResult<Vec<RoleOutcome>> {
        let mut outcomes = self.restore_sticky_roles(member).await?;
        let mut current = member.clone();
        current.roles.extend(
            outcomes
                .iter()
                .filter(|outcome| outcome.is_change())
                .map(|outcome| outcome.role_id),
        );
        outcomes.extend(self.apply_auto_roles(&current).await?);
        Ok(outcomes)
    }
}
