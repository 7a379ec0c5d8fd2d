//! Members adding and removing roles themselves.

use crate::{GrantOptions, RoleEngine, check_guild_verification};
use chrono::Utc;
use roletools_core::{MemberSnapshot, RoleId, RoleOutcome, RoleOutcomeKind};
use roletools_error::RoletoolsResult;
use tracing::{debug, instrument};

impl RoleEngine {
    /// Grant self-assignable roles to the member asking for them.
    ///
    /// Roles that are not self-assignable are refused. If the member is
    /// still inside the guild verification period every permitted role is
    /// reported as pending instead of waiting. Paid roles go through the
    /// cost gate.
    #[instrument(skip(self, member, roles), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn self_assign(
        &self,
        member: &MemberSnapshot,
        roles: &[RoleId],
        reason: &str,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        self.assign_permitted(member, roles, reason, GrantOptions::self_service())
            .await
    }

    /// Flag and verification checks shared by commands and components,
    /// followed by a grant under `options`.
    pub(crate) async fn assign_permitted(
        &self,
        member: &MemberSnapshot,
        roles: &[RoleId],
        reason: &str,
        options: GrantOptions,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        let mut outcomes = Vec::new();
        let mut permitted = Vec::new();
        for role_id in roles.iter().copied() {
            if self.store().setting(member.guild_id, role_id).await?.self_assignable {
                permitted.push(role_id);
            } else {
                outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::NotSelfAssignable));
            }
        }
        if permitted.is_empty() {
            return Ok(outcomes);
        }

        let guild = self.platform().guild(member.guild_id).await?;
        if let Some(wait) =
            check_guild_verification(member, *guild.verification_level(), Utc::now())
        {
            let wait_secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            debug!(wait_secs, "Member still in verification period");
            outcomes.extend(permitted.into_iter().map(|role_id| {
                RoleOutcome::new(role_id, RoleOutcomeKind::VerificationPending { wait_secs })
            }));
            return Ok(outcomes);
        }

        outcomes.extend(
            self.give_roles(member, &permitted, reason, options)
                .await?,
        );
        Ok(outcomes)
    }

    /// Revoke self-removable roles from the member asking.
    #[instrument(skip(self, member, roles), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn self_remove(
        &self,
        member: &MemberSnapshot,
        roles: &[RoleId],
        reason: &str,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        let mut outcomes = Vec::new();
        let mut permitted = Vec::new();
        for role_id in roles.iter().copied() {
            if self.store().setting(member.guild_id, role_id).await?.self_removable {
                permitted.push(role_id);
            } else {
                outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::NotSelfRemovable));
            }
        }
        if !permitted.is_empty() {
            outcomes.extend(self.remove_roles(member, &permitted, reason, true).await?);
        }
        Ok(outcomes)
    }
}
