//! Revoking roles and cascading inclusive roles.

use crate::RoleEngine;
use crate::engine::mutation_outcomes;
use roletools_core::{Assignability, MemberSnapshot, RoleId, RoleOutcome, RoleOutcomeKind};
use roletools_error::RoletoolsResult;
use tracing::{debug, info, instrument};

impl RoleEngine {
    /// Revoke `roles` from a member.
    ///
    /// With `check_inclusive`, the held self-removable inclusive roles of each
    /// revoked role are removed first in one call, then the role itself in a
    /// second call. Roles the member does not hold produce
    /// [`RoleOutcomeKind::NotHeld`] and no platform call.
    ///
    /// # Errors
    ///
    /// Returns an error when the store or the platform fails for a reason
    /// other than missing permissions.
    #[instrument(
        skip(self, member, roles),
        fields(
            guild_id = %member.guild_id,
            user_id = %member.user_id,
            roles = roles.len(),
        )
    )]
    pub async fn remove_roles(
        &self,
        member: &MemberSnapshot,
        roles: &[RoleId],
        reason: &str,
        check_inclusive: bool,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        let guild = self.platform().guild(member.guild_id).await?;
        let mut current = member.clone();
        let mut outcomes = Vec::new();

        for &role_id in roles {
            match guild.assignability(role_id) {
                Assignability::Missing => {
                    outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::RoleMissing));
                    continue;
                }
                Assignability::AboveCeiling => {
                    outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::AboveCeiling));
                    continue;
                }
                Assignability::Assignable => {}
            }
            if !current.has_role(role_id) {
                debug!(role_id = %role_id, "Member does not hold role");
                outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::NotHeld));
                continue;
            }

            if check_inclusive {
                let setting = self.store().setting(member.guild_id, role_id).await?;
                let mut cascade = Vec::new();
                for inclusive in setting.inclusive_with.iter().copied() {
                    if inclusive == role_id
                        || !current.has_role(inclusive)
                        || !guild.is_assignable(inclusive)
                        || roles.contains(&inclusive)
                    {
                        continue;
                    }
                    if self
                        .store()
                        .setting(member.guild_id, inclusive)
                        .await?
                        .self_removable
                    {
                        cascade.push(inclusive);
                    }
                }
                if !cascade.is_empty() {
                    let result = self
                        .platform()
                        .remove_roles(member.guild_id, member.user_id, &cascade, reason)
                        .await;
                    let revoked = mutation_outcomes(result, &cascade, RoleOutcomeKind::Revoked)?;
                    for outcome in revoked.iter().filter(|o| o.is_change()) {
                        current.roles.remove(&outcome.role_id);
                    }
                    outcomes.extend(revoked);
                }
            }

            let result = self
                .platform()
                .remove_roles(member.guild_id, member.user_id, &[role_id], reason)
                .await;
            let revoked = mutation_outcomes(result, &[role_id], RoleOutcomeKind::Revoked)?;
            if revoked.iter().all(|o| o.is_change()) {
                info!(role_id = %role_id, reason, "Revoked role");
                current.roles.remove(&role_id);
            }
            outcomes.extend(revoked);
        }

        Ok(outcomes)
    }
}
