//! Granting roles under required, exclusive, inclusive and cost rules.

use crate::RoleEngine;
use crate::engine::mutation_outcomes;
use chrono::Utc;
use roletools_core::{
    Assignability, GuildSnapshot, MemberSnapshot, RoleId, RoleOutcome, RoleOutcomeKind,
    RoleSetting, TemporaryRoleRecord,
};
use roletools_error::RoletoolsResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Which rules a grant enforces.
///
/// The default suits admin and automatic grants: every relationship rule
/// applies, temporary roles are tracked and cost is ignored. Self-service
/// paths use [`GrantOptions::self_service`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct GrantOptions {
    /// Refuse roles whose required roles are not all held.
    pub check_required: bool,
    /// Remove held exclusive roles, or veto the grant when they cannot be.
    pub check_exclusive: bool,
    /// Grant inclusive roles alongside.
    pub check_inclusive: bool,
    /// Enforce the role price.
    pub check_cost: bool,
    /// Record temporary roles for later expiry.
    pub track_temporary: bool,
}

impl Default for GrantOptions {
    fn default() -> Self {
        Self {
            check_required: true,
            check_exclusive: true,
            check_inclusive: true,
            check_cost: false,
            track_temporary: true,
        }
    }
}

impl GrantOptions {
    /// Options for a member acquiring a role themselves.
    pub fn self_service() -> Self {
        Self {
            check_cost: true,
            ..Self::default()
        }
    }

    /// Options that skip every relationship rule.
    pub fn unchecked() -> Self {
        Self {
            check_required: false,
            check_exclusive: false,
            check_inclusive: false,
            check_cost: false,
            track_temporary: true,
        }
    }
}

impl RoleEngine {
    /// Grant `roles` to a member.
    ///
    /// Roles are evaluated in order. Each role is checked for required roles
    /// and price, then its inclusive roles are added in one call. Held
    /// exclusive roles are checked next: a held role that is not
    /// self-removable vetoes the grant, leaving the inclusive roles in place
    /// and revoking nothing. Otherwise the held exclusive roles are revoked
    /// and the role joins the final add batch carrying `reason`.
    ///
    /// # Errors
    ///
    /// Returns an error when the store or the platform fails for a reason
    /// other than missing permissions.
    #[instrument(
        skip(self, member, roles, options),
        fields(
            guild_id = %member.guild_id,
            user_id = %member.user_id,
            roles = roles.len(),
        )
    )]
    pub async fn give_roles(
        &self,
        member: &MemberSnapshot,
        roles: &[RoleId],
        reason: &str,
        options: GrantOptions,
    ) -> RoletoolsResult<Vec<RoleOutcome>> {
        let guild = self.platform().guild(member.guild_id).await?;
        let mut current = member.clone();
        let mut outcomes = Vec::new();
        let mut to_add: Vec<RoleId> = Vec::new();
        let mut charges: Vec<(RoleId, u64)> = Vec::new();
        let mut committed = 0u64;
        let mut seen: Vec<RoleId> = Vec::with_capacity(roles.len());

        for &role_id in roles {
            if seen.contains(&role_id) {
                outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::Duplicate));
                continue;
            }
            seen.push(role_id);

            match guild.assignability(role_id) {
                Assignability::Missing => {
                    debug!(role_id = %role_id, "Role no longer exists");
                    outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::RoleMissing));
                    continue;
                }
                Assignability::AboveCeiling => {
                    debug!(role_id = %role_id, "Role above bot ceiling");
                    outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::AboveCeiling));
                    continue;
                }
                Assignability::Assignable => {}
            }

            let setting = self.store().setting(member.guild_id, role_id).await?;

            if options.check_required {
                let missing: Vec<RoleId> = setting
                    .required
                    .iter()
                    .copied()
                    .filter(|required| !current.has_role(*required))
                    .collect();
                if !missing.is_empty() {
                    debug!(role_id = %role_id, missing = ?missing, "Missing required roles");
                    outcomes.push(RoleOutcome::new(
                        role_id,
                        RoleOutcomeKind::MissingRequired { missing },
                    ));
                    continue;
                }
            }

            let already_held = current.has_role(role_id);
            let priced = options.check_cost && !already_held;
            if priced
                && let Some(rejection) = self.check_cost(&current, setting.cost, committed).await?
            {
                outcomes.push(RoleOutcome::new(role_id, rejection));
                continue;
            }

            if options.check_inclusive {
                let inclusive = self.grantable_inclusive(&current, &guild, &setting).await?;
                if !inclusive.is_empty() {
                    let result = self
                        .platform()
                        .add_roles(member.guild_id, member.user_id, &inclusive, reason)
                        .await;
                    let granted =
                        mutation_outcomes(result, &inclusive, RoleOutcomeKind::Granted)?;
                    self.apply_outcomes(&mut current, &granted, options).await?;
                    outcomes.extend(granted);
                }
            }

            let mut exclusive_held = Vec::new();
            if options.check_exclusive {
                let mut blocking = Vec::new();
                for exclusive in setting.exclusive_to.iter().copied() {
                    if !current.has_role(exclusive) {
                        continue;
                    }
                    let removable = guild.is_assignable(exclusive)
                        && self
                            .store()
                            .setting(member.guild_id, exclusive)
                            .await?
                            .self_removable;
                    if removable {
                        exclusive_held.push(exclusive);
                    } else {
                        blocking.push(exclusive);
                    }
                }
                // Inclusive roles already granted for this role stay.
                if !blocking.is_empty() {
                    debug!(role_id = %role_id, blocking = ?blocking, "Exclusive role veto");
                    outcomes.push(RoleOutcome::new(
                        role_id,
                        RoleOutcomeKind::ExclusiveVeto { blocking },
                    ));
                    continue;
                }
            }

            if priced {
                committed = committed.saturating_add(setting.cost);
            }

            if !exclusive_held.is_empty() {
                let revoked = self
                    .remove_roles(&current, &exclusive_held, reason, options.check_inclusive)
                    .await?;
                self.apply_outcomes(&mut current, &revoked, options).await?;
                outcomes.extend(revoked);
            }

            if already_held {
                outcomes.push(RoleOutcome::new(role_id, RoleOutcomeKind::AlreadyHeld));
                continue;
            }
            if options.check_cost {
                charges.push((role_id, setting.cost));
            }
            to_add.push(role_id);
        }

        if !to_add.is_empty() {
            let result = self
                .platform()
                .add_roles(member.guild_id, member.user_id, &to_add, reason)
                .await;
            let granted = mutation_outcomes(result, &to_add, RoleOutcomeKind::Granted)?;
            if granted.iter().all(|outcome| outcome.is_change()) {
                info!(roles = ?to_add, reason, "Granted roles");
                self.debit(&current, &charges).await;
            }
            self.apply_outcomes(&mut current, &granted, options).await?;
            outcomes.extend(granted);
        }

        Ok(outcomes)
    }

    /// Inclusive roles of `setting` that can and should be added.
    async fn grantable_inclusive(
        &self,
        member: &MemberSnapshot,
        guild: &GuildSnapshot,
        setting: &RoleSetting,
    ) -> RoletoolsResult<Vec<RoleId>> {
        let mut grantable = Vec::new();
        for inclusive in setting.inclusive_with.iter().copied() {
            if member.has_role(inclusive) || grantable.contains(&inclusive) {
                continue;
            }
            if !guild.is_assignable(inclusive) {
                debug!(role_id = %inclusive, "Skipping unassignable inclusive role");
                continue;
            }
            if self
                .store()
                .setting(member.guild_id, inclusive)
                .await?
                .self_assignable
            {
                grantable.push(inclusive);
            }
        }
        Ok(grantable)
    }

    /// Fold mutation outcomes into the working member and track temporary
    /// grants.
    async fn apply_outcomes(
        &self,
        current: &mut MemberSnapshot,
        outcomes: &[RoleOutcome],
        options: GrantOptions,
    ) -> RoletoolsResult<()> {
        for outcome in outcomes {
            match outcome.kind {
                RoleOutcomeKind::Granted => {
                    current.roles.insert(outcome.role_id);
                    if options.track_temporary {
                        self.track_temporary(current, outcome.role_id).await?;
                    }
                }
                RoleOutcomeKind::Revoked => {
                    current.roles.remove(&outcome.role_id);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Schedule expiry of a just-granted role if it has a duration.
    pub(crate) async fn track_temporary(
        &self,
        member: &MemberSnapshot,
        role_id: RoleId,
    ) -> RoletoolsResult<()> {
        let setting = self.store().setting(member.guild_id, role_id).await?;
        let Some(seconds) = setting.duration else {
            return Ok(());
        };
        let Some(duration) = i64::try_from(seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
        else {
            warn!(role_id = %role_id, seconds, "Temporary duration out of range");
            return Ok(());
        };
        let record =
            TemporaryRoleRecord::new(member.guild_id, member.user_id, role_id, Utc::now(), duration);
        info!(
            role_id = %role_id,
            user_id = %member.user_id,
            remove_at = %record.remove_at,
            "Tracking temporary role"
        );
        self.store().add_temporary(record).await
    }
}
