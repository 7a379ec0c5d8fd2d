//! Admin operations that touch many members at once.

use crate::{GrantOptions, RoleEngine};
use futures::stream::{self, StreamExt};
use roletools_core::{
    GuildId, MemberSnapshot, RoleId, RoleOutcome, RoleOutcomeKind, UserId,
};
use roletools_error::{CommandError, CommandErrorKind, RoletoolsResult};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};

/// Who a bulk operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkTarget {
    /// One member.
    Member(UserId),
    /// Every member holding a role.
    RoleHolders(RoleId),
    /// Every member.
    Everyone,
    /// Every member that is not a bot.
    Humans,
    /// Every bot.
    Bots,
}

impl BulkTarget {
    fn matches(&self, member: &MemberSnapshot) -> bool {
        match self {
            Self::Member(user_id) => member.user_id == *user_id,
            Self::RoleHolders(role_id) => member.has_role(*role_id),
            Self::Everyone => true,
            Self::Humans => !member.bot,
            Self::Bots => member.bot,
        }
    }
}

/// Per-guild cooldown after bulk operations.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    until: Mutex<HashMap<GuildId, Instant>>,
}

impl CooldownTracker {
    /// Time left on the guild's cooldown.
    pub async fn remaining(&self, guild_id: GuildId) -> Option<Duration> {
        let until = self.until.lock().await;
        until
            .get(&guild_id)
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }

    /// Start a cooldown unless one is already running.
    ///
    /// Returns the time left on the running cooldown on refusal.
    pub async fn begin(&self, guild_id: GuildId, cooldown: Duration) -> Result<(), Duration> {
        let mut until = self.until.lock().await;
        let now = Instant::now();
        if let Some(deadline) = until.get(&guild_id)
            && *deadline > now
        {
            return Err(*deadline - now);
        }
        until.insert(guild_id, now + cooldown);
        Ok(())
    }
}

/// Per-member results of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    /// Role the operation applied.
    pub role_id: RoleId,
    /// Outcomes per member processed.
    pub outcomes: Vec<(UserId, Vec<RoleOutcome>)>,
    /// Requested users who are not in the guild.
    pub absent: Vec<UserId>,
    /// Members whose processing failed, with the error text.
    pub failures: Vec<(UserId, String)>,
}

impl BulkReport {
    fn new(role_id: RoleId) -> Self {
        Self {
            role_id,
            outcomes: Vec::new(),
            absent: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Members whose outcome for the operation's role is `kind`.
    pub fn count(&self, kind: &RoleOutcomeKind) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcomes)| {
                outcomes
                    .iter()
                    .any(|outcome| outcome.role_id == self.role_id && outcome.kind == *kind)
            })
            .count()
    }

    /// Members the role was actually added to or removed from.
    pub fn changed(&self) -> usize {
        self.count(&RoleOutcomeKind::Granted) + self.count(&RoleOutcomeKind::Revoked)
    }

    /// One-paragraph summary for a command reply.
    pub fn summary(&self) -> String {
        let role = self.role_id.mention();
        let mut lines = vec![format!(
            "Changed {role} for {} of {} members.",
            self.changed(),
            self.outcomes.len()
        )];
        let saved = self.count(&RoleOutcomeKind::SavedForRejoin);
        if saved > 0 {
            lines.push(format!("{saved} members will get {role} when they rejoin."));
        }
        if !self.absent.is_empty() {
            lines.push(format!("{} users are not in this server.", self.absent.len()));
        }
        if !self.failures.is_empty() {
            lines.push(format!("{} members failed.", self.failures.len()));
        }
        lines.join("\n")
    }
}

impl RoleEngine {
    /// Members selected by `targets`, one entry per member.
    pub async fn resolve_targets(
        &self,
        guild_id: GuildId,
        targets: &[BulkTarget],
    ) -> RoletoolsResult<Vec<MemberSnapshot>> {
        let mut selected: BTreeMap<UserId, MemberSnapshot> = BTreeMap::new();
        let needs_all = targets
            .iter()
            .any(|target| !matches!(target, BulkTarget::Member(_)));
        if needs_all {
            for member in self.platform().members(guild_id).await? {
                if targets.iter().any(|target| target.matches(&member)) {
                    selected.insert(member.user_id, member);
                }
            }
        }
        for target in targets {
            if let BulkTarget::Member(user_id) = target
                && !selected.contains_key(user_id)
                && let Some(member) = self.member(guild_id, *user_id).await?
            {
                selected.insert(member.user_id, member);
            }
        }
        Ok(selected.into_values().collect())
    }

    /// Grant a role to many members under the normal rules.
    ///
    /// # Errors
    ///
    /// Refused while the guild is cooling down from an earlier bulk
    /// operation, or when the bot cannot manage the role.
    #[instrument(skip(self, targets), fields(targets = ?targets))]
    pub async fn bulk_give(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        targets: &[BulkTarget],
        reason: &str,
    ) -> RoletoolsResult<BulkReport> {
        self.bulk_apply(guild_id, role_id, targets, reason, true).await
    }

    /// Revoke a role from many members under the normal rules.
    #[instrument(skip(self, targets), fields(targets = ?targets))]
    pub async fn bulk_remove(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        targets: &[BulkTarget],
        reason: &str,
    ) -> RoletoolsResult<BulkReport> {
        self.bulk_apply(guild_id, role_id, targets, reason, false).await
    }

    async fn bulk_apply(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        targets: &[BulkTarget],
        reason: &str,
        give: bool,
    ) -> RoletoolsResult<BulkReport> {
        if let Some(left) = self.cooldowns().remaining(guild_id).await {
            return Err(CommandError::new(CommandErrorKind::Cooldown(left.as_secs().max(1))).into());
        }
        self.ensure_manageable(guild_id, role_id).await?;

        let members: Vec<MemberSnapshot> = self
            .resolve_targets(guild_id, targets)
            .await?
            .into_iter()
            .filter(|member| member.has_role(role_id) != give)
            .collect();

        let cooldown = self.config().bulk_cooldown(members.len());
        if let Err(left) = self.cooldowns().begin(guild_id, cooldown).await {
            return Err(CommandError::new(CommandErrorKind::Cooldown(left.as_secs().max(1))).into());
        }
        info!(
            members = members.len(),
            cooldown_secs = cooldown.as_secs(),
            give,
            "Starting bulk role operation"
        );

        let concurrency = (*self.config().bulk_concurrency()).max(1);
        let results: Vec<(UserId, RoletoolsResult<Vec<RoleOutcome>>)> = stream::iter(members)
            .map(|member| async move {
                let result = if give {
                    self.give_roles(&member, &[role_id], reason, GrantOptions::default())
                        .await
                } else {
                    self.remove_roles(&member, &[role_id], reason, true).await
                };
                (member.user_id, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = BulkReport::new(role_id);
        for (user_id, result) in results {
            match result {
                Ok(outcomes) => report.outcomes.push((user_id, outcomes)),
                Err(e) => {
                    error!(user_id = %user_id, error = %e, "Bulk role change failed for member");
                    report.failures.push((user_id, e.to_string()));
                }
            }
        }
        report.outcomes.sort_by_key(|(user_id, _)| *user_id);
        info!(changed = report.changed(), failures = report.failures.len(), "Bulk role operation finished");
        Ok(report)
    }

    /// Add a role directly, skipping every rule.
    ///
    /// Users who are not in the guild get the role recorded as sticky so it
    /// is applied on rejoin, provided the role is sticky.
    #[instrument(skip(self, users), fields(users = users.len()))]
    pub async fn force_add(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        users: &[UserId],
        reason: &str,
    ) -> RoletoolsResult<BulkReport> {
        self.ensure_manageable(guild_id, role_id).await?;
        let sticky = self.store().setting(guild_id, role_id).await?.sticky;
        let mut report = BulkReport::new(role_id);
        for user_id in users.iter().copied() {
            match self.member(guild_id, user_id).await? {
                Some(member) => {
                    let outcomes = self
                        .give_roles(&member, &[role_id], reason, GrantOptions::unchecked())
                        .await?;
                    report.outcomes.push((user_id, outcomes));
                }
                None if sticky => {
                    self.store()
                        .add_sticky_role(guild_id, user_id, role_id)
                        .await?;
                    debug!(user_id = %user_id, "Saved sticky role for absent user");
                    report.outcomes.push((
                        user_id,
                        vec![RoleOutcome::new(role_id, RoleOutcomeKind::SavedForRejoin)],
                    ));
                }
                None => report.absent.push(user_id),
            }
        }
        info!(changed = report.changed(), "Force-added role");
        Ok(report)
    }

    /// Remove a role directly, skipping every rule, and forget it as sticky.
    #[instrument(skip(self, users), fields(users = users.len()))]
    pub async fn force_remove(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        users: &[UserId],
        reason: &str,
    ) -> RoletoolsResult<BulkReport> {
        self.ensure_manageable(guild_id, role_id).await?;
        let mut report = BulkReport::new(role_id);
        for user_id in users.iter().copied() {
            self.store()
                .remove_sticky_role(guild_id, user_id, role_id)
                .await?;
            match self.member(guild_id, user_id).await? {
                Some(member) => {
                    let outcomes = self.remove_roles(&member, &[role_id], reason, false).await?;
                    report.outcomes.push((user_id, outcomes));
                }
                None => report.absent.push(user_id),
            }
        }
        info!(changed = report.changed(), "Force-removed role");
        Ok(report)
    }

    async fn ensure_manageable(&self, guild_id: GuildId, role_id: RoleId) -> RoletoolsResult<()> {
        let guild = self.platform().guild(guild_id).await?;
        if guild.is_assignable(role_id) {
            return Ok(());
        }
        let outcome = if guild.role_exists(role_id) {
            RoleOutcome::new(role_id, RoleOutcomeKind::AboveCeiling)
        } else {
            RoleOutcome::new(role_id, RoleOutcomeKind::RoleMissing)
        };
        Err(CommandError::new(CommandErrorKind::Rejected(outcome.to_string())).into())
    }
}
