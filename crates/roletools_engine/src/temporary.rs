//! Expiry of temporarily granted roles.

use crate::RoleEngine;
use chrono::{DateTime, Utc};
use roletools_core::{GuildId, TemporaryRoleRecord};
use roletools_error::{GatewayErrorKind, RoletoolsError, RoletoolsResult};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Audit log reason for expired roles.
pub const EXPIRY_REASON: &str = "Temporary role expired";

/// A removal waiting for its deadline.
#[derive(Debug)]
pub struct ArmedRemoval {
    /// The popped record.
    pub record: TemporaryRoleRecord,
    /// Task that sleeps until `record.remove_at` and then revokes.
    pub handle: JoinHandle<()>,
}

/// Result of one sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Records dropped because the member, role or grant is gone.
    pub abandoned: Vec<TemporaryRoleRecord>,
    /// Records popped and armed.
    pub armed: Vec<ArmedRemoval>,
}

impl SweepReport {
    /// Wait for every armed removal to finish.
    pub async fn join_armed(self) {
        for armed in self.armed {
            if let Err(e) = armed.handle.await {
                error!(error = %e, "Armed removal task failed");
            }
        }
    }
}

/// Periodically arms removals for temporary roles that are about to expire.
///
/// Records live in the store until they are either abandoned or popped and
/// armed. An armed removal is a detached task and is lost if the process
/// stops before it fires.
#[derive(Debug, Clone)]
pub struct TemporaryRoleScheduler {
    engine: RoleEngine,
}

impl TemporaryRoleScheduler {
    /// Scheduler driving `engine`.
    pub fn new(engine: RoleEngine) -> Self {
        Self { engine }
    }

    /// Run one sweep over every guild with pending records.
    #[instrument(skip(self), fields(now = %now))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> RoletoolsResult<SweepReport> {
        let mut report = SweepReport::default();
        for guild_id in self.engine.store().guilds_with_temporary().await? {
            if let Err(e) = self.sweep_guild(guild_id, now, &mut report).await {
                error!(guild_id = %guild_id, error = %e, "Temporary role sweep failed for guild");
            }
        }
        if !report.abandoned.is_empty() || !report.armed.is_empty() {
            info!(
                abandoned = report.abandoned.len(),
                armed = report.armed.len(),
                "Temporary role sweep finished"
            );
        }
        Ok(report)
    }

    async fn sweep_guild(
        &self,
        guild_id: GuildId,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) -> RoletoolsResult<()> {
        let store = self.engine.store();
        let records = store.temporary_records(guild_id).await?;
        let guild = match self.engine.platform().guild(guild_id).await {
            Ok(guild) => guild,
            Err(e) if is_guild_gone(&e) => {
                warn!(guild_id = %guild_id, "Guild gone, abandoning its temporary roles");
                for record in records {
                    store
                        .remove_temporary(guild_id, record.user_id, record.role_id)
                        .await?;
                    report.abandoned.push(record);
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let window = self.engine.config().arm_window();

        for record in records {
            let member = self.engine.member(guild_id, record.user_id).await?;
            let holds_role = guild.role_exists(record.role_id)
                && member.is_some_and(|member| member.has_role(record.role_id));
            if !holds_role {
                debug!(
                    user_id = %record.user_id,
                    role_id = %record.role_id,
                    "Abandoning temporary role record"
                );
                store
                    .remove_temporary(guild_id, record.user_id, record.role_id)
                    .await?;
                report.abandoned.push(record);
                continue;
            }
            if !record.is_due_within(now, window) {
                continue;
            }
            if let Some(record) = store
                .remove_temporary(guild_id, record.user_id, record.role_id)
                .await?
            {
                report.armed.push(self.arm(record, now));
            }
        }
        Ok(())
    }

    /// Spawn a task that revokes the role at `record.remove_at`.
    pub fn arm(&self, record: TemporaryRoleRecord, now: DateTime<Utc>) -> ArmedRemoval {
        let delay = (record.remove_at - now).to_std().unwrap_or_default();
        debug!(
            user_id = %record.user_id,
            role_id = %record.role_id,
            delay_secs = delay.as_secs(),
            "Arming temporary role removal"
        );
        let engine = self.engine.clone();
        let task_record = record.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = expire(&engine, &task_record).await {
                error!(
                    user_id = %task_record.user_id,
                    role_id = %task_record.role_id,
                    error = %e,
                    "Failed to remove expired role"
                );
            }
        });
        ArmedRemoval { record, handle }
    }

    /// Sweep on the configured interval until the task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        let interval = self.engine.config().sweep_interval();
        info!(interval_secs = interval.as_secs(), "Starting temporary role scheduler");
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;
                if let Err(e) = self.sweep(Utc::now()).await {
                    error!(error = %e, "Temporary role sweep failed");
                }
            }
        })
    }
}

fn is_guild_gone(error: &RoletoolsError) -> bool {
    error
        .as_gateway()
        .is_some_and(|gateway| matches!(gateway.kind(), GatewayErrorKind::GuildNotFound(_)))
}

async fn expire(engine: &RoleEngine, record: &TemporaryRoleRecord) -> RoletoolsResult<()> {
    let Some(member) = engine.member(record.guild_id, record.user_id).await? else {
        warn!(user_id = %record.user_id, "Member left before temporary role expired");
        return Ok(());
    };
    if !member.has_role(record.role_id) {
        debug!(role_id = %record.role_id, "Temporary role already removed");
        return Ok(());
    }
    let outcomes = engine
        .remove_roles(&member, &[record.role_id], EXPIRY_REASON, true)
        .await?;
    info!(
        user_id = %record.user_id,
        role_id = %record.role_id,
        outcomes = ?outcomes,
        "Temporary role expired"
    );
    Ok(())
}
