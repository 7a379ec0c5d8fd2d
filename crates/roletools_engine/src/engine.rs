//! The rule engine handle shared by every entry point.

use crate::{CooldownTracker, EngineConfig};
use roletools_core::{GuildId, MemberSnapshot, RoleId, RoleOutcome, RoleOutcomeKind, UserId};
use roletools_error::{RoletoolsError, RoletoolsResult};
use roletools_interface::{CurrencyLedger, Platform, RoleStore};
use std::fmt;
use std::sync::Arc;

/// Role-assignment rule engine.
///
/// Cheap to clone; clones share the store, platform and ledger. All grant
/// and revoke paths in the crate are methods on this type, split across
/// modules by concern.
#[derive(Clone)]
pub struct RoleEngine {
    store: Arc<dyn RoleStore>,
    platform: Arc<dyn Platform>,
    ledger: Option<Arc<dyn CurrencyLedger>>,
    cooldowns: Arc<CooldownTracker>,
    config: EngineConfig,
}

impl fmt::Debug for RoleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleEngine")
            .field("has_ledger", &self.ledger.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RoleEngine {
    /// Engine without a currency ledger. Paid roles cannot be bought.
    pub fn new(
        store: Arc<dyn RoleStore>,
        platform: Arc<dyn Platform>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            platform,
            ledger: None,
            cooldowns: Arc::new(CooldownTracker::default()),
            config,
        }
    }

    /// Attach a currency ledger for the cost gate.
    pub fn with_ledger(mut self, ledger: Arc<dyn CurrencyLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Persisted state.
    pub fn store(&self) -> &Arc<dyn RoleStore> {
        &self.store
    }

    /// Chat platform access.
    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// Currency ledger, if configured.
    pub fn ledger(&self) -> Option<&Arc<dyn CurrencyLedger>> {
        self.ledger.as_ref()
    }

    /// Bulk operation cooldowns.
    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh snapshot of a member, or `None` if they left.
    pub async fn member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> RoletoolsResult<Option<MemberSnapshot>> {
        self.platform.member(guild_id, user_id).await
    }
}

/// Turn a mutation result into outcomes for `roles`.
///
/// Permission refusals become [`RoleOutcomeKind::Forbidden`]; any other
/// platform error is returned to the caller.
pub(crate) fn mutation_outcomes(
    result: RoletoolsResult<()>,
    roles: &[RoleId],
    success: RoleOutcomeKind,
) -> RoletoolsResult<Vec<RoleOutcome>> {
    match result {
        Ok(()) => Ok(roles
            .iter()
            .map(|role| RoleOutcome::new(*role, success.clone()))
            .collect()),
        Err(e) if is_forbidden(&e) => {
            tracing::warn!(roles = ?roles, error = %e, "Platform refused role change");
            Ok(roles
                .iter()
                .map(|role| RoleOutcome::new(*role, RoleOutcomeKind::Forbidden))
                .collect())
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn is_forbidden(error: &RoletoolsError) -> bool {
    error.as_gateway().is_some_and(|gateway| gateway.is_forbidden())
}
