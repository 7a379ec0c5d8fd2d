//! Virtual currency price checks for self-service grants.

use crate::RoleEngine;
use roletools_core::{GuildId, MemberSnapshot, RoleId, RoleOutcomeKind, UserId};
use roletools_error::{
    CommandError, CommandErrorKind, RoletoolsResult, SettingsError, SettingsErrorKind,
};
use roletools_interface::CurrencyLedger;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

impl RoleEngine {
    /// Check that the member can pay `cost` on top of `committed`.
    ///
    /// `committed` is what earlier roles in the same request already
    /// reserved. Returns the rejection, or `None` when the member can pay.
    /// Without a ledger every balance reads as zero.
    pub(crate) async fn check_cost(
        &self,
        member: &MemberSnapshot,
        cost: u64,
        committed: u64,
    ) -> RoletoolsResult<Option<RoleOutcomeKind>> {
        if cost == 0 {
            return Ok(None);
        }
        let balance = match self.ledger() {
            Some(ledger) => ledger.balance(member.guild_id, member.user_id).await?,
            None => 0,
        };
        let available = balance.saturating_sub(committed);
        debug!(
            user_id = %member.user_id,
            cost,
            balance,
            committed,
            "Checking role cost"
        );
        if available < cost {
            return Ok(Some(RoleOutcomeKind::InsufficientFunds {
                cost,
                balance: available,
            }));
        }
        Ok(None)
    }

    /// Debit the price of granted roles.
    ///
    /// The roles are already granted, so a failed debit is logged rather
    /// than returned.
    #[instrument(skip(self, member, charges), fields(user_id = %member.user_id))]
    pub(crate) async fn debit(&self, member: &MemberSnapshot, charges: &[(RoleId, u64)]) {
        if !*self.config().charge_on_grant() {
            return;
        }
        let Some(ledger) = self.ledger() else {
            return;
        };
        for (role_id, cost) in charges.iter().filter(|(_, cost)| *cost > 0) {
            match ledger.withdraw(member.guild_id, member.user_id, *cost).await {
                Ok(balance) => info!(role_id = %role_id, cost, balance, "Charged for role"),
                Err(e) => error!(role_id = %role_id, cost, error = %e, "Failed to charge for role"),
            }
        }
    }

    /// Reject a price no member could ever pay.
    pub(crate) async fn validate_cost(&self, guild_id: GuildId, cost: u64) -> RoletoolsResult<()> {
        if cost == 0 {
            return Ok(());
        }
        let max = match self.ledger() {
            Some(ledger) => ledger.max_balance(guild_id).await?,
            None => 0,
        };
        if cost > max {
            return Err(SettingsError::new(SettingsErrorKind::CostAboveMaximum { cost, max }).into());
        }
        Ok(())
    }

    /// A member's currency balance.
    ///
    /// # Errors
    ///
    /// Fails when no ledger is configured or the ledger fails.
    pub async fn balance(&self, guild_id: GuildId, user_id: UserId) -> RoletoolsResult<u64> {
        self.require_ledger()?.balance(guild_id, user_id).await
    }

    /// Overwrite a member's currency balance.
    ///
    /// # Errors
    ///
    /// Fails when no ledger is configured or `amount` is above the guild
    /// maximum.
    #[instrument(skip(self))]
    pub async fn set_balance(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        amount: u64,
    ) -> RoletoolsResult<u64> {
        self.require_ledger()?
            .set_balance(guild_id, user_id, amount)
            .await
    }

    fn require_ledger(&self) -> RoletoolsResult<&Arc<dyn CurrencyLedger>> {
        self.ledger().ok_or_else(|| {
            CommandError::new(CommandErrorKind::Rejected(
                "No currency ledger is configured.".to_string(),
            ))
            .into()
        })
    }
}
