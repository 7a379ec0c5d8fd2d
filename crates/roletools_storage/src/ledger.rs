//! Currency balances kept alongside the rest of the bot state.

use crate::{CachedSettingsStore, StateStore};
use async_trait::async_trait;
use derive_getters::Getters;
use roletools_core::{GuildId, UserId};
use roletools_error::{RoletoolsResult, SettingsError, SettingsErrorKind};
use roletools_interface::CurrencyLedger;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Largest balance allowed when nothing is configured.
pub const DEFAULT_MAX_BALANCE: u64 = i64::MAX as u64;

/// `[ledger]` section.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct LedgerConfig {
    /// Largest balance a member can hold, and so the largest role price.
    #[serde(default = "default_max_balance")]
    max_balance: u64,
}

fn default_max_balance() -> u64 {
    DEFAULT_MAX_BALANCE
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_balance: default_max_balance(),
        }
    }
}

#[async_trait]
impl CurrencyLedger for StateStore {
    async fn balance(&self, guild_id: GuildId, user_id: UserId) -> RoletoolsResult<u64> {
        let state = self.lock().await;
        Ok(state
            .guild(guild_id)
            .and_then(|guild| guild.balances.get(&user_id))
            .copied()
            .unwrap_or(0))
    }

    async fn max_balance(&self, _guild_id: GuildId) -> RoletoolsResult<u64> {
        Ok(self.max_balance)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, user_id = %user_id))]
    async fn withdraw(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        amount: u64,
    ) -> RoletoolsResult<u64> {
        let mut state = self.lock().await;
        let guild = state.guild_mut(guild_id);
        let balance = guild.balances.get(&user_id).copied().unwrap_or(0);
        let Some(remaining) = balance.checked_sub(amount) else {
            return Err(
                SettingsError::new(SettingsErrorKind::InsufficientBalance { balance, amount }).into(),
            );
        };
        guild.set_balance(user_id, remaining);
        self.commit(&mut state).await?;
        info!(amount, remaining, "Withdrew from balance");
        Ok(remaining)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, user_id = %user_id))]
    async fn set_balance(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        amount: u64,
    ) -> RoletoolsResult<u64> {
        if amount > self.max_balance {
            return Err(SettingsError::new(SettingsErrorKind::BalanceAboveMaximum {
                amount,
                max: self.max_balance,
            })
            .into());
        }
        let mut state = self.lock().await;
        state.guild_mut(guild_id).set_balance(user_id, amount);
        self.commit(&mut state).await?;
        info!(amount, "Balance set");
        Ok(amount)
    }
}

#[async_trait]
impl<S: CurrencyLedger> CurrencyLedger for CachedSettingsStore<S> {
    async fn balance(&self, guild_id: GuildId, user_id: UserId) -> RoletoolsResult<u64> {
        self.inner().balance(guild_id, user_id).await
    }

    async fn max_balance(&self, guild_id: GuildId) -> RoletoolsResult<u64> {
        self.inner().max_balance(guild_id).await
    }

    async fn withdraw(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        amount: u64,
    ) -> RoletoolsResult<u64> {
        self.inner().withdraw(guild_id, user_id, amount).await
    }

    async fn set_balance(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        amount: u64,
    ) -> RoletoolsResult<u64> {
        self.inner().set_balance(guild_id, user_id, amount).await
    }
}
