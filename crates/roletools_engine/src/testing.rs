//! In-memory platform and ledger for exercising the engine without Discord.

use async_trait::async_trait;
use roletools_core::{GuildId, GuildSnapshot, MemberSnapshot, RoleId, UserId};
use roletools_error::{
    GatewayError, GatewayErrorKind, RoletoolsResult, SettingsError, SettingsErrorKind,
};
use roletools_interface::{CurrencyLedger, MembershipProvider, RoleMutationGateway};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A role mutation observed by [`FakePlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCall {
    /// `add_roles` call.
    Add {
        /// Target member
        user_id: UserId,
        /// Roles in the call
        roles: Vec<RoleId>,
        /// Audit log reason
        reason: String,
    },
    /// `remove_roles` call.
    Remove {
        /// Target member
        user_id: UserId,
        /// Roles in the call
        roles: Vec<RoleId>,
        /// Audit log reason
        reason: String,
    },
}

impl RoleCall {
    /// Roles carried by the call.
    pub fn roles(&self) -> &[RoleId] {
        match self {
            Self::Add { roles, .. } | Self::Remove { roles, .. } => roles,
        }
    }

    /// Whether this is an add call.
    pub fn is_add(&self) -> bool {
        matches!(self, Self::Add { .. })
    }
}

#[derive(Debug, Default)]
struct PlatformState {
    guilds: HashMap<GuildId, GuildSnapshot>,
    members: BTreeMap<(GuildId, UserId), MemberSnapshot>,
    forbidden: HashSet<RoleId>,
    calls: Vec<RoleCall>,
}

/// Platform double that applies role changes to stored members and records
/// every call.
#[derive(Debug, Default)]
pub struct FakePlatform {
    state: Mutex<PlatformState>,
}

impl FakePlatform {
    /// Empty platform.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a guild.
    pub fn with_guild(self, guild: GuildSnapshot) -> Self {
        self.put_guild(guild);
        self
    }

    /// Add or replace a member.
    pub fn with_member(self, member: MemberSnapshot) -> Self {
        self.put_member(member);
        self
    }

    /// Add or replace a guild in place.
    pub fn put_guild(&self, guild: GuildSnapshot) {
        self.lock().guilds.insert(*guild.guild_id(), guild);
    }

    /// Forget a guild, as if the bot was removed from it.
    pub fn remove_guild(&self, guild_id: GuildId) {
        self.lock().guilds.remove(&guild_id);
    }

    /// Add or replace a member in place.
    pub fn put_member(&self, member: MemberSnapshot) {
        self.lock()
            .members
            .insert((member.guild_id, member.user_id), member);
    }

    /// Remove a member, returning their last snapshot.
    pub fn remove_member(&self, guild_id: GuildId, user_id: UserId) -> Option<MemberSnapshot> {
        self.lock().members.remove(&(guild_id, user_id))
    }

    /// Current roles of a member.
    pub fn roles_of(&self, guild_id: GuildId, user_id: UserId) -> BTreeSet<RoleId> {
        self.lock()
            .members
            .get(&(guild_id, user_id))
            .map(|member| member.roles.clone())
            .unwrap_or_default()
    }

    /// Make every mutation touching `role_id` fail as forbidden.
    pub fn forbid_role(&self, role_id: RoleId) {
        self.lock().forbidden.insert(role_id);
    }

    /// Every mutation call so far.
    pub fn calls(&self) -> Vec<RoleCall> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn mutate(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        call: RoleCall,
        add: bool,
    ) -> RoletoolsResult<()> {
        let mut state = self.lock();
        if !state.guilds.contains_key(&guild_id) {
            return Err(GatewayError::new(GatewayErrorKind::GuildNotFound(guild_id.get())).into());
        }
        if let Some(role) = roles.iter().find(|role| state.forbidden.contains(*role)) {
            return Err(GatewayError::new(GatewayErrorKind::Forbidden(format!(
                "cannot manage role {role}"
            )))
            .into());
        }
        state.calls.push(call);
        let Some(member) = state.members.get_mut(&(guild_id, user_id)) else {
            return Err(GatewayError::new(GatewayErrorKind::Http(format!(
                "unknown member {user_id}"
            )))
            .into());
        };
        for role in roles {
            if add {
                member.roles.insert(*role);
            } else {
                member.roles.remove(role);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipProvider for FakePlatform {
    async fn guild(&self, guild_id: GuildId) -> RoletoolsResult<GuildSnapshot> {
        self.lock()
            .guilds
            .get(&guild_id)
            .cloned()
            .ok_or_else(|| GatewayError::new(GatewayErrorKind::GuildNotFound(guild_id.get())).into())
    }

    async fn member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> RoletoolsResult<Option<MemberSnapshot>> {
        Ok(self.lock().members.get(&(guild_id, user_id)).cloned())
    }

    async fn members(&self, guild_id: GuildId) -> RoletoolsResult<Vec<MemberSnapshot>> {
        Ok(self
            .lock()
            .members
            .values()
            .filter(|member| member.guild_id == guild_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RoleMutationGateway for FakePlatform {
    async fn add_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> RoletoolsResult<()> {
        let call = RoleCall::Add {
            user_id,
            roles: roles.to_vec(),
            reason: reason.to_string(),
        };
        self.mutate(guild_id, user_id, roles, call, true)
    }

    async fn remove_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> RoletoolsResult<()> {
        let call = RoleCall::Remove {
            user_id,
            roles: roles.to_vec(),
            reason: reason.to_string(),
        };
        self.mutate(guild_id, user_id, roles, call, false)
    }
}

/// Ledger double with fixed balances.
#[derive(Debug)]
pub struct FakeLedger {
    balances: Mutex<HashMap<(GuildId, UserId), u64>>,
    max_balance: u64,
}

impl FakeLedger {
    /// Ledger where nobody can hold more than `max_balance`.
    pub fn new(max_balance: u64) -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            max_balance,
        }
    }

    /// Set a member's balance.
    pub fn with_balance(self, guild_id: GuildId, user_id: UserId, balance: u64) -> Self {
        self.lock().insert((guild_id, user_id), balance);
        self
    }

    /// Current balance of a member.
    pub fn balance_of(&self, guild_id: GuildId, user_id: UserId) -> u64 {
        self.lock().get(&(guild_id, user_id)).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(GuildId, UserId), u64>> {
        self.balances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CurrencyLedger for FakeLedger {
    async fn balance(&self, guild_id: GuildId, user_id: UserId) -> RoletoolsResult<u64> {
        Ok(self.balance_of(guild_id, user_id))
    }

    async fn max_balance(&self, _guild_id: GuildId) -> RoletoolsResult<u64> {
        Ok(self.max_balance)
    }

    async fn withdraw(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        amount: u64,
    ) -> RoletoolsResult<u64> {
        let mut balances = self.lock();
        let balance = balances.entry((guild_id, user_id)).or_insert(0);
        if *balance < amount {
            return Err(SettingsError::new(SettingsErrorKind::InsufficientBalance {
                balance: *balance,
                amount,
            })
            .into());
        }
        *balance -= amount;
        Ok(*balance)
    }

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
        self.lock().insert((guild_id, user_id), amount);
        Ok(amount)
    }
}
