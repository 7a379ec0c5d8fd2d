//! Trait definitions for the rule engine's external collaborators.

use async_trait::async_trait;
use roletools_core::{
    ComponentBinding, GuildId, GuildSnapshot, MemberSnapshot, MessageId, ReactionBinding,
    RoleId, RoleSetting, TemporaryRoleRecord, UserId,
};
use roletools_error::RoletoolsResult;

/// Mutation applied to a role setting under the store's lock.
///
/// Returning an error aborts the write and leaves the stored setting
/// untouched.
pub type SettingUpdate = Box<dyn FnOnce(&mut RoleSetting) -> RoletoolsResult<()> + Send>;

/// Persisted per-guild, per-role configuration.
///
/// Implementations must apply [`RoleSettingsStore::update_setting`]
/// atomically: two concurrent updates to the same role must both land.
#[async_trait]
pub trait RoleSettingsStore: Send + Sync {
    /// Setting for a role, or the default setting if none is stored.
    async fn setting(&self, guild_id: GuildId, role_id: RoleId) -> RoletoolsResult<RoleSetting>;

    /// Every stored setting in the guild.
    async fn settings(&self, guild_id: GuildId) -> RoletoolsResult<Vec<RoleSetting>>;

    /// Read-modify-write a setting, creating it with defaults if needed.
    ///
    /// Returns the setting as written.
    async fn update_setting(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        update: SettingUpdate,
    ) -> RoletoolsResult<RoleSetting>;

    /// Delete a setting. Returns whether one existed.
    async fn remove_setting(&self, guild_id: GuildId, role_id: RoleId) -> RoletoolsResult<bool>;
}

/// Roles to restore when members rejoin.
#[async_trait]
pub trait StickyRoleStore: Send + Sync {
    /// Sticky roles recorded for a member.
    async fn sticky_roles(&self, guild_id: GuildId, user_id: UserId)
    -> RoletoolsResult<Vec<RoleId>>;

    /// Append a role if absent. Returns whether it was added.
    async fn add_sticky_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<bool>;

    /// Drop a role. Returns whether it was present.
    async fn remove_sticky_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<bool>;
}

/// Pending removals of temporary roles.
#[async_trait]
pub trait TemporaryRoleStore: Send + Sync {
    /// Record a temporary grant, replacing any record for the same member and role.
    async fn add_temporary(&self, record: TemporaryRoleRecord) -> RoletoolsResult<()>;

    /// Pending records in a guild.
    async fn temporary_records(&self, guild_id: GuildId)
    -> RoletoolsResult<Vec<TemporaryRoleRecord>>;

    /// Guilds with at least one pending record.
    async fn guilds_with_temporary(&self) -> RoletoolsResult<Vec<GuildId>>;

    /// Pop the record for a member and role.
    async fn remove_temporary(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<Option<TemporaryRoleRecord>>;
}

/// Reaction and component bindings.
#[async_trait]
pub trait BindingStore: Send + Sync {
    /// All reaction bindings in a guild.
    async fn reaction_bindings(&self, guild_id: GuildId) -> RoletoolsResult<Vec<ReactionBinding>>;

    /// Store a reaction binding, replacing one on the same message and emoji.
    async fn add_reaction_binding(
        &self,
        guild_id: GuildId,
        binding: ReactionBinding,
    ) -> RoletoolsResult<()>;

    /// Delete the binding for a message and emoji. Returns whether it existed.
    async fn remove_reaction_binding(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
        emoji: &str,
    ) -> RoletoolsResult<bool>;

    /// All component bindings in a guild.
    async fn component_bindings(&self, guild_id: GuildId)
    -> RoletoolsResult<Vec<ComponentBinding>>;

    /// Store a component binding, replacing one with the same name.
    async fn add_component_binding(
        &self,
        guild_id: GuildId,
        binding: ComponentBinding,
    ) -> RoletoolsResult<()>;

    /// Delete a component binding. Returns whether it existed.
    async fn remove_component_binding(&self, guild_id: GuildId, name: &str)
    -> RoletoolsResult<bool>;
}

/// Everything the engine persists.
pub trait RoleStore: RoleSettingsStore + StickyRoleStore + TemporaryRoleStore + BindingStore {}

impl<T> RoleStore for T where
    T: RoleSettingsStore + StickyRoleStore + TemporaryRoleStore + BindingStore
{
}

/// Live membership data from the platform cache.
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Guild facts: verification level, role positions, bot ceiling.
    async fn guild(&self, guild_id: GuildId) -> RoletoolsResult<GuildSnapshot>;

    /// A member, or `None` if the user is not in the guild.
    async fn member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> RoletoolsResult<Option<MemberSnapshot>>;

    /// Every member of the guild.
    async fn members(&self, guild_id: GuildId) -> RoletoolsResult<Vec<MemberSnapshot>>;
}

/// The only component allowed to change member roles on the platform.
///
/// Implementations return a forbidden [`roletools_error::GatewayError`]
/// when the platform refuses on permission grounds, and any other gateway
/// error for transient failures.
#[async_trait]
pub trait RoleMutationGateway: Send + Sync {
    /// Add roles to a member in one call.
    async fn add_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> RoletoolsResult<()>;

    /// Remove roles from a member in one call.
    async fn remove_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> RoletoolsResult<()>;
}

/// Platform access: membership reads plus role mutation.
pub trait Platform: MembershipProvider + RoleMutationGateway {}

impl<T> Platform for T where T: MembershipProvider + RoleMutationGateway {}

/// Virtual currency balances.
#[async_trait]
pub trait CurrencyLedger: Send + Sync {
    /// A member's balance.
    async fn balance(&self, guild_id: GuildId, user_id: UserId) -> RoletoolsResult<u64>;

    /// The largest balance a member can hold in the guild.
    async fn max_balance(&self, guild_id: GuildId) -> RoletoolsResult<u64>;

    /// Debit a member. Returns the new balance.
    ///
    /// Fails without changing anything when the balance is too small.
    async fn withdraw(&self, guild_id: GuildId, user_id: UserId, amount: u64)
    -> RoletoolsResult<u64>;

    /// Overwrite a member's balance. Fails above [`CurrencyLedger::max_balance`].
    async fn set_balance(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        amount: u64,
    ) -> RoletoolsResult<u64>;
}
