//! Store implementing every roletools persistence trait.

use crate::{DEFAULT_MAX_BALANCE, JsonStatePersistence, LedgerConfig, RoletoolsState};
use async_trait::async_trait;
use roletools_core::{
    ComponentBinding, GuildId, MessageId, ReactionBinding, RoleId, RoleSetting,
    TemporaryRoleRecord, UserId,
};
use roletools_error::RoletoolsResult;
use roletools_interface::{
    BindingStore, RoleSettingsStore, SettingUpdate, StickyRoleStore, TemporaryRoleStore,
};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// State held in memory and optionally mirrored to a JSON file.
///
/// Every mutation runs under a single lock and is written through to disk
/// before the lock is released, so concurrent read-modify-write cycles on
/// the same record cannot lose updates.
///
/// # Examples
///
/// ```
/// use roletools_core::{GuildId, RoleId, UserId};
/// use roletools_interface::StickyRoleStore;
/// use roletools_storage::StateStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = StateStore::in_memory();
/// store.add_sticky_role(GuildId(1), UserId(2), RoleId(3)).await.unwrap();
/// assert_eq!(store.sticky_roles(GuildId(1), UserId(2)).await.unwrap(), vec![RoleId(3)]);
/// # }
/// ```
#[derive(Debug)]
pub struct StateStore {
    state: Mutex<RoletoolsState>,
    persistence: Option<JsonStatePersistence>,
    pub(crate) max_balance: u64,
}

impl StateStore {
    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(RoletoolsState::default()),
            persistence: None,
            max_balance: DEFAULT_MAX_BALANCE,
        }
    }

    /// Store backed by a JSON file, loading existing state if present.
    #[instrument(skip(path))]
    pub async fn open(path: impl Into<PathBuf>) -> RoletoolsResult<Self> {
        let persistence = JsonStatePersistence::new(path);
        let state = persistence.load_state().await?.unwrap_or_default();
        info!(
            path = %persistence.file_path().display(),
            guilds = state.guilds.len(),
            "Opened state store"
        );
        Ok(Self {
            state: Mutex::new(state),
            persistence: Some(persistence),
            max_balance: DEFAULT_MAX_BALANCE,
        })
    }

    /// Apply ledger limits.
    pub fn with_ledger_config(mut self, config: &LedgerConfig) -> Self {
        self.max_balance = *config.max_balance();
        self
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> RoletoolsState {
        self.state.lock().await.clone()
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, RoletoolsState> {
        self.state.lock().await
    }

    pub(crate) async fn commit(&self, state: &mut RoletoolsState) -> RoletoolsResult<()> {
        state.prune();
        if let Some(persistence) = &self.persistence {
            persistence.save_state(state).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RoleSettingsStore for StateStore {
    async fn setting(&self, guild_id: GuildId, role_id: RoleId) -> RoletoolsResult<RoleSetting> {
        let state = self.state.lock().await;
        Ok(state
            .guild(guild_id)
            .and_then(|guild| guild.settings.get(&role_id))
            .cloned()
            .unwrap_or_else(|| RoleSetting::new(role_id)))
    }

    async fn settings(&self, guild_id: GuildId) -> RoletoolsResult<Vec<RoleSetting>> {
        let state = self.state.lock().await;
        Ok(state
            .guild(guild_id)
            .map(|guild| guild.settings.values().cloned().collect())
            .unwrap_or_default())
    }

    #[instrument(skip(self, update), fields(guild_id = %guild_id, role_id = %role_id))]
    async fn update_setting(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        update: SettingUpdate,
    ) -> RoletoolsResult<RoleSetting> {
        let mut state = self.state.lock().await;
        let mut setting = state
            .guild(guild_id)
            .and_then(|guild| guild.settings.get(&role_id))
            .cloned()
            .unwrap_or_else(|| RoleSetting::new(role_id));
        update(&mut setting)?;
        state
            .guild_mut(guild_id)
            .settings
            .insert(role_id, setting.clone());
        self.commit(&mut state).await?;
        debug!("Role setting updated");
        Ok(setting)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, role_id = %role_id))]
    async fn remove_setting(&self, guild_id: GuildId, role_id: RoleId) -> RoletoolsResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.guild_mut(guild_id).settings.remove(&role_id).is_some();
        self.commit(&mut state).await?;
        Ok(removed)
    }
}

#[async_trait]
impl StickyRoleStore for StateStore {
    async fn sticky_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> RoletoolsResult<Vec<RoleId>> {
        let state = self.state.lock().await;
        Ok(state
            .guild(guild_id)
            .and_then(|guild| guild.sticky.get(&user_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_sticky_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<bool> {
        let mut state = self.state.lock().await;
        let added = state.guild_mut(guild_id).add_sticky(user_id, role_id);
        if added {
            self.commit(&mut state).await?;
        }
        Ok(added)
    }

    async fn remove_sticky_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.guild_mut(guild_id).remove_sticky(user_id, role_id);
        self.commit(&mut state).await?;
        Ok(removed)
    }
}

#[async_trait]
impl TemporaryRoleStore for StateStore {
    async fn add_temporary(&self, record: TemporaryRoleRecord) -> RoletoolsResult<()> {
        let mut state = self.state.lock().await;
        state.guild_mut(record.guild_id).put_temporary(record);
        self.commit(&mut state).await
    }

    async fn temporary_records(
        &self,
        guild_id: GuildId,
    ) -> RoletoolsResult<Vec<TemporaryRoleRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .guild(guild_id)
            .map(|guild| guild.temporary.clone())
            .unwrap_or_default())
    }

    async fn guilds_with_temporary(&self) -> RoletoolsResult<Vec<GuildId>> {
        let state = self.state.lock().await;
        Ok(state
            .guilds
            .iter()
            .filter(|(_, guild)| !guild.temporary.is_empty())
            .map(|(guild_id, _)| *guild_id)
            .collect())
    }

    async fn remove_temporary(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<Option<TemporaryRoleRecord>> {
        let mut state = self.state.lock().await;
        let record = state.guild_mut(guild_id).take_temporary(user_id, role_id);
        self.commit(&mut state).await?;
        Ok(record)
    }
}

#[async_trait]
impl BindingStore for StateStore {
    async fn reaction_bindings(&self, guild_id: GuildId) -> RoletoolsResult<Vec<ReactionBinding>> {
        let state = self.state.lock().await;
        Ok(state
            .guild(guild_id)
            .map(|guild| guild.reactions.clone())
            .unwrap_or_default())
    }

    async fn add_reaction_binding(
        &self,
        guild_id: GuildId,
        binding: ReactionBinding,
    ) -> RoletoolsResult<()> {
        let mut state = self.state.lock().await;
        state.guild_mut(guild_id).put_reaction(binding);
        self.commit(&mut state).await
    }

    async fn remove_reaction_binding(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
        emoji: &str,
    ) -> RoletoolsResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.guild_mut(guild_id).remove_reaction(message_id, emoji);
        self.commit(&mut state).await?;
        Ok(removed)
    }

    async fn component_bindings(
        &self,
        guild_id: GuildId,
    ) -> RoletoolsResult<Vec<ComponentBinding>> {
        let state = self.state.lock().await;
        Ok(state
            .guild(guild_id)
            .map(|guild| guild.components.clone())
            .unwrap_or_default())
    }

    async fn add_component_binding(
        &self,
        guild_id: GuildId,
        binding: ComponentBinding,
    ) -> RoletoolsResult<()> {
        let mut state = self.state.lock().await;
        state.guild_mut(guild_id).put_component(binding);
        self.commit(&mut state).await
    }

    async fn remove_component_binding(
        &self,
        guild_id: GuildId,
        name: &str,
    ) -> RoletoolsResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.guild_mut(guild_id).remove_component(name);
        self.commit(&mut state).await?;
        Ok(removed)
    }
}
