//! Read-through cache in front of a role settings store.

use async_trait::async_trait;
use derive_getters::Getters;
use roletools_core::{
    ComponentBinding, GuildId, MessageId, ReactionBinding, RoleId, RoleSetting,
    TemporaryRoleRecord, UserId,
};
use roletools_error::RoletoolsResult;
use roletools_interface::{
    BindingStore, RoleSettingsStore, SettingUpdate, StickyRoleStore, TemporaryRoleStore,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cached setting with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry {
    setting: RoleSetting,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Configuration for the settings cache.
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
pub struct SettingsCacheConfig {
    /// Seconds an entry stays valid.
    #[serde(default = "default_ttl")]
    ttl_secs: u64,

    /// Maximum number of cached settings.
    #[serde(default = "default_max_size")]
    max_size: usize,

    /// Whether caching is enabled.
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_ttl() -> u64 {
    300
}

fn default_max_size() -> usize {
    1000
}

fn default_enabled() -> bool {
    true
}

impl Default for SettingsCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            max_size: default_max_size(),
            enabled: default_enabled(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<(GuildId, RoleId), CacheEntry>,
    access_order: VecDeque<(GuildId, RoleId)>,
}

impl CacheInner {
    fn touch(&mut self, key: (GuildId, RoleId)) {
        if let Some(pos) = self.access_order.iter().position(|k| *k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(key);
    }

    fn forget(&mut self, key: (GuildId, RoleId)) {
        self.entries.remove(&key);
        if let Some(pos) = self.access_order.iter().position(|k| *k == key) {
            self.access_order.remove(pos);
        }
    }

    fn get(&mut self, key: (GuildId, RoleId), config: &SettingsCacheConfig) -> Option<RoleSetting> {
        if !config.enabled {
            return None;
        }
        let entry = self.entries.get(&key)?;
        if entry.is_expired(Duration::from_secs(config.ttl_secs)) {
            tracing::debug!(guild_id = %key.0, role_id = %key.1, "Cache entry expired");
            self.forget(key);
            return None;
        }
        let setting = entry.setting.clone();
        self.touch(key);
        Some(setting)
    }

    fn insert(&mut self, key: (GuildId, RoleId), setting: RoleSetting, config: &SettingsCacheConfig) {
        if !config.enabled || config.max_size == 0 {
            return;
        }
        if self.entries.len() >= config.max_size
            && !self.entries.contains_key(&key)
            && let Some(evicted) = self.access_order.pop_front()
        {
            tracing::debug!(guild_id = %evicted.0, role_id = %evicted.1, "Evicting LRU entry");
            self.entries.remove(&evicted);
        }
        self.touch(key);
        self.entries.insert(
            key,
            CacheEntry {
                setting,
                created_at: Instant::now(),
            },
        );
    }
}

/// Settings store wrapper that caches single-role lookups.
///
/// Grant and revoke paths read the settings of every requested role and its
/// relations, so hot roles are served from memory. Writes go straight to the
/// inner store and refresh the cached copy with what was written. Every
/// other store trait passes through untouched.
#[derive(Debug)]
pub struct CachedSettingsStore<S> {
    inner: S,
    config: SettingsCacheConfig,
    cache: Mutex<CacheInner>,
}

impl<S> CachedSettingsStore<S> {
    /// Wrap a store.
    pub fn new(inner: S, config: SettingsCacheConfig) -> Self {
        tracing::debug!(
            ttl_secs = config.ttl_secs,
            max_size = config.max_size,
            enabled = config.enabled,
            "Creating settings cache"
        );
        Self {
            inner,
            config,
            cache: Mutex::new(CacheInner::default()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached settings.
    pub async fn len(&self) -> usize {
        self.cache.lock().await.entries.len()
    }

    /// Whether nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.entries.is_empty()
    }

    /// Drop every cached setting.
    pub async fn clear(&self) {
        let mut cache = self.cache.lock().await;
        let count = cache.entries.len();
        cache.entries.clear();
        cache.access_order.clear();
        tracing::info!(cleared = count, "Cleared settings cache");
    }
}

#[async_trait]
impl<S: RoleSettingsStore> RoleSettingsStore for CachedSettingsStore<S> {
    // Misses and writes hold the cache lock across the inner call so a
    // stale read can never overwrite a fresher write.
    async fn setting(&self, guild_id: GuildId, role_id: RoleId) -> RoletoolsResult<RoleSetting> {
        let key = (guild_id, role_id);
        let mut cache = self.cache.lock().await;
        if let Some(setting) = cache.get(key, &self.config) {
            return Ok(setting);
        }
        let setting = self.inner.setting(guild_id, role_id).await?;
        cache.insert(key, setting.clone(), &self.config);
        Ok(setting)
    }

    async fn settings(&self, guild_id: GuildId) -> RoletoolsResult<Vec<RoleSetting>> {
        self.inner.settings(guild_id).await
    }

    async fn update_setting(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        update: SettingUpdate,
    ) -> RoletoolsResult<RoleSetting> {
        let key = (guild_id, role_id);
        let mut cache = self.cache.lock().await;
        match self.inner.update_setting(guild_id, role_id, update).await {
            Ok(setting) => {
                cache.insert(key, setting.clone(), &self.config);
                Ok(setting)
            }
            Err(e) => {
                cache.forget(key);
                Err(e)
            }
        }
    }

    async fn remove_setting(&self, guild_id: GuildId, role_id: RoleId) -> RoletoolsResult<bool> {
        let mut cache = self.cache.lock().await;
        let removed = self.inner.remove_setting(guild_id, role_id).await;
        cache.forget((guild_id, role_id));
        removed
    }
}

#[async_trait]
impl<S: StickyRoleStore> StickyRoleStore for CachedSettingsStore<S> {
    async fn sticky_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> RoletoolsResult<Vec<RoleId>> {
        self.inner.sticky_roles(guild_id, user_id).await
    }

    async fn add_sticky_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<bool> {
        self.inner.add_sticky_role(guild_id, user_id, role_id).await
    }

    async fn remove_sticky_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<bool> {
        self.inner.remove_sticky_role(guild_id, user_id, role_id).await
    }
}

#[async_trait]
impl<S: TemporaryRoleStore> TemporaryRoleStore for CachedSettingsStore<S> {
    async fn add_temporary(&self, record: TemporaryRoleRecord) -> RoletoolsResult<()> {
        self.inner.add_temporary(record).await
    }

    async fn temporary_records(
        &self,
        guild_id: GuildId,
    ) -> RoletoolsResult<Vec<TemporaryRoleRecord>> {
        self.inner.temporary_records(guild_id).await
    }

    async fn guilds_with_temporary(&self) -> RoletoolsResult<Vec<GuildId>> {
        self.inner.guilds_with_temporary().await
    }

    async fn remove_temporary(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> RoletoolsResult<Option<TemporaryRoleRecord>> {
        self.inner.remove_temporary(guild_id, user_id, role_id).await
    }
}

#[async_trait]
impl<S: BindingStore> BindingStore for CachedSettingsStore<S> {
    async fn reaction_bindings(&self, guild_id: GuildId) -> RoletoolsResult<Vec<ReactionBinding>> {
        self.inner.reaction_bindings(guild_id).await
    }

    async fn add_reaction_binding(
        &self,
        guild_id: GuildId,
        binding: ReactionBinding,
    ) -> RoletoolsResult<()> {
        self.inner.add_reaction_binding(guild_id, binding).await
    }

    async fn remove_reaction_binding(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
        emoji: &str,
    ) -> RoletoolsResult<bool> {
        self.inner
            .remove_reaction_binding(guild_id, message_id, emoji)
            .await
    }

    async fn component_bindings(
        &self,
        guild_id: GuildId,
    ) -> RoletoolsResult<Vec<ComponentBinding>> {
        self.inner.component_bindings(guild_id).await
    }

    async fn add_component_binding(
        &self,
        guild_id: GuildId,
        binding: ComponentBinding,
    ) -> RoletoolsResult<()> {
        self.inner.add_component_binding(guild_id, binding).await
    }

    async fn remove_component_binding(
        &self,
        guild_id: GuildId,
        name: &str,
    ) -> RoletoolsResult<bool> {
        self.inner.remove_component_binding(guild_id, name).await
    }
}
