//! Shared fixture for engine integration tests.
//!
//! Roles 1 through 20 sit below the bot at their own id as position.
//! [`HIGH_ROLE`] ranks above the bot.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use roletools_core::{GuildId, GuildSnapshot, MemberSnapshot, RoleId, RoleSetting, UserId};
use roletools_engine::testing::{FakeLedger, FakePlatform};
use roletools_engine::{EngineConfig, RoleEngine};
use roletools_interface::RoleSettingsStore;
use roletools_storage::StateStore;
use std::sync::Arc;

pub const GUILD: GuildId = GuildId(1000);
pub const BOT_TOP: u16 = 100;
pub const HIGH_ROLE: RoleId = RoleId(99);

pub struct Fixture {
    pub engine: RoleEngine,
    pub store: Arc<StateStore>,
    pub platform: Arc<FakePlatform>,
}

pub fn guild(verification_level: u8) -> GuildSnapshot {
    (1..=20u16)
        .fold(GuildSnapshot::new(GUILD, verification_level, BOT_TOP), |guild, id| {
            guild.with_role(RoleId(u64::from(id)), id)
        })
        .with_role(HIGH_ROLE, BOT_TOP + 10)
}

/// A human member whose account and membership are a month old.
pub fn settled_member(user: u64, roles: &[u64]) -> MemberSnapshot {
    let month_ago = Utc::now() - Duration::days(30);
    MemberSnapshot::new(GUILD, UserId(user), month_ago)
        .with_joined_at(month_ago)
        .with_roles(roles.iter().copied().map(RoleId))
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_guild(guild(0))
    }

    pub fn with_guild(guild: GuildSnapshot) -> Self {
        let store = Arc::new(StateStore::in_memory());
        let platform = Arc::new(FakePlatform::new().with_guild(guild));
        let engine = RoleEngine::new(store.clone(), platform.clone(), EngineConfig::default());
        Self {
            engine,
            store,
            platform,
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<FakeLedger>) -> Self {
        self.engine = self.engine.with_ledger(ledger);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.engine = RoleEngine::new(self.store.clone(), self.platform.clone(), config);
        self
    }

    /// Put a settled member on the platform and return their snapshot.
    pub fn member(&self, user: u64, roles: &[u64]) -> MemberSnapshot {
        let member = settled_member(user, roles);
        self.platform.put_member(member.clone());
        member
    }

    pub async fn configure<F>(&self, role: u64, update: F)
    where
        F: FnOnce(&mut RoleSetting) + Send + 'static,
    {
        self.store
            .update_setting(
                GUILD,
                RoleId(role),
                Box::new(move |setting| {
                    update(setting);
                    Ok(())
                }),
            )
            .await
            .expect("setting update");
    }

    pub fn roles(&self, user: u64) -> Vec<u64> {
        self.platform
            .roles_of(GUILD, UserId(user))
            .into_iter()
            .map(RoleId::get)
            .collect()
    }
}

pub fn ids(roles: &[u64]) -> Vec<RoleId> {
    roles.iter().copied().map(RoleId).collect()
}
