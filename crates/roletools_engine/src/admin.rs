//! Admin writes to role settings.
//!
//! Every write goes through [`roletools_interface::RoleSettingsStore::update_setting`]
//! so validation and mutation happen under the store's lock.

use crate::RoleEngine;
use roletools_core::{GuildId, RelationKind, RoleId, RoleSetting, mention_roles};
use roletools_error::{RoletoolsResult, SettingsError, SettingsErrorKind};
use std::fmt::Write as _;
use tracing::{info, instrument};

/// Boolean role setting flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SettingFlag {
    /// Members may grant the role to themselves.
    #[display("self-assignable")]
    SelfAssignable,
    /// Members may remove the role from themselves.
    #[display("self-removable")]
    SelfRemovable,
    /// Restored on rejoin.
    #[display("sticky")]
    Sticky,
    /// Granted on join.
    #[display("automatic")]
    Auto,
}

impl SettingFlag {
    fn field(self, setting: &mut RoleSetting) -> &mut bool {
        match self {
            Self::SelfAssignable => &mut setting.self_assignable,
            Self::SelfRemovable => &mut setting.self_removable,
            Self::Sticky => &mut setting.sticky,
            Self::Auto => &mut setting.auto,
        }
    }
}

impl RoleEngine {
    /// Add roles to one of a role's relationship lists.
    ///
    /// # Errors
    ///
    /// Rejects unknown roles, self references, and inclusive/exclusive
    /// overlaps. A rejected write changes nothing.
    #[instrument(skip(self, others), fields(others = ?others))]
    pub async fn add_relation(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        kind: RelationKind,
        others: &[RoleId],
    ) -> RoletoolsResult<RoleSetting> {
        self.ensure_roles_exist(guild_id, std::iter::once(role_id).chain(others.iter().copied()))
            .await?;
        let others = others.to_vec();
        let setting = self
            .store()
            .update_setting(
                guild_id,
                role_id,
                Box::new(move |setting| {
                    for other in &others {
                        if *other == role_id {
                            return Err(SettingsError::new(SettingsErrorKind::SelfReference(
                                role_id.get(),
                            ))
                            .into());
                        }
                        let opposite = match kind {
                            RelationKind::Inclusive => Some(RelationKind::Exclusive),
                            RelationKind::Exclusive => Some(RelationKind::Inclusive),
                            RelationKind::Required => None,
                        };
                        if let Some(opposite) = opposite
                            && setting.relation(opposite).contains(other)
                        {
                            return Err(SettingsError::new(SettingsErrorKind::Conflict {
                                role: role_id.get(),
                                other: other.get(),
                                list: relation_name(opposite),
                            })
                            .into());
                        }
                    }
                    let list = setting.relation_mut(kind);
                    for other in others {
                        if !list.contains(&other) {
                            list.push(other);
                        }
                    }
                    Ok(())
                }),
            )
            .await?;
        info!(relation = %kind, "Added role relations");
        Ok(setting)
    }

    /// Remove roles from one of a role's relationship lists.
    ///
    /// Deleted roles may be removed, so stale references can be cleaned up.
    #[instrument(skip(self, others), fields(others = ?others))]
    pub async fn remove_relation(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        kind: RelationKind,
        others: &[RoleId],
    ) -> RoletoolsResult<RoleSetting> {
        let others = others.to_vec();
        let setting = self
            .store()
            .update_setting(
                guild_id,
                role_id,
                Box::new(move |setting| {
                    setting
                        .relation_mut(kind)
                        .retain(|existing| !others.contains(existing));
                    Ok(())
                }),
            )
            .await?;
        info!(relation = %kind, "Removed role relations");
        Ok(setting)
    }

    /// Set a boolean flag.
    #[instrument(skip(self))]
    pub async fn set_flag(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        flag: SettingFlag,
        value: bool,
    ) -> RoletoolsResult<RoleSetting> {
        self.ensure_roles_exist(guild_id, [role_id]).await?;
        let setting = self
            .store()
            .update_setting(
                guild_id,
                role_id,
                Box::new(move |setting| {
                    *flag.field(setting) = value;
                    Ok(())
                }),
            )
            .await?;
        info!("Updated role flag");
        Ok(setting)
    }

    /// Set the self-service price.
    ///
    /// # Errors
    ///
    /// Rejects prices above the guild's maximum balance.
    #[instrument(skip(self))]
    pub async fn set_cost(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        cost: u64,
    ) -> RoletoolsResult<RoleSetting> {
        self.ensure_roles_exist(guild_id, [role_id]).await?;
        self.validate_cost(guild_id, cost).await?;
        let setting = self
            .store()
            .update_setting(
                guild_id,
                role_id,
                Box::new(move |setting| {
                    setting.cost = cost;
                    Ok(())
                }),
            )
            .await?;
        info!("Updated role cost");
        Ok(setting)
    }

    /// Set or clear the temporary duration in seconds.
    #[instrument(skip(self))]
    pub async fn set_duration(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        duration: Option<u64>,
    ) -> RoletoolsResult<RoleSetting> {
        self.ensure_roles_exist(guild_id, [role_id]).await?;
        let setting = self
            .store()
            .update_setting(
                guild_id,
                role_id,
                Box::new(move |setting| {
                    setting.duration = duration.filter(|secs| *secs > 0);
                    Ok(())
                }),
            )
            .await?;
        info!("Updated temporary duration");
        Ok(setting)
    }

    /// Forget everything configured for a role.
    #[instrument(skip(self))]
    pub async fn reset_setting(&self, guild_id: GuildId, role_id: RoleId) -> RoletoolsResult<bool> {
        let removed = self.store().remove_setting(guild_id, role_id).await?;
        info!(removed, "Reset role setting");
        Ok(removed)
    }

    /// Current setting of a role.
    pub async fn role_setting(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
    ) -> RoletoolsResult<RoleSetting> {
        self.store().setting(guild_id, role_id).await
    }

    /// Every role with a non-default setting.
    pub async fn configured_roles(&self, guild_id: GuildId) -> RoletoolsResult<Vec<RoleSetting>> {
        Ok(self
            .store()
            .settings(guild_id)
            .await?
            .into_iter()
            .filter(RoleSetting::is_configured)
            .collect())
    }

    pub(crate) async fn ensure_roles_exist(
        &self,
        guild_id: GuildId,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> RoletoolsResult<()> {
        let guild = self.platform().guild(guild_id).await?;
        for role in roles {
            if !guild.role_exists(role) {
                return Err(SettingsError::new(SettingsErrorKind::UnknownRole(role.get())).into());
            }
        }
        Ok(())
    }
}

fn relation_name(kind: RelationKind) -> &'static str {
    match kind {
        RelationKind::Required => "required",
        RelationKind::Inclusive => "inclusive",
        RelationKind::Exclusive => "exclusive",
    }
}

/// Human readable summary of a setting.
pub fn describe_setting(setting: &RoleSetting) -> String {
    fn roles_or_none(roles: &[RoleId]) -> String {
        if roles.is_empty() {
            "None".to_string()
        } else {
            mention_roles(roles)
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "Settings for {}", setting.role_id.mention());
    let _ = writeln!(out, "Self assignable: {}", setting.self_assignable);
    let _ = writeln!(out, "Self removable: {}", setting.self_removable);
    let _ = writeln!(out, "Sticky: {}", setting.sticky);
    let _ = writeln!(out, "Auto: {}", setting.auto);
    let _ = writeln!(out, "Cost: {}", setting.cost);
    match setting.duration {
        Some(secs) => {
            let _ = writeln!(out, "Temporary: {secs}s");
        }
        None => {
            let _ = writeln!(out, "Temporary: no");
        }
    }
    let _ = writeln!(out, "Required: {}", roles_or_none(&setting.required));
    let _ = writeln!(out, "Inclusive: {}", roles_or_none(&setting.inclusive_with));
    let _ = write!(out, "Exclusive: {}", roles_or_none(&setting.exclusive_to));
    out
}
