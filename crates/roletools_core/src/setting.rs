//! Per-role configuration.

use crate::RoleId;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Relationship lists a role setting carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Roles that must all be held before the role can be granted.
    #[display("required")]
    Required,
    /// Roles granted and revoked together with the role.
    #[display("inclusive")]
    Inclusive,
    /// Roles removed when the role is granted.
    #[display("exclusive")]
    Exclusive,
}

/// Configuration attached to one role in one guild.
///
/// A default setting is neither self-assignable nor self-removable, carries
/// no relationships and costs nothing. Settings are created with defaults
/// the first time an admin command touches a role.
///
/// # Examples
///
/// ```
/// use roletools_core::{RoleId, RoleSettingBuilder};
///
/// let vip = RoleSettingBuilder::default()
///     .role_id(RoleId(10))
///     .self_assignable(true)
///     .cost(100u64)
///     .build()
///     .expect("valid setting");
///
/// assert!(vip.self_assignable);
/// assert_eq!(vip.cost, 100);
/// assert!(vip.exclusive_to.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct RoleSetting {
    /// The governed role.
    pub role_id: RoleId,
    /// Members may grant this role to themselves.
    pub self_assignable: bool,
    /// Members may remove this role from themselves.
    pub self_removable: bool,
    /// Reapplied when a member rejoins.
    pub sticky: bool,
    /// Granted to every new member.
    pub auto: bool,
    /// Roles that must all be held before this one is granted.
    pub required: Vec<RoleId>,
    /// Roles granted and revoked alongside this one.
    pub inclusive_with: Vec<RoleId>,
    /// Roles removed when this one is granted.
    pub exclusive_to: Vec<RoleId>,
    /// Virtual currency price for self-service acquisition. Zero is free.
    pub cost: u64,
    /// Seconds a tracked grant lasts before it expires.
    pub duration: Option<u64>,
}

impl RoleSetting {
    /// Default setting for a role.
    pub fn new(role_id: RoleId) -> Self {
        Self {
            role_id,
            ..Self::default()
        }
    }

    /// Roles in the given relationship list.
    pub fn relation(&self, kind: RelationKind) -> &[RoleId] {
        match kind {
            RelationKind::Required => &self.required,
            RelationKind::Inclusive => &self.inclusive_with,
            RelationKind::Exclusive => &self.exclusive_to,
        }
    }

    /// Mutable access to a relationship list.
    pub fn relation_mut(&mut self, kind: RelationKind) -> &mut Vec<RoleId> {
        match kind {
            RelationKind::Required => &mut self.required,
            RelationKind::Inclusive => &mut self.inclusive_with,
            RelationKind::Exclusive => &mut self.exclusive_to,
        }
    }

    /// Expiry duration for tracked grants.
    pub fn expiry(&self) -> Option<Duration> {
        self.duration.map(Duration::from_secs)
    }

    /// Whether the setting differs from a freshly created one.
    pub fn is_configured(&self) -> bool {
        *self != Self::new(self.role_id)
    }
}
