//! Engine tuning knobs.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the rule engine and its background work.
///
/// Loaded from the `[engine]` table of `roletools.toml`.
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
pub struct EngineConfig {
    /// Seconds between temporary role sweeps.
    #[serde(default = "default_sweep_interval")]
    sweep_interval_secs: u64,

    /// Records due within this many seconds are armed during a sweep.
    #[serde(default = "default_arm_window")]
    arm_window_secs: u64,

    /// Members processed concurrently by bulk operations.
    #[serde(default = "default_bulk_concurrency")]
    bulk_concurrency: usize,

    /// Guild cooldown added per member touched by a bulk operation.
    #[serde(default = "default_cooldown_per_member")]
    cooldown_per_member_secs: u64,

    /// Upper bound on a bulk operation cooldown.
    #[serde(default = "default_cooldown_cap")]
    cooldown_cap_secs: u64,

    /// Debit the role price when a paid role is granted.
    #[serde(default = "default_charge_on_grant")]
    charge_on_grant: bool,
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_arm_window() -> u64 {
    300
}

fn default_bulk_concurrency() -> usize {
    5
}

fn default_cooldown_per_member() -> u64 {
    10
}

fn default_cooldown_cap() -> u64 {
    3600
}

fn default_charge_on_grant() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            arm_window_secs: default_arm_window(),
            bulk_concurrency: default_bulk_concurrency(),
            cooldown_per_member_secs: default_cooldown_per_member(),
            cooldown_cap_secs: default_cooldown_cap(),
            charge_on_grant: default_charge_on_grant(),
        }
    }
}

impl EngineConfig {
    /// Interval between sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Arming horizon for due records.
    pub fn arm_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.arm_window_secs).unwrap_or(i64::MAX))
    }

    /// Cooldown after a bulk operation touching `members` members.
    pub fn bulk_cooldown(&self, members: usize) -> Duration {
        let members = u64::try_from(members).unwrap_or(u64::MAX);
        Duration::from_secs(
            self.cooldown_per_member_secs
                .saturating_mul(members)
                .min(self.cooldown_cap_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.arm_window(), chrono::Duration::seconds(300));
        assert_eq!(*config.bulk_concurrency(), 5);
        assert!(*config.charge_on_grant());
    }

    #[test]
    fn test_bulk_cooldown_is_capped() {
        let config = EngineConfig::default();
        assert_eq!(config.bulk_cooldown(3), Duration::from_secs(30));
        assert_eq!(config.bulk_cooldown(1000), Duration::from_secs(3600));
    }

    #[test]
    fn test_partial_table_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"bulk_concurrency": 2}"#).expect("valid config");
        assert_eq!(*config.bulk_concurrency(), 2);
        assert_eq!(*config.cooldown_cap_secs(), 3600);
    }
}
