//! Trait definitions for the roletools rule engine.
//!
//! The engine talks to four kinds of collaborators, all behind traits so
//! they can be swapped for in-memory doubles in tests:
//!
//! - **Stores** ([`RoleSettingsStore`], [`StickyRoleStore`],
//!   [`TemporaryRoleStore`], [`BindingStore`]) persist configuration and
//!   bookkeeping. [`RoleStore`] bundles them.
//! - **[`MembershipProvider`]** reads live member and guild snapshots.
//! - **[`RoleMutationGateway`]** is the only way roles change on the platform.
//! - **[`CurrencyLedger`]** backs the cost gate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{
    BindingStore, CurrencyLedger, MembershipProvider, Platform, RoleMutationGateway,
    RoleSettingsStore, RoleStore, SettingUpdate, StickyRoleStore, TemporaryRoleStore,
};
