//! Persistence for roletools.
//!
//! [`StateStore`] implements every store trait from `roletools_interface`
//! over a single [`RoletoolsState`] document, optionally written through to
//! a JSON file by [`JsonStatePersistence`]. [`CachedSettingsStore`] wraps any
//! store with a read-through cache for role settings. The same document
//! holds per-guild currency balances for the cost gate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod ledger;
mod persistence;
mod state;
mod store;

pub use cache::{CachedSettingsStore, SettingsCacheConfig, SettingsCacheConfigBuilder};
pub use ledger::{DEFAULT_MAX_BALANCE, LedgerConfig, LedgerConfigBuilder};
pub use persistence::JsonStatePersistence;
pub use state::{GuildState, RoletoolsState};
pub use store::StateStore;
