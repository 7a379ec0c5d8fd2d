//! Core data types for the roletools role automation bot.
//!
//! This crate holds the plain data the rule engine reasons about: ids,
//! per-role settings, member and guild snapshots, temporary grants, UI
//! bindings and structured grant/revoke outcomes. It performs no I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod binding;
mod id;
mod member;
mod outcome;
mod setting;
mod temporary;

pub use binding::{ComponentBinding, ComponentId, ComponentKind, ReactionBinding};
pub use id::{ChannelId, GuildId, MessageId, RoleId, UserId, mention_roles};
pub use member::{Assignability, GuildSnapshot, MemberSnapshot};
pub use outcome::{RoleOutcome, RoleOutcomeKind, summarize};
pub use setting::{RelationKind, RoleSetting, RoleSettingBuilder};
pub use temporary::TemporaryRoleRecord;
