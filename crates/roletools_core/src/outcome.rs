//! Structured per-role results of grant and revoke operations.
//!
//! The engine never hides a skipped role: every requested role produces
//! one outcome, repeated ids included, and callers decide whether to
//! surface it. Inclusive and exclusive side effects add outcomes of their
//! own for the roles they touch.

use crate::{RoleId, mention_roles};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to one requested role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoleOutcomeKind {
    /// Role added to the member.
    Granted,
    /// Role removed from the member.
    Revoked,
    /// Grant requested for a role the member already holds.
    AlreadyHeld,
    /// Revoke requested for a role the member does not hold.
    NotHeld,
    /// Role already appeared earlier in the same request.
    Duplicate,
    /// Role no longer exists in the guild.
    RoleMissing,
    /// Role ranks at or above the bot, or the bot cannot manage roles.
    AboveCeiling,
    /// Member lacks these required roles.
    MissingRequired {
        /// Required roles the member does not hold
        missing: Vec<RoleId>,
    },
    /// Member holds these exclusive roles and they cannot be removed.
    ExclusiveVeto {
        /// Held exclusive roles that are not self-removable
        blocking: Vec<RoleId>,
    },
    /// Member cannot afford the role.
    InsufficientFunds {
        /// Price of the role
        cost: u64,
        /// Member's balance
        balance: u64,
    },
    /// Role is not self-assignable.
    NotSelfAssignable,
    /// Role is not self-removable.
    NotSelfRemovable,
    /// Member is still inside the guild verification waiting period.
    VerificationPending {
        /// Seconds left to wait
        wait_secs: u64,
    },
    /// Member is not in the guild; the role is stored and applied on rejoin.
    SavedForRejoin,
    /// The platform refused the mutation.
    Forbidden,
}

/// Outcome for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOutcome {
    /// Role the outcome refers to.
    pub role_id: RoleId,
    /// What happened.
    pub kind: RoleOutcomeKind,
}

impl RoleOutcome {
    /// Create an outcome.
    pub fn new(role_id: RoleId, kind: RoleOutcomeKind) -> Self {
        Self { role_id, kind }
    }

    /// Whether the member ends up in the requested state.
    ///
    /// `AlreadyHeld` and `NotHeld` count as success: the request was a no-op.
    pub fn is_success(&self) -> bool {
        matches!(
            self.kind,
            RoleOutcomeKind::Granted
                | RoleOutcomeKind::Revoked
                | RoleOutcomeKind::AlreadyHeld
                | RoleOutcomeKind::NotHeld
                | RoleOutcomeKind::Duplicate
                | RoleOutcomeKind::SavedForRejoin
        )
    }

    /// Whether a mutation was performed.
    pub fn is_change(&self) -> bool {
        matches!(self.kind, RoleOutcomeKind::Granted | RoleOutcomeKind::Revoked)
    }
}

impl fmt::Display for RoleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = self.role_id.mention();
        match &self.kind {
            RoleOutcomeKind::Granted => write!(f, "Added {role}."),
            RoleOutcomeKind::Revoked => write!(f, "Removed {role}."),
            RoleOutcomeKind::AlreadyHeld => write!(f, "You already have {role}."),
            RoleOutcomeKind::NotHeld => write!(f, "You don't have {role}."),
            RoleOutcomeKind::Duplicate => write!(f, "{role} was listed more than once."),
            RoleOutcomeKind::RoleMissing => write!(f, "Role {} no longer exists.", self.role_id),
            RoleOutcomeKind::AboveCeiling => {
                write!(f, "I can't manage {role}, it is higher than my highest role.")
            }
            RoleOutcomeKind::MissingRequired { missing } => write!(
                f,
                "You need {} before you can get {role}.",
                mention_roles(missing)
            ),
            RoleOutcomeKind::ExclusiveVeto { blocking } => write!(
                f,
                "You can't get {role} while you have {}.",
                mention_roles(blocking)
            ),
            RoleOutcomeKind::InsufficientFunds { cost, balance } => write!(
                f,
                "{role} costs {cost} but you only have {balance}."
            ),
            RoleOutcomeKind::NotSelfAssignable => write!(f, "{role} is not self-assignable."),
            RoleOutcomeKind::NotSelfRemovable => write!(f, "{role} is not self-removable."),
            RoleOutcomeKind::VerificationPending { wait_secs } => write!(
                f,
                "You can get {role} in {wait_secs} seconds, once server verification allows it."
            ),
            RoleOutcomeKind::SavedForRejoin => {
                write!(f, "{role} will be given back when they rejoin.")
            }
            RoleOutcomeKind::Forbidden => write!(f, "Discord refused to change {role}."),
        }
    }
}

/// Render outcomes one per line.
pub fn summarize(outcomes: &[RoleOutcome]) -> String {
    if outcomes.is_empty() {
        return "Nothing to do.".to_string();
    }
    outcomes
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
