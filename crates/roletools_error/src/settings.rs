//! Errors for rejected role setting and balance writes.

/// Reasons a role setting or balance write is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SettingsErrorKind {
    /// A role would appear in both the inclusive and exclusive lists.
    #[display("Role {} is already in the {} list of role {}", other, list, role)]
    Conflict {
        /// Role being configured
        role: u64,
        /// Role that conflicts
        other: u64,
        /// Name of the list the other role already sits in
        list: &'static str,
    },

    /// A role cannot reference itself.
    #[display("Role {} cannot reference itself", _0)]
    SelfReference(u64),

    /// Cost is larger than the guild's maximum balance.
    #[display("Cost {} exceeds the maximum balance of {}", cost, max)]
    CostAboveMaximum {
        /// Requested cost
        cost: u64,
        /// Largest balance a member can hold
        max: u64,
    },

    /// Balance is larger than the guild's maximum balance.
    #[display("Balance {} exceeds the maximum balance of {}", amount, max)]
    BalanceAboveMaximum {
        /// Requested balance
        amount: u64,
        /// Largest balance a member can hold
        max: u64,
    },

    /// A debit is larger than the member's balance.
    #[display("Cannot withdraw {} from a balance of {}", amount, balance)]
    InsufficientBalance {
        /// Current balance
        balance: u64,
        /// Requested debit
        amount: u64,
    },

    /// The role does not exist in the guild.
    #[display("Unknown role: {}", _0)]
    UnknownRole(u64),
}

/// Settings error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Settings Error: {} at line {} in {}", kind, line, file)]
pub struct SettingsError {
    kind: SettingsErrorKind,
    line: u32,
    file: &'static str,
}

impl SettingsError {
    /// Create a new settings error with caller location tracking.
    #[track_caller]
    pub fn new(kind: SettingsErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &SettingsErrorKind {
        &self.kind
    }
}
