//! Errors raised by the chat platform when reading members or mutating roles.

/// Platform failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GatewayErrorKind {
    /// The platform refused the call (missing permission or role hierarchy).
    #[display("Forbidden: {}", _0)]
    Forbidden(String),

    /// Rate limit hit.
    #[display("Rate limited: retry after {}s", retry_after_secs)]
    RateLimited {
        /// Seconds until the bucket resets
        retry_after_secs: u64,
    },

    /// Guild is not visible to the bot.
    #[display("Guild not found: {}", _0)]
    GuildNotFound(u64),

    /// Any other HTTP or gateway failure.
    #[display("Platform request failed: {}", _0)]
    Http(String),
}

/// Platform error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Gateway Error: {} at line {} in {}", kind, line, file)]
pub struct GatewayError {
    kind: GatewayErrorKind,
    line: u32,
    file: &'static str,
}

impl GatewayError {
    /// Create a new gateway error with caller location tracking.
    #[track_caller]
    pub fn new(kind: GatewayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GatewayErrorKind {
        &self.kind
    }

    /// Whether the platform rejected the call on permission grounds.
    ///
    /// Permission failures are policy outcomes; everything else is transient.
    pub fn is_forbidden(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::Forbidden(_))
    }
}
