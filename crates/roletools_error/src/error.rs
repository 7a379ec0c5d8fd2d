//! Top-level error wrapper types.

use crate::{CommandError, ConfigError, GatewayError, SettingsError, StorageError};

/// Every error the roletools crates can surface.
///
/// # Examples
///
/// ```
/// use roletools_error::{RoletoolsError, ConfigError};
///
/// let config_err = ConfigError::new("missing token");
/// let err: RoletoolsError = config_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum RoletoolsErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Persisted state could not be read or written
    #[from(StorageError)]
    Storage(StorageError),
    /// Chat platform call failed
    #[from(GatewayError)]
    Gateway(GatewayError),
    /// Role setting write rejected
    #[from(SettingsError)]
    Settings(SettingsError),
    /// Command parsing or execution failed
    #[from(CommandError)]
    Command(CommandError),
}

/// Roletools error with kind discrimination.
///
/// # Examples
///
/// ```
/// use roletools_error::{RoletoolsResult, StorageError, StorageErrorKind};
///
/// fn might_fail() -> RoletoolsResult<()> {
///     Err(StorageError::new(StorageErrorKind::Unavailable("offline".into())))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Roletools Error: {}", _0)]
pub struct RoletoolsError(Box<RoletoolsErrorKind>);

impl RoletoolsError {
    /// Create a new error from a kind.
    pub fn new(kind: RoletoolsErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RoletoolsErrorKind {
        &self.0
    }

    /// The gateway error, if this error came from the chat platform.
    pub fn as_gateway(&self) -> Option<&GatewayError> {
        match self.kind() {
            RoletoolsErrorKind::Gateway(e) => Some(e),
            _ => None,
        }
    }

    /// The command error, if this error came from command handling.
    pub fn as_command(&self) -> Option<&CommandError> {
        match self.kind() {
            RoletoolsErrorKind::Command(e) => Some(e),
            _ => None,
        }
    }

    /// The settings error, if a role setting write was rejected.
    pub fn as_settings(&self) -> Option<&SettingsError> {
        match self.kind() {
            RoletoolsErrorKind::Settings(e) => Some(e),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to RoletoolsErrorKind
impl<T> From<T> for RoletoolsError
where
    T: Into<RoletoolsErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for roletools operations.
pub type RoletoolsResult<T> = std::result::Result<T, RoletoolsError>;
