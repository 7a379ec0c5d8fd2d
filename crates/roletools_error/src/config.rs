//! Configuration and startup errors.

/// A bad setting, missing token or unusable config file.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// What is wrong with the configuration
    pub message: String,
    /// Source line
    pub line: u32,
    /// Source file
    pub file: &'static str,
}

impl ConfigError {
    /// Raise `message` at the caller's location.
    ///
    /// ```
    /// use roletools_error::ConfigError;
    ///
    /// let err = ConfigError::new("DISCORD_TOKEN is not set");
    /// assert!(err.message.contains("DISCORD_TOKEN"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let caller = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: caller.line(),
            file: caller.file(),
        }
    }
}
