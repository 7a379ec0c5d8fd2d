//! State file errors.

/// What went wrong while loading or saving bot state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// The parent directory of the state file could not be created
    #[display("Cannot create state directory: {}", _0)]
    StateDirectory(String),
    /// Writing or renaming the state file failed
    #[display("Cannot save state: {}", _0)]
    StateWrite(String),
    /// The state file exists but could not be read
    #[display("Cannot load state: {}", _0)]
    StateRead(String),
    /// State JSON did not match the expected layout
    #[display("Malformed state: {}", _0)]
    Encoding(String),
    /// The store refused the operation
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// A storage failure and where it was raised.
///
/// ```
/// use roletools_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::StateRead("/tmp/state.json".to_string()));
/// assert!(err.to_string().starts_with("Storage Error: Cannot load state"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// What failed
    pub kind: StorageErrorKind,
    /// Source line
    pub line: u32,
    /// Source file
    pub file: &'static str,
}

impl StorageError {
    /// Wrap `kind` with the caller's location.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let caller = std::panic::Location::caller();
        Self {
            kind,
            line: caller.line(),
            file: caller.file(),
        }
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for StorageError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        StorageError::new(StorageErrorKind::Encoding(err.to_string()))
    }
}
