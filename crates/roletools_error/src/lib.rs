//! Error types for the roletools bot.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Policy decisions (missing required roles, exclusive vetoes, cost) are
//! not errors: the engine reports them as structured outcomes. Errors are
//! reserved for configuration, storage, platform and command failures.
//!
//! # Examples
//!
//! ```
//! use roletools_error::{RoletoolsResult, GatewayError, GatewayErrorKind};
//!
//! fn add_role() -> RoletoolsResult<()> {
//!     Err(GatewayError::new(GatewayErrorKind::Http("502 Bad Gateway".into())))?
//! }
//!
//! match add_role() {
//!     Ok(()) => println!("added"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod config;
mod error;
mod gateway;
mod settings;
mod storage;

pub use command::{CommandError, CommandErrorKind};
pub use config::ConfigError;
pub use error::{RoletoolsError, RoletoolsErrorKind, RoletoolsResult};
pub use gateway::{GatewayError, GatewayErrorKind};
pub use settings::{SettingsError, SettingsErrorKind};
pub use storage::{StorageError, StorageErrorKind};
