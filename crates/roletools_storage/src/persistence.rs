//! JSON file persistence for [`RoletoolsState`].

use crate::RoletoolsState;
use roletools_error::{RoletoolsResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Reads and writes the state file.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct JsonStatePersistence {
    file_path: PathBuf,
}

impl JsonStatePersistence {
    /// Persistence backed by `file_path`.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Path of the state file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Write the state.
    #[instrument(skip(self, state), fields(path = %self.file_path.display(), guilds = state.guilds.len()))]
    pub async fn save_state(&self, state: &RoletoolsState) -> RoletoolsResult<()> {
        debug!("Saving state");
        let json = serde_json::to_string_pretty(state).map_err(StorageError::from)?;

        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::StateDirectory(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = self.file_path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await.map_err(|e| {
            StorageError::new(StorageErrorKind::StateWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &self.file_path)
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::StateWrite(format!(
                    "rename {} to {}: {}",
                    temp_path.display(),
                    self.file_path.display(),
                    e
                )))
            })?;

        debug!("State saved");
        Ok(())
    }

    /// Read the state, or `None` if the file does not exist yet.
    #[instrument(skip(self), fields(path = %self.file_path.display()))]
    pub async fn load_state(&self) -> RoletoolsResult<Option<RoletoolsState>> {
        debug!("Loading state");
        let json = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No state file, starting empty");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::StateRead(format!(
                    "{}: {}",
                    self.file_path.display(),
                    e
                )))
                .into());
            }
        };
        let state: RoletoolsState = serde_json::from_str(&json).map_err(StorageError::from)?;
        info!(guilds = state.guilds.len(), "State loaded");
        Ok(Some(state))
    }
}
