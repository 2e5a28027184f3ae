//! JSON file snapshot store.
//!
//! The snapshot is written to a sibling temporary file, flushed to disk and
//! then renamed over the target. A crash or failed write leaves the
//! previous snapshot untouched.

use std::path::{Path, PathBuf};

use roster_types::PersistedState;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::DbError;
use crate::snapshot_store::SnapshotStore;

/// Stores the snapshot as a single pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store writing to `path`. Nothing is touched until the first
    /// save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, state: &PersistedState) -> Result<(), DbError> {
        let bytes = serde_json::to_vec_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DbError::io("create_dir", parent, e))?;
        }

        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|e| DbError::io("create", &temp, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| DbError::io("write", &temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| DbError::io("sync", &temp, e))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| DbError::io("rename", &self.path, e))?;

        debug!(
            path = %self.path.display(),
            tick = state.tick,
            bytes = bytes.len(),
            "Snapshot written"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedState>, DbError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DbError::io("read", &self.path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| DbError::Corrupt(format!("{}: {e}", self.path.display())))
    }
}
