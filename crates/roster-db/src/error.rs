//! Error types for the persistence layer.
//!
//! Every failure of the adapter surfaces as a [`DbError`]. The scheduler
//! never sees one directly: save failures reach it as a reported outcome
//! and load failures fall back to a fresh population.

use std::path::PathBuf;

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Reading or writing the snapshot file failed.
    #[error("I/O error during {operation} of {}: {source}", path.display())]
    Io {
        /// What was being attempted (`read`, `write`, `rename`, ...).
        operation: &'static str,
        /// File involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored snapshot exists but is not a valid document.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    /// A failure injected by a test store.
    #[error("injected failure: {0}")]
    Injected(String),
}

impl DbError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
