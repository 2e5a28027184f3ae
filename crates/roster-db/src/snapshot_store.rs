//! The persistence adapter contract.
//!
//! A [`SnapshotStore`] holds at most one snapshot: the most recent one.
//! `save` replaces it atomically, so a reader sees either the previous
//! document or the new one, never a mix.

use std::future::Future;

use roster_types::PersistedState;
use tracing::{info, warn};

use crate::error::DbError;

/// Durable storage for the latest [`PersistedState`].
pub trait SnapshotStore: Send + Sync {
    /// Replace the stored snapshot with `state`.
    ///
    /// # Errors
    ///
    /// Returns a [`DbError`] if the snapshot could not be written. The
    /// previous snapshot is left intact.
    fn save(&self, state: &PersistedState) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Read the stored snapshot, `None` if nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Corrupt`] if a snapshot exists but cannot be
    /// parsed, or [`DbError::Io`] if it cannot be read.
    fn load(&self) -> impl Future<Output = Result<Option<PersistedState>, DbError>> + Send;
}

/// Load the latest snapshot, treating any failure as "not found".
///
/// Missing, unreadable and corrupt snapshots all yield `None` so the caller
/// can fall back to a fresh population. Failures are logged.
pub async fn load_latest<S: SnapshotStore>(store: &S) -> Option<PersistedState> {
    match store.load().await {
        Ok(Some(state)) => {
            info!(
                tick = state.tick,
                entities = state.entities.len(),
                saved_at = %state.saved_at,
                "Loaded snapshot"
            );
            Some(state)
        }
        Ok(None) => {
            info!("No snapshot found");
            None
        }
        Err(err) => {
            warn!(operation = "load", error = %err, "Snapshot unusable, treating as not found");
            None
        }
    }
}
