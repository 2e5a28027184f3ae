//! In-memory snapshot store with fault injection, for tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use roster_types::PersistedState;
use tokio::sync::Mutex;

use crate::error::DbError;
use crate::snapshot_store::SnapshotStore;

/// Holds the latest snapshot in memory.
///
/// Saves can be made to fail, either for the next `n` attempts or until
/// further notice. A failed save leaves the held snapshot unchanged.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<PersistedState>>,
    failing_saves: AtomicU32,
    always_fail: AtomicBool,
    attempts: AtomicU32,
}

impl MemorySnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `state`.
    pub fn with_snapshot(state: PersistedState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
            ..Self::default()
        }
    }

    /// Make the next `n` saves fail.
    pub fn fail_next_saves(&self, n: u32) {
        self.failing_saves.store(n, Ordering::Release);
    }

    /// Make every save fail until switched off.
    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail.store(fail, Ordering::Release);
    }

    /// Number of save attempts so far, failed ones included.
    pub fn save_attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    /// The held snapshot.
    pub async fn current(&self) -> Option<PersistedState> {
        self.slot.lock().await.clone()
    }

    fn take_failure(&self) -> bool {
        if self.always_fail.load(Ordering::Acquire) {
            return true;
        }
        self.failing_saves
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, state: &PersistedState) -> Result<(), DbError> {
        self.attempts.fetch_add(1, Ordering::AcqRel);
        if self.take_failure() {
            return Err(DbError::Injected(format!(
                "save of tick {} rejected",
                state.tick
            )));
        }
        *self.slot.lock().await = Some(state.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedState>, DbError> {
        Ok(self.slot.lock().await.clone())
    }
}
