//! Snapshot persistence for the roster simulation.
//!
//! The adapter stores one document, the latest [`PersistedState`], and
//! replaces it atomically on every save. Saves run in a background worker
//! on their own period, decoupled from the tick rate.
//!
//! # Modules
//!
//! - [`snapshot_store`] -- The [`SnapshotStore`] trait and [`load_latest`]
//! - [`file_store`] -- Atomic JSON file store
//! - [`memory_store`] -- In-memory store with fault injection
//! - [`worker`] -- Background persistence worker and save outcomes
//! - [`error`] -- Shared error types
//!
//! [`PersistedState`]: roster_types::PersistedState

pub mod error;
pub mod file_store;
pub mod memory_store;
pub mod snapshot_store;
pub mod worker;

// Re-export primary types for convenience.
pub use error::DbError;
pub use file_store::FileSnapshotStore;
pub use memory_store::MemorySnapshotStore;
pub use snapshot_store::{SnapshotStore, load_latest};
pub use worker::{
    IgnoreOutcomes, PersistenceReport, SaveObserver, SaveOutcome, run_persistence, save_view,
};
