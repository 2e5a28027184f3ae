//! Roster engine: the runnable minion simulation.
//!
//! This crate wires the scheduler from `roster-core`, the persistence
//! worker from `roster-db` and the observer from `roster-observer` into a
//! single [`RosterSystem`] context object. The `roster-engine` binary adds
//! configuration loading, logging, the HTTP server and signal handling on
//! top.
//!
//! # Data flow
//!
//! ```text
//! tick loop --(PublishCallback)--> watch<Arc<RosterView>> --> observer handlers
//!     ^                                   |
//!     |                                   +--> persistence worker --> SnapshotStore
//!     |                                                   |
//!     +------(notices)------ OperatorState <--(outcomes)--+
//! ```

pub mod callback;
pub mod error;
pub mod health;
pub mod system;

pub use error::EngineError;
pub use system::{RosterSystem, RunReport};
