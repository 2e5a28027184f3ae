//! Minion state and the rules that change it.
//!
//! This crate is the logic layer of the roster simulation. Everything here
//! operates on in-memory minions without touching I/O. It sits between
//! `roster-types` (the data model) and `roster-core` (the scheduler).
//!
//! # Modules
//!
//! - [`aggregate`] -- The metric aggregator ([`compute_snapshot`])
//! - [`catalog`] -- Task assignment, pay, purchases, study focus
//! - [`config`] -- Population parameters ([`PopulationParams`])
//! - [`error`] -- Error types for store operations ([`AgentError`])
//! - [`population`] -- Population generation
//! - [`store`] -- The entity store ([`MinionStore`])
//! - [`transition`] -- The status state machine ([`Transition`])

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod population;
pub mod store;
pub mod transition;

pub use aggregate::{compute_snapshot, top_performers};
pub use catalog::{affordable_purchases, assign_task, suitable_tasks, task_pay, weakest_domain};
pub use config::PopulationParams;
pub use error::AgentError;
pub use population::create_population;
pub use store::MinionStore;
pub use transition::{Transition, apply_transition, is_legal_status_change};
