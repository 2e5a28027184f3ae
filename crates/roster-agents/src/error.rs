//! Error types for the roster-agents crate.
//!
//! All store operations return typed errors rather than panicking. A failed
//! operation never leaves a minion partially modified.

use roster_types::{MinionId, Status};

/// Errors that can occur during minion store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// No minion with the given id exists in the store.
    #[error("minion not found: {0}")]
    MinionNotFound(MinionId),

    /// The requested transition is not legal from the minion's status.
    #[error("invalid transition {transition} for {minion_id} in status {from:?}")]
    InvalidTransition {
        /// The minion the transition was aimed at.
        minion_id: MinionId,
        /// Status the minion was in when the transition was requested.
        from: Status,
        /// Name of the rejected transition.
        transition: &'static str,
    },

    /// A spend would have driven the balance below zero.
    #[error("insufficient credits for {minion_id}: wanted {requested} but only have {available}")]
    InsufficientCredits {
        /// The minion attempting to spend.
        minion_id: MinionId,
        /// Credits requested.
        requested: u64,
        /// Credits held.
        available: u64,
    },

    /// A precondition other than status failed (e.g. savings goal not met).
    #[error("precondition failed for {minion_id}: {reason}")]
    PreconditionFailed {
        /// The minion concerned.
        minion_id: MinionId,
        /// What was not satisfied.
        reason: String,
    },

    /// A progress amount was negative.
    #[error("invalid amount: {context}")]
    InvalidAmount {
        /// Description of the offending value.
        context: String,
    },

    /// Population generation was asked for zero minions.
    #[error("population size must be at least 1")]
    EmptyPopulation,

    /// Two minions in a restored population share an id.
    #[error("duplicate minion id: {0}")]
    DuplicateId(MinionId),

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}
