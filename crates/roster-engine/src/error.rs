//! Error types for the roster engine.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and simulation execution.

use roster_core::config::ConfigError;
use roster_core::runner::RunnerError;
use roster_core::tick::TickError;

/// Top-level error for the roster engine.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration is invalid. The system refuses to start.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Building a fresh simulation state failed.
    #[error("initialization error: {source}")]
    Init {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: RunnerError,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },

    /// `start` was called on a system that is already running.
    #[error("system is already running")]
    AlreadyRunning,

    /// `stop` or `wait` was called on a system that is not running.
    #[error("system is not running")]
    NotRunning,
}
