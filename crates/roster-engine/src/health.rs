//! Routes persistence outcomes into the operator state.
//!
//! The worker runs beside the tick loop and cannot write to the activity
//! log directly. Outcomes are recorded as persistence health and queued as
//! notices, which the loop appends before its next tick.

use std::sync::Arc;

use roster_core::operator::OperatorState;
use roster_db::{SaveObserver, SaveOutcome};
use roster_types::ActivityKind;

/// [`SaveObserver`] backed by the shared [`OperatorState`].
pub struct OperatorSaveObserver {
    operator: Arc<OperatorState>,
}

impl OperatorSaveObserver {
    /// Report outcomes to `operator`.
    pub const fn new(operator: Arc<OperatorState>) -> Self {
        Self { operator }
    }
}

impl SaveObserver for OperatorSaveObserver {
    fn on_outcome(&self, outcome: &SaveOutcome) {
        match outcome {
            SaveOutcome::Saved { tick, saved_at } => {
                let recovering = self.operator.persistence_health().consecutive_failures > 0;
                self.operator.record_save_success(*tick, *saved_at);
                let message = if recovering {
                    format!("Snapshot of tick {tick} saved, persistence recovered")
                } else {
                    format!("Snapshot of tick {tick} saved")
                };
                self.operator.push_notice(ActivityKind::Persistence, message);
            }
            SaveOutcome::Failed {
                tick,
                attempted_at,
                error,
            } => {
                self.operator.record_save_failure(error.clone(), *attempted_at);
                self.operator.push_notice(
                    ActivityKind::Fault,
                    format!("Snapshot of tick {tick} failed to save: {error}"),
                );
            }
        }
    }
}
