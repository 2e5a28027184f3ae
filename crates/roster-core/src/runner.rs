//! Simulation loop runner with operator controls.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the tick loop with support for:
//!
//! - **Bounded simulation**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: operator can halt and continue the tick loop
//! - **Variable tick speed**: tick interval adjustable at runtime
//! - **Reset**: the population is regenerated before the next tick
//! - **Clean stop**: the in-flight tick always completes; the inter-tick
//!   sleep is cut short
//!
//! Ticks never overlap: the next one is only scheduled after the previous
//! one and its callback have returned.

use std::sync::Arc;

use tokio::time::{Duration, sleep};
use tracing::{info, warn};

use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Number of ticks executed by this run.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
///
/// The engine uses this to publish a fresh view and broadcast the tick
/// summary. It runs inside the loop, so it must not block.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably (the
/// clock ran out of range).
pub async fn run_simulation(
    state: &mut SimulationState,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        start_tick = state.clock.tick(),
        population = state.store.len(),
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Simulation starting"
    );

    loop {
        // --- Check pause ---
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            return Ok(finish(
                operator,
                SimulationEndReason::OperatorStop,
                last_summary,
                total_ticks,
            ));
        }

        // --- Check time limit (before tick) ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            return Ok(finish(
                operator,
                SimulationEndReason::MaxRealTimeReached,
                last_summary,
                total_ticks,
            ));
        }

        // --- Carry queued notices into the log ---
        for notice in operator.drain_notices() {
            if let Err(err) = state.record_system(notice.kind, notice.message) {
                warn!(error = %err, "Dropped operator notice");
            }
        }

        // --- Apply a pending reset ---
        if operator.take_reset_request()
            && let Err(err) = state.reset()
        {
            warn!(error = %err, "Population reset failed");
        }

        // --- Execute tick ---
        let summary = tick::run_tick(state)?;
        total_ticks = total_ticks.saturating_add(1);
        operator.set_current_tick(summary.tick);

        // --- Notify callback ---
        callback.on_tick(&summary, state);

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            return Ok(finish(
                operator,
                SimulationEndReason::MaxTicksReached,
                Some(summary),
                total_ticks,
            ));
        }

        last_summary = Some(summary);

        // --- Sleep for tick interval, waking early on stop ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::select! {
                () = sleep(Duration::from_millis(interval_ms)) => {}
                () = operator.stopped() => {}
            }
        }
    }
}

fn finish(
    operator: &OperatorState,
    reason: SimulationEndReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> SimulationResult {
    operator.set_end_reason(reason);
    SimulationResult {
        end_reason: reason,
        final_summary,
        total_ticks,
    }
}

/// Log the simulation end sequence.
///
/// Called after [`run_simulation`] returns, before the final save.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            total_credits = summary.aggregate.total_credits,
            tasks_completed = summary.aggregate.tasks_completed,
            active = summary.aggregate.active,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roster_types::ActivityKind;

    use super::*;
    use crate::config::{RosterConfig, SimulationBoundsConfig};

    fn make_simulation_state() -> SimulationState {
        let mut config = RosterConfig::default();
        config.population.size = 6;
        SimulationState::generate(&config).unwrap()
    }

    fn bounds(max_ticks: u64) -> SimulationBoundsConfig {
        SimulationBoundsConfig {
            max_ticks,
            max_real_time_seconds: 0,
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut state = make_simulation_state();
        let operator = Arc::new(OperatorState::new(0, &bounds(5)));
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut state, &operator, &mut cb)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(operator.current_tick(), 5);
        assert_eq!(
            operator.end_reason(),
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn operator_stop() {
        let mut state = make_simulation_state();
        let operator = Arc::new(OperatorState::new(0, &bounds(0)));
        operator.request_stop();
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut state, &operator, &mut cb)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
    }

    #[tokio::test]
    async fn tick_callback_is_called() {
        struct CountingCallback {
            count: u64,
        }

        impl TickCallback for CountingCallback {
            fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {
                self.count = self.count.saturating_add(1);
            }
        }

        let mut state = make_simulation_state();
        let operator = Arc::new(OperatorState::new(0, &bounds(3)));
        let mut cb = CountingCallback { count: 0 };

        let result = run_simulation(&mut state, &operator, &mut cb)
            .await
            .unwrap();

        assert_eq!(result.total_ticks, 3);
        assert_eq!(cb.count, 3);
    }

    #[tokio::test]
    async fn notices_reach_the_activity_log() {
        let mut state = make_simulation_state();
        let operator = Arc::new(OperatorState::new(0, &bounds(1)));
        operator.push_notice(ActivityKind::Fault, "Snapshot save failed: disk full");
        let mut cb = NoOpCallback;

        run_simulation(&mut state, &operator, &mut cb)
            .await
            .unwrap();

        assert!(
            state
                .activity
                .to_vec()
                .iter()
                .any(|r| r.kind == ActivityKind::Fault && r.entity_id.is_none())
        );
    }

    #[tokio::test]
    async fn pending_reset_runs_before_the_next_tick() {
        let mut state = make_simulation_state();
        let operator = Arc::new(OperatorState::new(0, &bounds(1)));
        operator.request_reset();
        let mut cb = NoOpCallback;

        run_simulation(&mut state, &operator, &mut cb)
            .await
            .unwrap();

        assert!(!operator.take_reset_request());
        assert_eq!(state.store.len(), 6);
        let resets: Vec<u64> = state
            .activity
            .to_vec()
            .iter()
            .filter(|r| r.kind == ActivityKind::Operator)
            .map(|r| r.tick)
            .collect();
        assert_eq!(resets, vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_the_tick_sleep() {
        let mut state = make_simulation_state();
        let operator = Arc::new(OperatorState::new(60_000, &bounds(0)));
        let stopper = Arc::clone(&operator);
        tokio::spawn(async move {
            sleep(Duration::from_millis(500)).await;
            stopper.request_stop();
        });
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut state, &operator, &mut cb)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 1);
    }
}
