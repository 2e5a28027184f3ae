//! Operator control state for runtime simulation management.
//!
//! Shared between the run loop, the persistence worker and the observer
//! API. The operator can pause/resume, change tick speed, reset the
//! population and stop the run.
//! The persistence worker reports save outcomes here; the run loop turns
//! them into activity records before the next tick.
//!
//! Control flags use atomics so the tick loop never takes a lock to read
//! them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use roster_types::ActivityKind;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::config::{MIN_TICK_INTERVAL_MS, SimulationBoundsConfig};

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// A stop was requested (operator, signal, or [`OperatorState::request_stop`]).
    OperatorStop,
}

/// A system message waiting to be written to the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Record category.
    pub kind: ActivityKind,
    /// Human-readable description.
    pub message: String,
}

/// Outcome history of the persistence adapter, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceHealth {
    /// Wall-clock time of the last successful save.
    pub last_success: Option<DateTime<Utc>>,
    /// Tick captured by the last successful save.
    pub last_saved_tick: Option<u64>,
    /// Description of the last failure.
    pub last_error: Option<String>,
    /// Wall-clock time of the last failure.
    pub last_error_at: Option<DateTime<Utc>>,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

/// Shared operator control state, held in an `Arc`.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the simulation is currently paused.
    paused: AtomicBool,

    /// Wakes the tick loop when resumed or stopped while paused.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Whether a population reset is waiting for the next tick.
    reset_requested: AtomicBool,

    /// Wakes the tick loop out of its inter-tick sleep on stop.
    stop_notify: Notify,

    /// Current tick interval in milliseconds (runtime-adjustable).
    tick_interval_ms: AtomicU64,

    /// Last completed tick, mirrored for status reads.
    current_tick: AtomicU64,

    /// Wall-clock time when the simulation started.
    started_at: DateTime<Utc>,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,

    /// System messages awaiting the next tick.
    notices: Mutex<Vec<Notice>>,

    /// Persistence outcome history.
    persistence: Mutex<PersistenceHealth>,

    /// Reason the simulation ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create a new operator state from configuration.
    pub fn new(tick_interval_ms: u64, bounds: &SimulationBoundsConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            current_tick: AtomicU64::new(0),
            started_at: Utc::now(),
            max_ticks: bounds.max_ticks,
            max_real_time_seconds: bounds.max_real_time_seconds,
            notices: Mutex::new(Vec::new()),
            persistence: Mutex::new(PersistenceHealth::default()),
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the simulation is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the simulation. The tick loop will sleep until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the simulation and wake the tick loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the simulation is resumed or a stop is requested.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. The in-flight tick, if any, completes first.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
        self.resume_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolves once a stop has been requested.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.stop_notify.notified().await;
        }
    }

    /// Record the reason the simulation ended.
    pub fn set_end_reason(&self, reason: SimulationEndReason) {
        *self
            .end_reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reason);
    }

    /// The reason the simulation ended, if it has.
    pub fn end_reason(&self) -> Option<SimulationEndReason> {
        *self
            .end_reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    /// Ask the loop to regenerate the population before its next tick.
    /// Repeated requests before then collapse into one.
    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
    }

    /// Consume a pending reset request.
    pub fn take_reset_request(&self) -> bool {
        self.reset_requested.swap(false, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds. Must be at least 100ms.
    ///
    /// Returns the previous interval on success, or `None` if the value was
    /// rejected.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Mirror the last completed tick.
    pub fn set_current_tick(&self, tick: u64) {
        self.current_tick.store(tick, Ordering::Release);
    }

    /// Last completed tick.
    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Returns `true` if `max_ticks > 0` and `current_tick >= max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Returns `true` if `max_real_time_seconds > 0` and that many seconds
    /// have elapsed since start.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since simulation start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Get the configured max ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Get the configured max real-time seconds.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    // -----------------------------------------------------------------------
    // Notices and persistence health
    // -----------------------------------------------------------------------

    /// Queue a system message for the activity log.
    pub fn push_notice(&self, kind: ActivityKind, message: impl Into<String>) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notice {
                kind,
                message: message.into(),
            });
    }

    /// Take every queued notice, oldest first.
    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Record a successful save of `tick` at `at`.
    pub fn record_save_success(&self, tick: u64, at: DateTime<Utc>) {
        let mut health = self
            .persistence
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        health.last_success = Some(at);
        health.last_saved_tick = Some(tick);
        health.consecutive_failures = 0;
    }

    /// Record a failed save at `at`.
    pub fn record_save_failure(&self, error: impl Into<String>, at: DateTime<Utc>) {
        let mut health = self
            .persistence
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        health.last_error = Some(error.into());
        health.last_error_at = Some(at);
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);
    }

    /// Current persistence outcome history.
    pub fn persistence_health(&self) -> PersistenceHealth {
        self.persistence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// JSON-serializable status for the operator API.
    pub fn status(&self, population: u32) -> SimulationStatus {
        SimulationStatus {
            tick: self.current_tick(),
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            max_ticks: self.max_ticks,
            max_real_time_seconds: self.max_real_time_seconds,
            population,
            end_reason: self.end_reason(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// JSON-serializable status of the simulation for the operator API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Last completed tick.
    pub tick: u64,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Configured maximum ticks (0 = unlimited).
    pub max_ticks: u64,
    /// Configured maximum real-time seconds (0 = unlimited).
    pub max_real_time_seconds: u64,
    /// Number of minions.
    pub population: u32,
    /// The reason the simulation ended, if applicable.
    pub end_reason: Option<SimulationEndReason>,
    /// ISO 8601 timestamp of when the simulation started.
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbounded() -> SimulationBoundsConfig {
        SimulationBoundsConfig::default()
    }

    #[test]
    fn initial_state_is_not_paused() {
        let state = OperatorState::new(1000, &unbounded());
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert_eq!(state.end_reason(), None);
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new(1000, &unbounded());
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn set_tick_interval() {
        let state = OperatorState::new(1000, &unbounded());
        assert_eq!(state.set_tick_interval_ms(2000), Some(1000));
        assert_eq!(state.tick_interval_ms(), 2000);
    }

    #[test]
    fn reject_sub_100ms_interval() {
        let state = OperatorState::new(1000, &unbounded());
        assert!(state.set_tick_interval_ms(50).is_none());
        assert_eq!(state.tick_interval_ms(), 1000);
    }

    #[test]
    fn reset_requests_are_taken_once() {
        let state = OperatorState::new(1000, &unbounded());
        assert!(!state.take_reset_request());
        state.request_reset();
        state.request_reset();
        assert!(state.take_reset_request());
        assert!(!state.take_reset_request());
    }

    #[test]
    fn tick_limit() {
        let bounds = SimulationBoundsConfig {
            max_ticks: 100,
            max_real_time_seconds: 0,
        };
        let state = OperatorState::new(1000, &bounds);
        assert!(!state.tick_limit_reached(99));
        assert!(state.tick_limit_reached(100));
        assert!(!OperatorState::new(1000, &unbounded()).tick_limit_reached(u64::MAX));
    }

    #[test]
    fn time_limit_zero_means_unlimited() {
        let state = OperatorState::new(1000, &unbounded());
        assert!(!state.time_limit_reached());
    }

    #[test]
    fn notices_drain_in_order() {
        let state = OperatorState::new(1000, &unbounded());
        state.push_notice(ActivityKind::Persistence, "first");
        state.push_notice(ActivityKind::Fault, "second");
        let notices = state.drain_notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices.first().map(|n| n.message.as_str()), Some("first"));
        assert!(state.drain_notices().is_empty());
    }

    #[test]
    fn save_outcomes_update_health() {
        let state = OperatorState::new(1000, &unbounded());
        let at = Utc::now();
        state.record_save_failure("disk full", at);
        state.record_save_failure("disk full", at);
        assert_eq!(state.persistence_health().consecutive_failures, 2);
        state.record_save_success(12, at);
        let health = state.persistence_health();
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.last_saved_tick, Some(12));
        assert_eq!(health.last_error.as_deref(), Some("disk full"));
    }

    #[tokio::test]
    async fn stop_releases_a_paused_loop() {
        let state = OperatorState::new(1000, &unbounded());
        state.pause();
        state.request_stop();
        state.wait_if_paused().await;
        state.stopped().await;
        assert!(state.is_stop_requested());
    }
}
