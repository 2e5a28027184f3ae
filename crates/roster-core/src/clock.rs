//! Simulated clock.
//!
//! The tick counter is the source of truth. Simulated wall time is derived
//! from it as `epoch + tick * minutes_per_tick`, never stored separately,
//! so two runs with the same configuration agree on every timestamp.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Simulated time left the representable range.
    #[error("simulated time out of range at tick {tick}")]
    TimeOverflow {
        /// Tick at which the conversion failed.
        tick: u64,
    },

    /// Invalid clock configuration (e.g. zero minutes per tick).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Clock mapping ticks to simulated time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimClock {
    /// Last completed tick (0 before the first tick).
    tick: u64,
    /// Simulated time at tick 0.
    epoch: DateTime<Utc>,
    /// Simulated minutes per tick.
    minutes_per_tick: u32,
}

impl SimClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `minutes_per_tick` is 0.
    pub fn new(epoch: DateTime<Utc>, minutes_per_tick: u32) -> Result<Self, ClockError> {
        Self::from_parts(0, epoch, minutes_per_tick)
    }

    /// Create a clock at an arbitrary tick (state restoration).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `minutes_per_tick` is 0.
    pub fn from_parts(
        tick: u64,
        epoch: DateTime<Utc>,
        minutes_per_tick: u32,
    ) -> Result<Self, ClockError> {
        if minutes_per_tick == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "minutes_per_tick must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            epoch,
            minutes_per_tick,
        })
    }

    /// Advance by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would overflow.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Last completed tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time at tick 0.
    pub const fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Simulated minutes per tick.
    pub const fn minutes_per_tick(&self) -> u32 {
        self.minutes_per_tick
    }

    /// Simulated time at the current tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TimeOverflow`] if the time is not representable.
    pub fn now(&self) -> Result<DateTime<Utc>, ClockError> {
        let overflow = || ClockError::TimeOverflow { tick: self.tick };
        let minutes = self
            .tick
            .checked_mul(u64::from(self.minutes_per_tick))
            .and_then(|m| i64::try_from(m).ok())
            .ok_or_else(overflow)?;
        let offset = TimeDelta::try_minutes(minutes).ok_or_else(overflow)?;
        self.epoch.checked_add_signed(offset).ok_or_else(overflow)
    }

    /// Simulated hour of day (0-23) at the current tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TimeOverflow`] if the time is not representable.
    pub fn hour_of_day(&self) -> Result<u32, ClockError> {
        Ok(self.now()?.hour())
    }
}
