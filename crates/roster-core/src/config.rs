//! Configuration loading and typed config structures for the roster
//! simulation.
//!
//! The canonical configuration lives in `roster-config.yaml` at the project
//! root. Every field has a default, so an empty file (or no file at all)
//! yields a runnable configuration. [`RosterConfig::validate`] must pass
//! before anything is started.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use roster_agents::PopulationParams;
use roster_types::WorkCycle;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use tracing::warn;

/// Minimum tick interval the operator may set at runtime.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of its permitted range.
    #[error("invalid configuration: {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `roster-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RosterConfig {
    /// Seed, timing and simulated calendar.
    #[serde(default)]
    pub world: WorldConfig,

    /// Population size and starting balances.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Work/break rhythm per profile.
    #[serde(default)]
    pub work_cycles: WorkCyclesConfig,

    /// Named probabilities for every random branch.
    #[serde(default)]
    pub probabilities: ProbabilitiesConfig,

    /// Self-study sessions and mastery gains.
    #[serde(default)]
    pub learning: LearningConfig,

    /// Bonuses and savings goals.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Activity log bounds.
    #[serde(default)]
    pub activity: ActivityConfig,

    /// Snapshot cadence and location.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observer HTTP server.
    #[serde(default)]
    pub observer: ObserverConfig,
}

impl RosterConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment variables override YAML values:
    /// - `ROSTER_SNAPSHOT_PATH` overrides `persistence.path`
    /// - `ROSTER_OBSERVER_PORT` overrides `observer.port`
    ///
    /// The result is not validated; call [`RosterConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override selected values from the environment when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ROSTER_SNAPSHOT_PATH") {
            self.persistence.path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("ROSTER_OBSERVER_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.observer.port = port,
                Err(e) => warn!(value = %val, error = %e, "ignoring invalid ROSTER_OBSERVER_PORT"),
            }
        }
    }

    /// Check every value against its permitted range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population.size == 0 {
            return Err(invalid("population.size", "must be at least 1"));
        }
        if self.population.starting_credits_min > self.population.starting_credits_max {
            return Err(invalid(
                "population.starting_credits_min",
                "must not exceed starting_credits_max",
            ));
        }
        if self.population.max_tier == 0 {
            return Err(invalid("population.max_tier", "must be at least 1"));
        }
        if self.world.tick_interval_ms == 0 {
            return Err(invalid("world.tick_interval_ms", "must be at least 1"));
        }
        if self.world.minutes_per_tick == 0 {
            return Err(invalid("world.minutes_per_tick", "must be at least 1"));
        }
        if self.persistence.interval_ms == 0 {
            return Err(invalid("persistence.interval_ms", "must be at least 1"));
        }
        if self.activity.max_length == 0 {
            return Err(invalid("activity.max_length", "must be at least 1"));
        }
        if self.learning.session_minutes == 0 {
            return Err(invalid("learning.session_minutes", "must be at least 1"));
        }
        for (field, value) in [
            ("probabilities.task_completion", self.probabilities.task_completion),
            (
                "probabilities.autonomous_learning",
                self.probabilities.autonomous_learning,
            ),
            ("probabilities.spending_scale", self.probabilities.spending_scale),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("must be within [0, 1], got {value}")));
            }
        }
        for (field, value) in [
            ("learning.task_mastery_gain_max", self.learning.task_mastery_gain_max),
            ("learning.study_mastery_gain_max", self.learning.study_mastery_gain_max),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(invalid(field, "must not be negative"));
            }
        }
        for profile in WorkCycle::ALL {
            let cycle = self.work_cycles.for_profile(profile);
            if cycle.work_minutes().is_none_or(|m| m == 0) {
                return Err(invalid(
                    "work_cycles.work_hours",
                    format!("{profile:?} must be positive"),
                ));
            }
            if cycle.break_minutes().is_none_or(|m| m == 0) {
                return Err(invalid(
                    "work_cycles.break_hours",
                    format!("{profile:?} must be positive"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds between ticks (`tickIntervalMs`).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated minutes that pass per tick.
    #[serde(default = "default_minutes_per_tick")]
    pub minutes_per_tick: u32,

    /// Simulated time at tick 0.
    #[serde(default = "default_epoch")]
    pub epoch: DateTime<Utc>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            minutes_per_tick: default_minutes_per_tick(),
            epoch: default_epoch(),
        }
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Number of minions (`populationSize`).
    #[serde(default = "default_population_size")]
    pub size: u32,

    /// Lowest starting balance.
    #[serde(default = "default_starting_credits_min")]
    pub starting_credits_min: u64,

    /// Highest starting balance.
    #[serde(default = "default_starting_credits_max")]
    pub starting_credits_max: u64,

    /// Highest tier reachable through milestones.
    #[serde(default = "default_max_tier")]
    pub max_tier: u8,
}

impl PopulationConfig {
    /// Parameters for generating and maintaining the store.
    pub const fn params(&self) -> PopulationParams {
        PopulationParams {
            starting_credits_min: self.starting_credits_min,
            starting_credits_max: self.starting_credits_max,
            max_tier: self.max_tier,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            starting_credits_min: default_starting_credits_min(),
            starting_credits_max: default_starting_credits_max(),
            max_tier: default_max_tier(),
        }
    }
}

/// Work and break length of one profile, in simulated hours.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CycleHours {
    /// Hours worked before a break is due (`workCycleHours`).
    pub work_hours: Decimal,

    /// Length of the break (`breakCycleHours`).
    pub break_hours: Decimal,
}

impl CycleHours {
    fn new(work_tenths: i64, break_tenths: i64) -> Self {
        Self {
            work_hours: Decimal::new(work_tenths, 1),
            break_hours: Decimal::new(break_tenths, 1),
        }
    }

    /// Work length in whole simulated minutes.
    pub fn work_minutes(&self) -> Option<u32> {
        hours_to_minutes(self.work_hours)
    }

    /// Break length in whole simulated minutes.
    pub fn break_minutes(&self) -> Option<u32> {
        hours_to_minutes(self.break_hours)
    }
}

fn hours_to_minutes(hours: Decimal) -> Option<u32> {
    hours
        .checked_mul(Decimal::from(60_u32))?
        .floor()
        .to_u32()
}

/// Work cycle profiles and shift energy costs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkCyclesConfig {
    /// The standard profile.
    #[serde(default = "default_standard_cycle")]
    pub standard: CycleHours,

    /// The intensive profile.
    #[serde(default = "default_intensive_cycle")]
    pub intensive: CycleHours,

    /// The maintenance profile.
    #[serde(default = "default_maintenance_cycle")]
    pub maintenance: CycleHours,

    /// Energy spent when a shift starts.
    #[serde(default = "default_shift_start_energy_cost")]
    pub shift_start_energy_cost: u32,

    /// Energy restored when a break starts.
    #[serde(default = "default_break_energy_restore")]
    pub break_energy_restore: u32,
}

impl WorkCyclesConfig {
    /// Hours for the given profile.
    pub const fn for_profile(&self, profile: WorkCycle) -> &CycleHours {
        match profile {
            WorkCycle::Standard => &self.standard,
            WorkCycle::Intensive => &self.intensive,
            WorkCycle::Maintenance => &self.maintenance,
        }
    }
}

impl Default for WorkCyclesConfig {
    fn default() -> Self {
        Self {
            standard: default_standard_cycle(),
            intensive: default_intensive_cycle(),
            maintenance: default_maintenance_cycle(),
            shift_start_energy_cost: default_shift_start_energy_cost(),
            break_energy_restore: default_break_energy_restore(),
        }
    }
}

/// Probabilities of the optional branches, each in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbabilitiesConfig {
    /// Chance per working tick that the current task completes.
    #[serde(default = "default_task_completion")]
    pub task_completion: f64,

    /// Chance per idle tick (outside the shift) of starting self-study.
    #[serde(default = "default_autonomous_learning")]
    pub autonomous_learning: f64,

    /// Multiplier on a minion's spending propensity, per tick.
    #[serde(default = "default_spending_scale")]
    pub spending_scale: f64,
}

impl Default for ProbabilitiesConfig {
    fn default() -> Self {
        Self {
            task_completion: default_task_completion(),
            autonomous_learning: default_autonomous_learning(),
            spending_scale: default_spending_scale(),
        }
    }
}

/// Self-study and mastery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LearningConfig {
    /// Simulated length of a self-study session.
    #[serde(default = "default_session_minutes")]
    pub session_minutes: u32,

    /// Credits paid for finishing a session.
    #[serde(default = "default_initiative_credits")]
    pub initiative_credits: u64,

    /// Upper bound of the mastery gained per completed task.
    #[serde(default = "default_task_mastery_gain_max")]
    pub task_mastery_gain_max: Decimal,

    /// Upper bound of the mastery gained per study session.
    #[serde(default = "default_study_mastery_gain_max")]
    pub study_mastery_gain_max: Decimal,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            session_minutes: default_session_minutes(),
            initiative_credits: default_initiative_credits(),
            task_mastery_gain_max: default_task_mastery_gain_max(),
            study_mastery_gain_max: default_study_mastery_gain_max(),
        }
    }
}

/// Bonuses and savings goals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Credits paid per consciousness milestone.
    #[serde(default = "default_milestone_bonus")]
    pub milestone_bonus: u64,

    /// Savings bonus as a percentage of the goal.
    #[serde(default = "default_savings_bonus_pct")]
    pub savings_bonus_pct: u64,

    /// Percentage by which the goal grows after it is reached.
    #[serde(default = "default_savings_growth_pct")]
    pub savings_growth_pct: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            milestone_bonus: default_milestone_bonus(),
            savings_bonus_pct: default_savings_bonus_pct(),
            savings_growth_pct: default_savings_growth_pct(),
        }
    }
}

/// Activity log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivityConfig {
    /// Records retained (`maxActivityLogLength`).
    #[serde(default = "default_activity_max_length")]
    pub max_length: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            max_length: default_activity_max_length(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Whether snapshots are loaded and saved at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Real-time milliseconds between saves (`persistenceIntervalMs`).
    #[serde(default = "default_persistence_interval_ms")]
    pub interval_ms: u64,

    /// Snapshot file location.
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_persistence_interval_ms(),
            path: default_snapshot_path(),
        }
    }
}

/// Simulation boundary configuration.
///
/// A value of 0 for either field means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the run ends.
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the run ends.
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Observer server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether the observer server is started.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

fn default_world_name() -> String {
    "Solar Roster".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_minutes_per_tick() -> u32 {
    15
}

/// 2025-01-01T06:00:00Z, one hour before the morning shift.
fn default_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_711_200, 0).unwrap_or_default()
}

const fn default_population_size() -> u32 {
    100
}

const fn default_starting_credits_min() -> u64 {
    200
}

const fn default_starting_credits_max() -> u64 {
    700
}

const fn default_max_tier() -> u8 {
    5
}

fn default_standard_cycle() -> CycleHours {
    CycleHours::new(60, 15)
}

fn default_intensive_cycle() -> CycleHours {
    CycleHours::new(40, 20)
}

fn default_maintenance_cycle() -> CycleHours {
    CycleHours::new(80, 5)
}

const fn default_shift_start_energy_cost() -> u32 {
    2
}

const fn default_break_energy_restore() -> u32 {
    10
}

const fn default_task_completion() -> f64 {
    0.3
}

const fn default_autonomous_learning() -> f64 {
    0.2
}

const fn default_spending_scale() -> f64 {
    0.1
}

const fn default_session_minutes() -> u32 {
    60
}

const fn default_initiative_credits() -> u64 {
    10
}

fn default_task_mastery_gain_max() -> Decimal {
    Decimal::TWO
}

fn default_study_mastery_gain_max() -> Decimal {
    Decimal::from(3_u32)
}

const fn default_milestone_bonus() -> u64 {
    500
}

const fn default_savings_bonus_pct() -> u64 {
    10
}

const fn default_savings_growth_pct() -> u64 {
    50
}

const fn default_activity_max_length() -> usize {
    100
}

const fn default_persistence_interval_ms() -> u64 {
    30_000
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/roster-snapshot.json")
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

const fn default_true() -> bool {
    true
}
