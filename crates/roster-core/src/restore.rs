//! Rebuilding simulation state from a persisted snapshot.
//!
//! Only the minions, the tick and the activity are taken from the
//! document. The aggregate it carries is ignored and recomputed from the
//! minions on the next view. A snapshot that fails any check here is
//! treated by the caller as if no snapshot existed.

use rand::SeedableRng;
use rand::rngs::StdRng;
use roster_agents::{AgentError, MinionStore};
use roster_types::{Minion, MinionId, PersistedState};
use rust_decimal::Decimal;
use tracing::info;

use crate::activity::ActivityLog;
use crate::clock::{ClockError, SimClock};
use crate::config::RosterConfig;
use crate::tick::{SimulationState, TickRules};

/// Why a snapshot cannot be restored.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// The snapshot holds no minions.
    #[error("snapshot contains no minions")]
    Empty,

    /// The snapshot population differs from the configured size.
    #[error("snapshot has {found} minions, configuration expects {expected}")]
    PopulationMismatch {
        /// Configured population size.
        expected: u32,
        /// Minions in the snapshot.
        found: usize,
    },

    /// A minion id does not follow the `MINION-nnn` pattern.
    #[error("malformed minion id {0}")]
    MalformedId(MinionId),

    /// A level is outside its permitted range.
    #[error("{minion_id}: {field} out of range")]
    OutOfRange {
        /// The offending minion.
        minion_id: MinionId,
        /// Field that failed the check.
        field: &'static str,
    },

    /// The store rejected the population (duplicate ids).
    #[error("store rejected snapshot: {source}")]
    Store {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The clock could not be rebuilt.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Check a snapshot against the configuration without building anything.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_snapshot(
    snapshot: &PersistedState,
    config: &RosterConfig,
) -> Result<(), RestoreError> {
    if snapshot.entities.is_empty() {
        return Err(RestoreError::Empty);
    }
    let expected = config.population.size;
    if usize::try_from(expected).ok() != Some(snapshot.entities.len()) {
        return Err(RestoreError::PopulationMismatch {
            expected,
            found: snapshot.entities.len(),
        });
    }
    for minion in &snapshot.entities {
        check_minion(minion, config.population.max_tier)?;
    }
    Ok(())
}

fn check_minion(minion: &Minion, max_tier: u8) -> Result<(), RestoreError> {
    if !minion.id.is_well_formed() {
        return Err(RestoreError::MalformedId(minion.id.clone()));
    }
    let out_of_range = |field| RestoreError::OutOfRange {
        minion_id: minion.id.clone(),
        field,
    };
    let hundred = Decimal::ONE_HUNDRED;
    if minion.tier == 0 || minion.tier > max_tier {
        return Err(out_of_range("tier"));
    }
    if minion.energy > 100 {
        return Err(out_of_range("energy"));
    }
    if minion.expertise_level > 100 {
        return Err(out_of_range("expertiseLevel"));
    }
    if !within(minion.consciousness_level, hundred) {
        return Err(out_of_range("consciousnessLevel"));
    }
    if !within(minion.work_ethic, Decimal::ONE) {
        return Err(out_of_range("workEthic"));
    }
    if !within(minion.spending_propensity, Decimal::ONE) {
        return Err(out_of_range("spendingPropensity"));
    }
    if minion.evolution_rate.is_sign_negative() {
        return Err(out_of_range("evolutionRate"));
    }
    if minion.mastery.values().any(|level| !within(*level, hundred)) {
        return Err(out_of_range("mastery"));
    }
    Ok(())
}

fn within(value: Decimal, ceiling: Decimal) -> bool {
    value >= Decimal::ZERO && value <= ceiling
}

/// Rebuild simulation state from a snapshot.
///
/// The clock resumes at the snapshot's tick. The RNG is reseeded from the
/// configured seed and that tick, so a restored run is reproducible too.
///
/// # Errors
///
/// Returns a [`RestoreError`] if the snapshot fails validation.
pub fn restore_state(
    snapshot: PersistedState,
    config: &RosterConfig,
) -> Result<SimulationState, RestoreError> {
    validate_snapshot(&snapshot, config)?;
    let tick = snapshot.tick;
    let store = MinionStore::restore(snapshot.entities, &config.population.params())?;
    let clock = SimClock::from_parts(tick, config.world.epoch, config.world.minutes_per_tick)?;
    let activity = ActivityLog::from_records(snapshot.activity, config.activity.max_length);
    info!(
        tick,
        population = store.len(),
        saved_at = %snapshot.saved_at,
        "Restored population from snapshot"
    );
    Ok(SimulationState {
        clock,
        store,
        activity,
        rng: StdRng::seed_from_u64(config.world.seed ^ tick),
        rules: TickRules::from_config(config),
    })
}
