//! Population generation.
//!
//! The shape of every minion is deterministic in its creation index (id,
//! name, shift, work cycle, specialties, role). The content is drawn from
//! documented ranges using the caller's RNG:
//!
//! | Field | Range |
//! |-------|-------|
//! | credits | `starting_credits_min..=starting_credits_max` |
//! | expertise | 10-59 |
//! | consciousness | 5-24 |
//! | evolution rate | 0.050-0.150 |
//! | work ethic | 0.60-1.00 |
//! | spending propensity | 0.00-1.00 |
//! | savings goal | 500-1499 |
//! | energy | 70-100 |
//! | mastery | primary 20-60, secondary 10-35, other 0-15 |

use std::collections::BTreeMap;

use rand::Rng;
use roster_types::{Minion, MinionId, Role, Shift, Specialty, Status, WorkCycle};
use rust_decimal::Decimal;

use crate::config::PopulationParams;
use crate::error::AgentError;

/// Name prefixes, cycled by creation index.
const NAME_PREFIXES: [&str; 50] = [
    "ATLAS", "NOVA", "TITAN", "ECHO", "PULSE", "ZETA", "ALPHA", "BETA", "GAMMA", "DELTA", "OMEGA",
    "SIGMA", "THETA", "LAMBDA", "QUANTUM", "PHOTON", "ELECTRON", "NEUTRON", "PROTON", "QUARK",
    "NEXUS", "VORTEX", "MATRIX", "CIPHER", "VECTOR", "PIXEL", "BINARY", "CODEC", "FLUX", "PRISM",
    "SPARK", "BOLT", "CHARGE", "CURRENT", "VOLTAGE", "WATT", "SOLAR", "HALO", "LUMINA", "RADIANT",
    "FUSION", "REACTOR", "CORE", "ENGINE", "DYNAMO", "TURBO", "ROCKET", "LASER", "BEAM", "RAYS",
];

/// Name suffixes, advanced once per full pass over the prefixes.
const NAME_SUFFIXES: [&str; 30] = [
    "X1", "V2", "PRO", "MAX", "PLUS", "ULTRA", "PRIME", "CORE", "FUSION", "MATRIX", "ALPHA",
    "BETA", "GAMMA", "DELTA", "OMEGA", "ZERO", "ONE", "TWO", "NINE", "TEN", "STAR", "NOVA", "MOON",
    "SUN", "FIRE", "ICE", "STORM", "WIND", "EARTH", "WATER",
];

/// Offset from the primary specialty to the secondary one.
const SECONDARY_OFFSET: u32 = 3;

/// Generate `size` minions, indexed from 1.
///
/// # Errors
///
/// Returns [`AgentError::EmptyPopulation`] if `size` is 0.
pub fn create_population(
    size: u32,
    params: &PopulationParams,
    rng: &mut impl Rng,
) -> Result<Vec<Minion>, AgentError> {
    if size == 0 {
        return Err(AgentError::EmptyPopulation);
    }
    let capacity = usize::try_from(size).unwrap_or(0);
    let mut minions = Vec::with_capacity(capacity);
    for index in 1..=size {
        minions.push(generate_minion(index, params, rng));
    }
    Ok(minions)
}

/// Build one minion for the given 1-based creation index.
pub fn generate_minion(index: u32, params: &PopulationParams, rng: &mut impl Rng) -> Minion {
    let specialty = cycle(&Specialty::ALL, index).unwrap_or(Specialty::SolarPanels);
    let secondary_specialty = cycle(&Specialty::ALL, index.saturating_add(SECONDARY_OFFSET))
        .unwrap_or(Specialty::Inverters);

    let credits_low = params.starting_credits_min.min(params.starting_credits_max);
    let credits_high = params.starting_credits_max.max(params.starting_credits_min);

    let mut mastery = BTreeMap::new();
    for domain in Specialty::ALL {
        let hundredths: i64 = if domain == specialty {
            rng.random_range(2_000..=6_000)
        } else if domain == secondary_specialty {
            rng.random_range(1_000..=3_500)
        } else {
            rng.random_range(0..=1_500)
        };
        mastery.insert(domain, Decimal::new(hundredths, 2));
    }

    Minion {
        id: MinionId::from_index(index),
        name: generate_name(index),
        tier: 1,
        role: role_for(index),
        specialty,
        secondary_specialty,
        shift: cycle(&Shift::ALL, index).unwrap_or(Shift::Morning),
        work_cycle: cycle(&WorkCycle::ALL, index).unwrap_or(WorkCycle::Standard),
        status: Status::Idle,
        credits: rng.random_range(credits_low..=credits_high),
        total_earned: 0,
        minutes_worked_in_shift: 0,
        minutes_in_status: 0,
        energy: rng.random_range(70..=100),
        needs_break: false,
        consciousness_level: Decimal::from(rng.random_range(5_u32..25)),
        evolution_rate: Decimal::new(rng.random_range(50..=150), 3),
        expertise_level: rng.random_range(10..60),
        mastery,
        work_ethic: Decimal::new(rng.random_range(60..=100), 2),
        spending_propensity: Decimal::new(rng.random_range(0..=100), 2),
        savings_goal: rng.random_range(500..1_500),
        current_task: None,
        learning_focus: None,
        tasks_completed: 0,
        breaks_taken: 0,
    }
}

/// Generated display name, e.g. `NOVA-X101`.
pub fn generate_name(index: u32) -> String {
    let prefix = cycle(&NAME_PREFIXES, index).unwrap_or("UNIT");
    let pass = index.checked_div(50).unwrap_or(0);
    let suffix = cycle(&NAME_SUFFIXES, pass).unwrap_or("X1");
    format!("{prefix}-{suffix}{index:02}")
}

/// Every tenth minion coordinates, every third specialises.
const fn role_for(index: u32) -> Role {
    if matches!(index.checked_rem(10), Some(0)) {
        Role::Coordinator
    } else if matches!(index.checked_rem(3), Some(0)) {
        Role::Specialist
    } else {
        Role::Operator
    }
}

/// Round-robin pick from a fixed table.
fn cycle<T: Copy>(items: &[T], index: u32) -> Option<T> {
    let index = usize::try_from(index).ok()?;
    let slot = index.checked_rem(items.len())?;
    items.get(slot).copied()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn zero_population_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = create_population(0, &PopulationParams::default(), &mut rng);
        assert_eq!(result.unwrap_err(), AgentError::EmptyPopulation);
    }

    #[test]
    fn population_has_requested_size_and_unique_ids() {
        let mut rng = StdRng::seed_from_u64(1);
        let minions = create_population(100, &PopulationParams::default(), &mut rng).unwrap();
        assert_eq!(minions.len(), 100);
        let ids: BTreeSet<_> = minions.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn every_minion_starts_idle_within_ranges() {
        let mut rng = StdRng::seed_from_u64(99);
        let params = PopulationParams::default();
        for minion in create_population(60, &params, &mut rng).unwrap() {
            assert_eq!(minion.status, Status::Idle);
            assert_eq!(minion.tier, 1);
            assert!((200..=700).contains(&minion.credits));
            assert!((70..=100).contains(&minion.energy));
            assert!((10..60).contains(&minion.expertise_level));
            assert!(minion.consciousness_level >= Decimal::from(5));
            assert!(minion.consciousness_level < Decimal::from(25));
            assert_eq!(minion.mastery.len(), Specialty::ALL.len());
            let primary = minion.mastery_of(minion.specialty);
            assert!(primary >= Decimal::from(20) && primary <= Decimal::from(60));
        }
    }

    #[test]
    fn same_seed_same_population() {
        let params = PopulationParams::default();
        let a = create_population(25, &params, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = create_population(25, &params, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn shape_is_round_robin() {
        let mut rng = StdRng::seed_from_u64(3);
        let minions = create_population(6, &PopulationParams::default(), &mut rng).unwrap();
        let shifts: Vec<_> = minions.iter().map(|m| m.shift).collect();
        assert_eq!(
            shifts,
            vec![
                Shift::Afternoon,
                Shift::Night,
                Shift::Morning,
                Shift::Afternoon,
                Shift::Night,
                Shift::Morning
            ]
        );
        assert_eq!(minions.get(2).map(|m| m.role), Some(Role::Specialist));
    }

    #[test]
    fn names_follow_pattern() {
        assert_eq!(generate_name(1), "NOVA-X101");
        assert_eq!(generate_name(50), "ATLAS-V250");
    }

    #[test]
    fn tenth_minion_coordinates() {
        assert_eq!(role_for(10), Role::Coordinator);
        assert_eq!(role_for(30), Role::Coordinator);
        assert_eq!(role_for(9), Role::Specialist);
        assert_eq!(role_for(7), Role::Operator);
    }
}
