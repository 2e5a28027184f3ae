//! The metric aggregator.
//!
//! [`compute_snapshot`] is a pure function of the minions it is given. It
//! keeps no state, so a snapshot can never be stale relative to the store it
//! was computed from.

use std::collections::BTreeMap;

use roster_types::{AggregateSnapshot, Minion, Shift, Specialty, Status};
use rust_decimal::Decimal;

/// The `n` highest lifetime earners, ties broken by id.
pub fn top_performers(minions: &[Minion], n: usize) -> Vec<&Minion> {
    let mut ranked: Vec<&Minion> = minions.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_earned
            .cmp(&a.total_earned)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(n);
    ranked
}

/// Summarise a population.
///
/// Every status, specialty and shift appears as a key even with a zero
/// count, so per-status counts always sum to the population.
pub fn compute_snapshot<'a>(minions: impl IntoIterator<Item = &'a Minion>) -> AggregateSnapshot {
    let mut by_status: BTreeMap<Status, u32> = Status::ALL.iter().map(|s| (*s, 0)).collect();
    let mut by_specialty: BTreeMap<Specialty, u32> =
        Specialty::ALL.iter().map(|s| (*s, 0)).collect();
    let mut by_shift: BTreeMap<Shift, u32> = Shift::ALL.iter().map(|s| (*s, 0)).collect();

    let mut population: u32 = 0;
    let mut total_credits: u64 = 0;
    let mut total_earned: u64 = 0;
    let mut tasks_completed: u64 = 0;
    let mut consciousness_sum = Decimal::ZERO;
    let mut energy_sum: u64 = 0;

    for minion in minions {
        population = population.saturating_add(1);
        total_credits = total_credits.saturating_add(minion.credits);
        total_earned = total_earned.saturating_add(minion.total_earned);
        tasks_completed = tasks_completed.saturating_add(minion.tasks_completed);
        consciousness_sum = consciousness_sum.saturating_add(minion.consciousness_level);
        energy_sum = energy_sum.saturating_add(u64::from(minion.energy));
        bump(&mut by_status, minion.status);
        bump(&mut by_specialty, minion.specialty);
        bump(&mut by_shift, minion.shift);
    }

    let active = by_status
        .get(&Status::Working)
        .copied()
        .unwrap_or(0)
        .saturating_add(by_status.get(&Status::Learning).copied().unwrap_or(0));

    let average_consciousness = consciousness_sum
        .checked_div(Decimal::from(population))
        .unwrap_or(Decimal::ZERO)
        .round_dp(2);
    let average_energy = energy_sum
        .checked_div(u64::from(population))
        .and_then(|avg| u32::try_from(avg).ok())
        .unwrap_or(0);

    AggregateSnapshot {
        population,
        total_credits,
        total_earned,
        tasks_completed,
        by_status,
        by_specialty,
        by_shift,
        active,
        average_consciousness,
        average_energy,
    }
}

fn bump<K: Ord>(counts: &mut BTreeMap<K, u32>, key: K) {
    let count = counts.entry(key).or_insert(0);
    *count = count.saturating_add(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::PopulationParams;
    use crate::population::create_population;

    fn population(size: u32) -> Vec<Minion> {
        let mut rng = StdRng::seed_from_u64(8);
        create_population(size, &PopulationParams::default(), &mut rng).unwrap()
    }

    #[test]
    fn totals_match_population() {
        let minions = population(30);
        let snapshot = compute_snapshot(&minions);
        assert_eq!(snapshot.population, 30);
        assert_eq!(
            snapshot.total_credits,
            minions.iter().map(|m| m.credits).sum::<u64>()
        );
        assert_eq!(snapshot.by_status.values().sum::<u32>(), 30);
        assert_eq!(snapshot.by_specialty.values().sum::<u32>(), 30);
        assert_eq!(snapshot.by_shift.values().sum::<u32>(), 30);
        assert_eq!(snapshot.count(Status::Idle), 30);
        assert_eq!(snapshot.active, 0);
    }

    #[test]
    fn empty_input_yields_zeroed_keys() {
        let snapshot = compute_snapshot(&Vec::<Minion>::new());
        assert_eq!(snapshot.population, 0);
        assert_eq!(snapshot.by_status.len(), Status::ALL.len());
        assert_eq!(snapshot.average_consciousness, Decimal::ZERO);
        assert_eq!(snapshot.average_energy, 0);
    }

    #[test]
    fn active_counts_working_and_learning() {
        let mut minions = population(4);
        if let Some(m) = minions.get_mut(0) {
            m.status = Status::Working;
        }
        if let Some(m) = minions.get_mut(1) {
            m.status = Status::Learning;
        }
        if let Some(m) = minions.get_mut(2) {
            m.status = Status::OnBreak;
        }
        let snapshot = compute_snapshot(&minions);
        assert_eq!(snapshot.active, 2);
        assert_eq!(snapshot.count(Status::OnBreak), 1);
        assert_eq!(snapshot.count(Status::Idle), 1);
    }

    #[test]
    fn averages_are_rounded() {
        let mut minions = population(3);
        for (m, (level, energy)) in minions
            .iter_mut()
            .zip([(10, 50), (20, 61), (21, 70)])
        {
            m.consciousness_level = Decimal::from(level);
            m.energy = energy;
        }
        let snapshot = compute_snapshot(&minions);
        assert_eq!(snapshot.average_consciousness, Decimal::new(1700, 2));
        assert_eq!(snapshot.average_energy, 60);
    }
}
