//! Store-level invariants exercised through the public API.
//!
//! Drives a population through many randomly chosen transitions, legal or
//! not, and checks after each step that balances stay non-negative, that
//! the population is constant, and that the aggregate agrees with the store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use roster_agents::{
    AgentError, MinionStore, PopulationParams, Transition, compute_snapshot,
    is_legal_status_change,
};
use roster_types::{MinionId, PurchaseItem, Specialty, Status, TaskKind};
use rust_decimal::Decimal;

fn random_transition(rng: &mut StdRng) -> Transition {
    let options = [
        Transition::StartShift {
            task: TaskKind::ProductComparison,
            energy_cost: 2,
        },
        Transition::Work { minutes: 30 },
        Transition::CompleteTask {
            credits: 40,
            mastery_gain: Decimal::ONE,
            next_task: TaskKind::SpecSheetProcessing,
        },
        Transition::EndShift,
        Transition::BeginBreak { energy_restored: 10 },
        Transition::EndBreak,
        Transition::BeginStudy {
            domain: Specialty::Inverters,
        },
        Transition::FinishStudy {
            mastery_gain: Decimal::ONE,
            initiative_credits: 10,
        },
        Transition::Elapse { minutes: 15 },
        Transition::Purchase {
            item: PurchaseItem::ConsciousnessEnhancer,
        },
        Transition::Purchase {
            item: PurchaseItem::EnergyBooster,
        },
        Transition::Promote,
    ];
    options.choose(rng).cloned().unwrap()
}

#[test]
fn random_walk_preserves_invariants() {
    let mut rng = StdRng::seed_from_u64(2024);
    let params = PopulationParams::default();
    let mut store = MinionStore::generate(12, &params, &mut rng).unwrap();
    let ids = store.ids();

    for _ in 0..2_000 {
        let id = ids.choose(&mut rng).unwrap().clone();
        let transition = random_transition(&mut rng);
        let before = store.get(&id).unwrap().clone();
        let outcome = store.apply(&id, &transition).map(|after| after.status);
        match outcome {
            Ok(status) => {
                if status != before.status {
                    assert!(is_legal_status_change(before.status, status));
                }
            }
            Err(_) => assert_eq!(store.get(&id).unwrap(), &before),
        }

        let snapshot = compute_snapshot(store.all());
        assert_eq!(snapshot.population, 12);
        assert_eq!(
            snapshot.total_credits,
            store.all().iter().map(|m| m.credits).sum::<u64>()
        );
        assert_eq!(
            Status::ALL.iter().map(|s| snapshot.count(*s)).sum::<u32>(),
            12
        );
        assert!(store.all().iter().all(|m| m.tier <= params.max_tier));
    }
}

#[test]
fn on_break_rejects_everything_but_end_break() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut store = MinionStore::generate(1, &PopulationParams::default(), &mut rng).unwrap();
    let id = MinionId::from_index(1);
    store
        .apply(
            &id,
            &Transition::StartShift {
                task: TaskKind::ProductComparison,
                energy_cost: 2,
            },
        )
        .unwrap();
    store
        .apply(&id, &Transition::BeginBreak { energy_restored: 10 })
        .unwrap();

    for transition in [
        Transition::StartShift {
            task: TaskKind::ProductComparison,
            energy_cost: 2,
        },
        Transition::BeginStudy {
            domain: Specialty::Batteries,
        },
        Transition::EndShift,
    ] {
        let err = store.apply(&id, &transition).unwrap_err();
        assert!(matches!(
            err,
            AgentError::InvalidTransition {
                from: Status::OnBreak,
                ..
            }
        ));
    }
    let idle = store.apply(&id, &Transition::EndBreak).unwrap();
    assert_eq!(idle.status, Status::Idle);
}

#[test]
fn single_minion_population_is_valid() {
    let mut rng = StdRng::seed_from_u64(1);
    let store = MinionStore::generate(1, &PopulationParams::default(), &mut rng).unwrap();
    let snapshot = compute_snapshot(store.all());
    assert_eq!(snapshot.population, 1);
    assert_eq!(snapshot.count(Status::Idle), 1);
}
