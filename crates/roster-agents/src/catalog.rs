//! Task assignment, pay, purchases, and study focus.
//!
//! Pure helpers over the catalogs in `roster-types`. Randomness is always
//! supplied by the caller so outcomes are reproducible under a fixed seed.

use rand::Rng;
use rand::seq::IndexedRandom;
use roster_types::{Difficulty, Minion, PurchaseItem, Specialty, TaskKind};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Expertise above which easy tasks are no longer assigned.
const EASY_TASK_CEILING: u32 = 40;

/// Expertise below which hard tasks are not assigned.
const HARD_TASK_FLOOR: u32 = 30;

/// Tasks suited to the given expertise level.
pub fn suitable_tasks(expertise: u32) -> Vec<TaskKind> {
    TaskKind::ALL
        .into_iter()
        .filter(|task| match task.difficulty() {
            Difficulty::Easy => expertise <= EASY_TASK_CEILING,
            Difficulty::Medium => true,
            Difficulty::Hard => expertise >= HARD_TASK_FLOOR,
        })
        .collect()
}

/// Pick a task for a minion with the given expertise.
///
/// Falls back to the first catalog entry if nothing is suitable.
pub fn assign_task(expertise: u32, rng: &mut impl Rng) -> TaskKind {
    suitable_tasks(expertise)
        .choose(rng)
        .copied()
        .unwrap_or(TaskKind::SpecSheetProcessing)
}

/// Credits paid for a completed task: `floor(base * (0.5 + work_ethic))`.
pub fn task_pay(task: TaskKind, work_ethic: Decimal) -> u64 {
    let multiplier = Decimal::new(5, 1).saturating_add(work_ethic);
    Decimal::from(task.base_credits())
        .saturating_mul(multiplier)
        .floor()
        .to_u64()
        .unwrap_or(0)
}

/// Purchases the minion can currently afford, in catalog order.
pub fn affordable_purchases(credits: u64) -> Vec<PurchaseItem> {
    PurchaseItem::ALL
        .into_iter()
        .filter(|item| item.cost() <= credits)
        .collect()
}

/// The domain with the lowest mastery. Ties go to the earliest domain in
/// [`Specialty::ALL`].
pub fn weakest_domain(minion: &Minion) -> Specialty {
    let mut weakest = Specialty::SolarPanels;
    let mut lowest: Option<Decimal> = None;
    for domain in Specialty::ALL {
        let level = minion.mastery_of(domain);
        if lowest.is_none_or(|current| level < current) {
            weakest = domain;
            lowest = Some(level);
        }
    }
    weakest
}
