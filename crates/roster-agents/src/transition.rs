//! The minion state machine.
//!
//! A [`Transition`] is the only way a live minion changes. Each transition
//! declares which statuses it may fire from and which status it leads to;
//! [`apply_transition`] checks both, then computes the successor on a copy so
//! a rejected transition leaves the original untouched.
//!
//! Status changes permitted by [`is_legal_status_change`]:
//!
//! ```text
//! Idle ----> Working ----> OnBreak ----> Idle
//!   |          |   \
//!   |          |    `----> Idle        (shift window closed)
//!   |          v
//!   `-----> Learning ----> Idle
//! ```

use roster_types::{Minion, PurchaseItem, Specialty, Status, TaskKind};
use rust_decimal::Decimal;

use crate::error::AgentError;

/// Upper bound of every `[0, 100]` stat.
const STAT_CEILING: u32 = 100;

/// Energy restored by an energy booster purchase.
const BOOSTER_ENERGY: u32 = 20;

/// Expertise granted by knowledge database access.
const DATABASE_EXPERTISE: u32 = 5;

/// Statuses from which a status-neutral transition may fire.
const ANY_STATUS: &[Status] = &Status::ALL;

/// A validated change to one minion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// `Idle -> Working`: the shift window opened.
    StartShift {
        /// Task assigned for the shift.
        task: TaskKind,
        /// Energy spent getting started.
        energy_cost: u32,
    },
    /// `Working` self-loop: accumulate time on shift.
    Work {
        /// Simulated minutes worked this tick.
        minutes: u32,
    },
    /// `Working` self-loop: the current task finished.
    CompleteTask {
        /// Credits paid for the task.
        credits: u64,
        /// Mastery gained in the task's domain.
        mastery_gain: Decimal,
        /// Task picked up next.
        next_task: TaskKind,
    },
    /// `Working -> Idle`: the shift window closed.
    EndShift,
    /// `Working -> OnBreak`: the work cycle is complete.
    BeginBreak {
        /// Energy restored on entering the break.
        energy_restored: u32,
    },
    /// `OnBreak -> Idle`: the break has run its length.
    EndBreak,
    /// `Idle | Working -> Learning`: start a self-study session.
    BeginStudy {
        /// Domain to study.
        domain: Specialty,
    },
    /// `Learning -> Idle`: the study session is over.
    FinishStudy {
        /// Mastery gained in the studied domain.
        mastery_gain: Decimal,
        /// Credits paid for taking the initiative.
        initiative_credits: u64,
    },
    /// Any status: simulated time passes in the current status.
    Elapse {
        /// Simulated minutes elapsed.
        minutes: u32,
    },
    /// Any status: credit a bonus (milestones).
    Earn {
        /// Credits to add.
        credits: u64,
    },
    /// Any status: buy an item. Rejected if unaffordable.
    Purchase {
        /// Item bought.
        item: PurchaseItem,
    },
    /// Any status: the balance reached the savings goal.
    ReachSavingsGoal {
        /// Bonus credited.
        bonus: u64,
        /// Goal set for next time.
        next_goal: u64,
    },
    /// Any status: consciousness progresses.
    Evolve {
        /// Consciousness gained, capped at 100.
        amount: Decimal,
    },
    /// Any status: raise the tier by one, capped at the store's maximum.
    Promote,
}

impl Transition {
    /// Short name used in errors and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartShift { .. } => "start_shift",
            Self::Work { .. } => "work",
            Self::CompleteTask { .. } => "complete_task",
            Self::EndShift => "end_shift",
            Self::BeginBreak { .. } => "begin_break",
            Self::EndBreak => "end_break",
            Self::BeginStudy { .. } => "begin_study",
            Self::FinishStudy { .. } => "finish_study",
            Self::Elapse { .. } => "elapse",
            Self::Earn { .. } => "earn",
            Self::Purchase { .. } => "purchase",
            Self::ReachSavingsGoal { .. } => "reach_savings_goal",
            Self::Evolve { .. } => "evolve",
            Self::Promote => "promote",
        }
    }

    /// Statuses this transition may fire from.
    pub const fn allowed_from(&self) -> &'static [Status] {
        match self {
            Self::StartShift { .. } => &[Status::Idle],
            Self::Work { .. }
            | Self::CompleteTask { .. }
            | Self::EndShift
            | Self::BeginBreak { .. } => &[Status::Working],
            Self::EndBreak => &[Status::OnBreak],
            Self::BeginStudy { .. } => &[Status::Idle, Status::Working],
            Self::FinishStudy { .. } => &[Status::Learning],
            Self::Elapse { .. }
            | Self::Earn { .. }
            | Self::Purchase { .. }
            | Self::ReachSavingsGoal { .. }
            | Self::Evolve { .. }
            | Self::Promote => ANY_STATUS,
        }
    }

    /// Status the minion ends up in, or `None` if the status is unchanged.
    pub const fn target(&self) -> Option<Status> {
        match self {
            Self::StartShift { .. } => Some(Status::Working),
            Self::EndShift | Self::EndBreak | Self::FinishStudy { .. } => Some(Status::Idle),
            Self::BeginBreak { .. } => Some(Status::OnBreak),
            Self::BeginStudy { .. } => Some(Status::Learning),
            Self::Work { .. }
            | Self::CompleteTask { .. }
            | Self::Elapse { .. }
            | Self::Earn { .. }
            | Self::Purchase { .. }
            | Self::ReachSavingsGoal { .. }
            | Self::Evolve { .. }
            | Self::Promote => None,
        }
    }
}

/// Whether a minion may move from `from` to `to`.
pub const fn is_legal_status_change(from: Status, to: Status) -> bool {
    matches!(
        (from, to),
        (Status::Idle, Status::Working | Status::Learning)
            | (
                Status::Working,
                Status::Idle | Status::OnBreak | Status::Learning
            )
            | (Status::OnBreak | Status::Learning, Status::Idle)
    )
}

/// Compute the successor of `minion` under `transition`.
///
/// The input is never modified; on error the caller keeps the original.
///
/// # Errors
///
/// - [`AgentError::InvalidTransition`] if the transition cannot fire from
///   the minion's status.
/// - [`AgentError::InsufficientCredits`] if a purchase would overdraw.
/// - [`AgentError::PreconditionFailed`] if a savings goal or promotion is
///   not reachable.
/// - [`AgentError::InvalidAmount`] for a negative progress amount.
/// - [`AgentError::ArithmeticOverflow`] if a counter would overflow.
pub fn apply_transition(
    minion: &Minion,
    transition: &Transition,
    max_tier: u8,
) -> Result<Minion, AgentError> {
    if !transition.allowed_from().contains(&minion.status) {
        return Err(invalid(minion, transition));
    }
    if let Some(target) = transition.target()
        && !is_legal_status_change(minion.status, target)
    {
        return Err(invalid(minion, transition));
    }

    let mut next = minion.clone();
    match transition {
        Transition::StartShift { task, energy_cost } => {
            next.current_task = Some(*task);
            next.energy = next.energy.saturating_sub(*energy_cost);
        }
        Transition::Work { minutes } => {
            next.minutes_worked_in_shift = add_u32(
                next.minutes_worked_in_shift,
                *minutes,
                "minutes worked in shift",
            )?;
        }
        Transition::CompleteTask {
            credits,
            mastery_gain,
            next_task,
        } => {
            require_non_negative(*mastery_gain, "task mastery gain")?;
            let domain = next.current_task.unwrap_or(*next_task).domain();
            credit(&mut next, *credits)?;
            next.tasks_completed = add_u64(next.tasks_completed, 1, "tasks completed")?;
            raise_mastery(&mut next, domain, *mastery_gain);
            next.current_task = Some(*next_task);
        }
        Transition::EndShift => {
            next.current_task = None;
            next.minutes_worked_in_shift = 0;
        }
        Transition::BeginBreak { energy_restored } => {
            next.current_task = None;
            next.minutes_worked_in_shift = 0;
            next.needs_break = true;
            next.energy = capped_add(next.energy, *energy_restored);
        }
        Transition::EndBreak => {
            next.needs_break = false;
            next.energy = STAT_CEILING;
            next.breaks_taken = add_u64(next.breaks_taken, 1, "breaks taken")?;
        }
        Transition::BeginStudy { domain } => {
            next.current_task = None;
            next.learning_focus = Some(*domain);
        }
        Transition::FinishStudy {
            mastery_gain,
            initiative_credits,
        } => {
            require_non_negative(*mastery_gain, "study mastery gain")?;
            if let Some(domain) = next.learning_focus.take() {
                raise_mastery(&mut next, domain, *mastery_gain);
            }
            credit(&mut next, *initiative_credits)?;
        }
        Transition::Elapse { minutes } => {
            next.minutes_in_status =
                add_u32(next.minutes_in_status, *minutes, "minutes in status")?;
        }
        Transition::Earn { credits } => credit(&mut next, *credits)?,
        Transition::Purchase { item } => {
            debit(&mut next, item.cost())?;
            apply_purchase_benefit(&mut next, *item);
        }
        Transition::ReachSavingsGoal { bonus, next_goal } => {
            if next.credits < next.savings_goal {
                return Err(AgentError::PreconditionFailed {
                    minion_id: next.id.clone(),
                    reason: format!(
                        "balance {} below savings goal {}",
                        next.credits, next.savings_goal
                    ),
                });
            }
            credit(&mut next, *bonus)?;
            next.savings_goal = *next_goal;
        }
        Transition::Evolve { amount } => {
            require_non_negative(*amount, "consciousness gain")?;
            next.consciousness_level = next
                .consciousness_level
                .saturating_add(*amount)
                .min(Decimal::from(STAT_CEILING));
        }
        Transition::Promote => {
            if next.tier >= max_tier {
                return Err(AgentError::PreconditionFailed {
                    minion_id: next.id.clone(),
                    reason: format!("already at maximum tier {max_tier}"),
                });
            }
            next.tier = next.tier.saturating_add(1);
        }
    }

    if let Some(target) = transition.target() {
        next.status = target;
        next.minutes_in_status = 0;
    }
    Ok(next)
}

fn invalid(minion: &Minion, transition: &Transition) -> AgentError {
    AgentError::InvalidTransition {
        minion_id: minion.id.clone(),
        from: minion.status,
        transition: transition.name(),
    }
}

fn credit(minion: &mut Minion, credits: u64) -> Result<(), AgentError> {
    minion.credits = add_u64(minion.credits, credits, "credit balance")?;
    minion.total_earned = add_u64(minion.total_earned, credits, "lifetime earnings")?;
    Ok(())
}

/// Spends are rejected, never clamped.
fn debit(minion: &mut Minion, amount: u64) -> Result<(), AgentError> {
    minion.credits =
        minion
            .credits
            .checked_sub(amount)
            .ok_or_else(|| AgentError::InsufficientCredits {
                minion_id: minion.id.clone(),
                requested: amount,
                available: minion.credits,
            })?;
    Ok(())
}

fn apply_purchase_benefit(minion: &mut Minion, item: PurchaseItem) {
    match item {
        PurchaseItem::LearningModule => {
            minion.evolution_rate = minion.evolution_rate.saturating_add(Decimal::new(1, 2));
        }
        PurchaseItem::EnergyBooster => {
            minion.energy = capped_add(minion.energy, BOOSTER_ENERGY);
        }
        PurchaseItem::KnowledgeDatabaseAccess => {
            minion.expertise_level = capped_add(minion.expertise_level, DATABASE_EXPERTISE);
        }
        PurchaseItem::CollaborationTools => {
            minion.work_ethic = minion
                .work_ethic
                .saturating_add(Decimal::new(1, 1))
                .min(Decimal::ONE);
        }
        PurchaseItem::ConsciousnessEnhancer => {
            minion.consciousness_level = minion
                .consciousness_level
                .saturating_add(Decimal::TWO)
                .min(Decimal::from(STAT_CEILING));
        }
    }
}

fn raise_mastery(minion: &mut Minion, domain: Specialty, gain: Decimal) {
    let level = minion
        .mastery_of(domain)
        .saturating_add(gain)
        .min(Decimal::from(STAT_CEILING));
    minion.mastery.insert(domain, level);
}

fn require_non_negative(amount: Decimal, what: &str) -> Result<(), AgentError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AgentError::InvalidAmount {
            context: format!("{what} must not be negative, got {amount}"),
        });
    }
    Ok(())
}

fn capped_add(value: u32, amount: u32) -> u32 {
    value.saturating_add(amount).min(STAT_CEILING)
}

fn add_u32(value: u32, amount: u32, what: &str) -> Result<u32, AgentError> {
    value
        .checked_add(amount)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: format!("{what} overflow"),
        })
}

fn add_u64(value: u64, amount: u64, what: &str) -> Result<u64, AgentError> {
    value
        .checked_add(amount)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: format!("{what} overflow"),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::PopulationParams;
    use crate::population::generate_minion;

    fn minion() -> Minion {
        let mut rng = StdRng::seed_from_u64(11);
        generate_minion(1, &PopulationParams::default(), &mut rng)
    }

    fn in_status(status: Status) -> Minion {
        let mut m = minion();
        m.status = status;
        m
    }

    #[test]
    fn on_break_only_returns_to_idle() {
        for to in Status::ALL {
            assert_eq!(
                is_legal_status_change(Status::OnBreak, to),
                to == Status::Idle,
                "OnBreak -> {to:?}"
            );
        }
    }

    #[test]
    fn every_target_is_legal_from_every_allowed_status() {
        let samples = [
            Transition::StartShift {
                task: TaskKind::ProductComparison,
                energy_cost: 2,
            },
            Transition::EndShift,
            Transition::BeginBreak { energy_restored: 10 },
            Transition::EndBreak,
            Transition::BeginStudy {
                domain: Specialty::Batteries,
            },
            Transition::FinishStudy {
                mastery_gain: Decimal::ONE,
                initiative_credits: 10,
            },
        ];
        for transition in samples {
            let target = transition.target().unwrap();
            for from in transition.allowed_from() {
                assert!(is_legal_status_change(*from, target), "{from:?} -> {target:?}");
            }
        }
    }

    #[test]
    fn break_cannot_start_work() {
        let m = in_status(Status::OnBreak);
        let err = apply_transition(
            &m,
            &Transition::StartShift {
                task: TaskKind::SpecSheetProcessing,
                energy_cost: 2,
            },
            5,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AgentError::InvalidTransition {
                from: Status::OnBreak,
                transition: "start_shift",
                ..
            }
        ));
    }

    #[test]
    fn break_cannot_start_study() {
        let m = in_status(Status::OnBreak);
        let result = apply_transition(
            &m,
            &Transition::BeginStudy {
                domain: Specialty::Maintenance,
            },
            5,
        );
        assert!(result.is_err());
    }

    #[test]
    fn begin_break_resets_hours_and_restores_energy() {
        let mut m = in_status(Status::Working);
        m.minutes_worked_in_shift = 400;
        m.energy = 50;
        m.minutes_in_status = 400;
        let next =
            apply_transition(&m, &Transition::BeginBreak { energy_restored: 10 }, 5).unwrap();
        assert_eq!(next.status, Status::OnBreak);
        assert_eq!(next.minutes_worked_in_shift, 0);
        assert_eq!(next.minutes_in_status, 0);
        assert_eq!(next.energy, 60);
        assert!(next.needs_break);
    }

    #[test]
    fn end_break_clears_flag() {
        let mut m = in_status(Status::OnBreak);
        m.needs_break = true;
        let next = apply_transition(&m, &Transition::EndBreak, 5).unwrap();
        assert_eq!(next.status, Status::Idle);
        assert!(!next.needs_break);
        assert_eq!(next.energy, 100);
        assert_eq!(next.breaks_taken, 1);
    }

    #[test]
    fn overdrawing_purchase_is_rejected_without_change() {
        let mut m = minion();
        m.credits = 120;
        let err = apply_transition(
            &m,
            &Transition::Purchase {
                item: PurchaseItem::ConsciousnessEnhancer,
            },
            5,
        )
        .unwrap_err();
        assert_eq!(
            err,
            AgentError::InsufficientCredits {
                minion_id: m.id.clone(),
                requested: 200,
                available: 120,
            }
        );
        assert_eq!(m.credits, 120);
    }

    #[test]
    fn purchase_debits_and_applies_benefit() {
        let mut m = minion();
        m.credits = 300;
        m.energy = 90;
        let next = apply_transition(
            &m,
            &Transition::Purchase {
                item: PurchaseItem::EnergyBooster,
            },
            5,
        )
        .unwrap();
        assert_eq!(next.credits, 250);
        assert_eq!(next.energy, 100);
        assert_eq!(next.total_earned, m.total_earned);
    }

    #[test]
    fn task_completion_credits_and_counts() {
        let mut m = in_status(Status::Working);
        m.current_task = Some(TaskKind::StandardsAnalysis);
        m.mastery.insert(Specialty::ElectricalStandards, Decimal::from(99));
        let next = apply_transition(
            &m,
            &Transition::CompleteTask {
                credits: 90,
                mastery_gain: Decimal::from(2),
                next_task: TaskKind::ProductComparison,
            },
            5,
        )
        .unwrap();
        assert_eq!(next.credits, m.credits + 90);
        assert_eq!(next.total_earned, 90);
        assert_eq!(next.tasks_completed, 1);
        assert_eq!(next.mastery_of(Specialty::ElectricalStandards), Decimal::from(100));
        assert_eq!(next.current_task, Some(TaskKind::ProductComparison));
        assert_eq!(next.status, Status::Working);
    }

    #[test]
    fn negative_gain_is_rejected() {
        let m = minion();
        let err = apply_transition(
            &m,
            &Transition::Evolve {
                amount: Decimal::NEGATIVE_ONE,
            },
            5,
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidAmount { .. }));
    }

    #[test]
    fn consciousness_is_capped() {
        let mut m = minion();
        m.consciousness_level = Decimal::from(99);
        let next = apply_transition(
            &m,
            &Transition::Evolve {
                amount: Decimal::from(5),
            },
            5,
        )
        .unwrap();
        assert_eq!(next.consciousness_level, Decimal::from(100));
    }

    #[test]
    fn promotion_stops_at_max_tier() {
        let mut m = minion();
        m.tier = 2;
        let next = apply_transition(&m, &Transition::Promote, 3).unwrap();
        assert_eq!(next.tier, 3);
        assert!(apply_transition(&next, &Transition::Promote, 3).is_err());
    }

    #[test]
    fn savings_goal_requires_balance() {
        let mut m = minion();
        m.credits = 100;
        m.savings_goal = 500;
        let goal = Transition::ReachSavingsGoal {
            bonus: 50,
            next_goal: 750,
        };
        assert!(apply_transition(&m, &goal, 5).is_err());
        m.credits = 600;
        let next = apply_transition(&m, &goal, 5).unwrap();
        assert_eq!(next.credits, 650);
        assert_eq!(next.savings_goal, 750);
    }

    #[test]
    fn study_raises_focus_domain() {
        let m = minion();
        let studying = apply_transition(
            &m,
            &Transition::BeginStudy {
                domain: Specialty::GridConnection,
            },
            5,
        )
        .unwrap();
        assert_eq!(studying.status, Status::Learning);
        let before = studying.mastery_of(Specialty::GridConnection);
        let done = apply_transition(
            &studying,
            &Transition::FinishStudy {
                mastery_gain: Decimal::ONE,
                initiative_credits: 10,
            },
            5,
        )
        .unwrap();
        assert_eq!(done.status, Status::Idle);
        assert_eq!(done.learning_focus, None);
        assert_eq!(done.mastery_of(Specialty::GridConnection), before + Decimal::ONE);
        assert_eq!(done.credits, m.credits + 10);
    }
}
