//! Tick scheduler: the single place where time-based mutation happens.
//!
//! Each tick advances the simulated clock, then visits every minion once in
//! store order. For one minion the rules run in a fixed sequence:
//!
//! 1. **Elapse** -- simulated minutes accumulate in the current status.
//! 2. **Status** -- the state machine step for the current status (start or
//!    end a shift, work and complete tasks, take or end a break, start or
//!    finish self-study).
//! 3. **Economy** -- an optional purchase, then the savings-goal check.
//! 4. **Evolution** -- consciousness progresses; crossing a milestone pays a
//!    bonus and promotes the minion.
//!
//! One minion's update is all-or-nothing. A rejected transition aborts the
//! remaining rules for that minion and rolls back everything already applied
//! to it this tick. The rejection is logged, recorded as a `Fault` activity
//! and counted, and the tick carries on with the next minion.
//!
//! Milestones compare against the consciousness level held before any rule
//! ran, so a purchase that crosses a threshold counts as well.
//!
//! Every random draw comes from the state's seeded RNG in a fixed order, so
//! two runs with the same seed produce identical activity logs.

use chrono::{DateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use roster_agents::{
    AgentError, MinionStore, PopulationParams, Transition, affordable_purchases, assign_task,
    compute_snapshot, create_population, task_pay, weakest_domain,
};
use roster_types::{
    ActivityKind, ActivityRecord, AggregateSnapshot, Minion, MinionId, RosterView, Status,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::activity::ActivityLog;
use crate::clock::{ClockError, SimClock};
use crate::config::{
    EconomyConfig, LearningConfig, ProbabilitiesConfig, RosterConfig, WorkCyclesConfig,
};
use crate::narrative;

/// Consciousness levels that count as milestones.
const MILESTONES: [u32; 4] = [25, 50, 75, 90];

/// Errors that abort a whole tick. Per-minion rejections never do.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Building the population failed.
    #[error("population error: {source}")]
    Population {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

/// The configuration sections consulted while running a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRules {
    /// Work/break lengths and shift energy.
    pub work_cycles: WorkCyclesConfig,
    /// Branch probabilities.
    pub probabilities: ProbabilitiesConfig,
    /// Self-study settings.
    pub learning: LearningConfig,
    /// Bonuses and savings goals.
    pub economy: EconomyConfig,
    /// Ranges used when the population is regenerated.
    pub population: PopulationParams,
}

impl TickRules {
    /// Extract the tick rules from a full configuration.
    pub fn from_config(config: &RosterConfig) -> Self {
        Self {
            work_cycles: config.work_cycles.clone(),
            probabilities: config.probabilities.clone(),
            learning: config.learning.clone(),
            economy: config.economy.clone(),
            population: config.population.params(),
        }
    }
}

/// The mutable simulation state passed through the tick cycle.
///
/// Owned exclusively by the run loop. Readers only ever see a
/// [`RosterView`] built between ticks.
#[derive(Debug)]
pub struct SimulationState {
    /// The simulated clock.
    pub clock: SimClock,
    /// The entity store.
    pub store: MinionStore,
    /// Recent activity.
    pub activity: ActivityLog,
    /// Source of every random draw.
    pub rng: StdRng,
    /// Rule parameters.
    pub rules: TickRules,
}

impl SimulationState {
    /// Build a fresh state with a generated population.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] for an invalid clock configuration and
    /// [`TickError::Population`] if the population is empty.
    pub fn generate(config: &RosterConfig) -> Result<Self, TickError> {
        let mut rng = StdRng::seed_from_u64(config.world.seed);
        let store = MinionStore::generate(
            config.population.size,
            &config.population.params(),
            &mut rng,
        )?;
        let clock = SimClock::new(config.world.epoch, config.world.minutes_per_tick)?;
        info!(
            population = store.len(),
            seed = config.world.seed,
            "Generated fresh population"
        );
        Ok(Self {
            clock,
            store,
            activity: ActivityLog::new(config.activity.max_length),
            rng,
            rules: TickRules::from_config(config),
        })
    }

    /// A consistent copy of the current state for readers.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TimeOverflow`] if the simulated time is not
    /// representable.
    pub fn view(&self) -> Result<RosterView, ClockError> {
        Ok(RosterView {
            tick: self.clock.tick(),
            sim_time: self.clock.now()?,
            minions: self.store.all().to_vec(),
            aggregate: compute_snapshot(self.store.all()),
            activity: self.activity.to_vec(),
        })
    }

    /// Replace every minion with a freshly generated one of the same size.
    ///
    /// The clock and the activity log carry on. Draws come from the state's
    /// RNG, so a reset is as reproducible as the rest of the run.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Population`] if generation fails and
    /// [`TickError::Clock`] if the reset cannot be stamped. The current
    /// population is kept on error.
    pub fn reset(&mut self) -> Result<(), TickError> {
        let size = u32::try_from(self.store.len()).unwrap_or(u32::MAX);
        let minions = create_population(size, &self.rules.population, &mut self.rng)?;
        self.store.replace_all(minions)?;
        info!(
            tick = self.clock.tick(),
            population = size,
            "Population reset"
        );
        self.record_system(
            ActivityKind::Operator,
            format!("Population reset: {size} minions regenerated"),
        )?;
        Ok(())
    }

    /// Append a system record (no minion) stamped with the current tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TimeOverflow`] if the simulated time is not
    /// representable.
    pub fn record_system(
        &mut self,
        kind: ActivityKind,
        message: impl Into<String>,
    ) -> Result<(), ClockError> {
        let timestamp = self.clock.now()?;
        self.activity.append(ActivityRecord {
            timestamp,
            tick: self.clock.tick(),
            entity_id: None,
            kind,
            message: message.into(),
        });
        Ok(())
    }
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated time after the tick.
    pub sim_time: DateTime<Utc>,
    /// Transitions applied successfully.
    pub transitions_applied: u32,
    /// Minions whose update was rejected.
    pub rejected: u32,
    /// Tasks completed this tick.
    pub tasks_completed: u32,
    /// Breaks started this tick.
    pub breaks_started: u32,
    /// Credits paid out this tick (tasks, study, bonuses).
    pub credits_earned: u64,
    /// Credits spent on purchases this tick.
    pub credits_spent: u64,
    /// Consciousness milestones reached this tick.
    pub milestones: u32,
    /// Aggregate after the tick.
    pub aggregate: AggregateSnapshot,
}

#[derive(Debug, Clone, Default)]
struct Tally {
    applied: u32,
    rejected: u32,
    tasks_completed: u32,
    breaks_started: u32,
    credits_earned: u64,
    credits_spent: u64,
    milestones: u32,
}

/// Working context for one tick.
struct Pass<'a> {
    store: &'a mut MinionStore,
    rng: &'a mut StdRng,
    rules: &'a TickRules,
    tick: u64,
    now: DateTime<Utc>,
    hour: u32,
    minutes: u32,
    tally: Tally,
    records: Vec<ActivityRecord>,
}

/// Execute one complete tick of the simulation.
///
/// # Errors
///
/// Returns [`TickError::Clock`] if the clock cannot advance. Rejected
/// transitions are contained per minion and never surface here.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    let tick = state.clock.advance()?;
    let now = state.clock.now()?;
    let mut pass = Pass {
        store: &mut state.store,
        rng: &mut state.rng,
        rules: &state.rules,
        tick,
        now,
        hour: now.hour(),
        minutes: state.clock.minutes_per_tick(),
        tally: Tally::default(),
        records: Vec::new(),
    };

    for id in pass.store.ids() {
        if let Err(err) = pass.update_or_rollback(&id) {
            warn!(tick, minion_id = %id, error = %err, "Transition rejected");
            pass.tally.rejected = pass.tally.rejected.saturating_add(1);
            pass.records.push(ActivityRecord {
                timestamp: now,
                tick,
                entity_id: Some(id),
                kind: ActivityKind::Fault,
                message: format!("Update skipped: {err}"),
            });
        }
    }

    let Pass { tally, records, .. } = pass;
    for record in records {
        state.activity.append(record);
    }
    let aggregate = compute_snapshot(state.store.all());

    debug!(
        tick,
        applied = tally.applied,
        rejected = tally.rejected,
        tasks = tally.tasks_completed,
        working = aggregate.count(Status::Working),
        "Tick complete"
    );

    Ok(TickSummary {
        tick,
        sim_time: now,
        transitions_applied: tally.applied,
        rejected: tally.rejected,
        tasks_completed: tally.tasks_completed,
        breaks_started: tally.breaks_started,
        credits_earned: tally.credits_earned,
        credits_spent: tally.credits_spent,
        milestones: tally.milestones,
        aggregate,
    })
}

impl Pass<'_> {
    /// Run every rule for one minion. On rejection everything the minion
    /// changed this tick is undone, counters and buffered records included.
    fn update_or_rollback(&mut self, id: &MinionId) -> Result<(), AgentError> {
        let saved = self.store.get(id)?.clone();
        let tally = self.tally.clone();
        let recorded = self.records.len();
        let result = self.update(&saved);
        if result.is_err() {
            self.store.revert(saved)?;
            self.tally = tally;
            self.records.truncate(recorded);
        }
        result
    }

    fn update(&mut self, start: &Minion) -> Result<(), AgentError> {
        let id = &start.id;
        let minion = self.apply(id, &Transition::Elapse {
            minutes: self.minutes,
        })?;
        match minion.status {
            Status::Idle => self.idle(&minion)?,
            Status::Working => self.working(&minion)?,
            Status::OnBreak => self.on_break(&minion)?,
            Status::Learning => self.learning(&minion)?,
        }
        self.economy(id)?;
        self.evolve(id, start.consciousness_level)
    }

    fn apply(&mut self, id: &MinionId, transition: &Transition) -> Result<Minion, AgentError> {
        let minion = self.store.apply(id, transition)?.clone();
        self.tally.applied = self.tally.applied.saturating_add(1);
        Ok(minion)
    }

    fn record(&mut self, minion: &Minion, kind: ActivityKind, message: String) {
        self.records.push(ActivityRecord {
            timestamp: self.now,
            tick: self.tick,
            entity_id: Some(minion.id.clone()),
            kind,
            message,
        });
    }

    fn idle(&mut self, minion: &Minion) -> Result<(), AgentError> {
        if minion.shift.contains_hour(self.hour) {
            let task = assign_task(minion.expertise_level, self.rng);
            self.apply(&minion.id, &Transition::StartShift {
                task,
                energy_cost: self.rules.work_cycles.shift_start_energy_cost,
            })?;
            self.record(
                minion,
                ActivityKind::Work,
                format!(
                    "{} started the {:?} shift on {}",
                    minion.name,
                    minion.shift,
                    task.label()
                ),
            );
        } else if roll(self.rng, self.rules.probabilities.autonomous_learning) {
            let domain = weakest_domain(minion);
            self.apply(&minion.id, &Transition::BeginStudy { domain })?;
            self.record(
                minion,
                ActivityKind::Learning,
                format!("{} started self-study in {}", minion.name, domain.label()),
            );
        }
        Ok(())
    }

    fn working(&mut self, minion: &Minion) -> Result<(), AgentError> {
        let threshold = self
            .rules
            .work_cycles
            .for_profile(minion.work_cycle)
            .work_minutes()
            .unwrap_or(u32::MAX);
        let worked = self.apply(&minion.id, &Transition::Work {
            minutes: self.minutes,
        })?;

        if worked.minutes_worked_in_shift >= threshold {
            self.apply(&minion.id, &Transition::BeginBreak {
                energy_restored: self.rules.work_cycles.break_energy_restore,
            })?;
            self.tally.breaks_started = self.tally.breaks_started.saturating_add(1);
            self.record(
                minion,
                ActivityKind::Break,
                format!(
                    "{} is taking a break after {} hours",
                    minion.name,
                    worked.hours_worked_in_shift().round_dp(1)
                ),
            );
        } else if !minion.shift.contains_hour(self.hour) {
            self.apply(&minion.id, &Transition::EndShift)?;
            self.record(
                minion,
                ActivityKind::Work,
                format!("{} finished the {:?} shift", minion.name, minion.shift),
            );
        } else if roll(self.rng, self.rules.probabilities.task_completion) {
            let task = worked
                .current_task
                .unwrap_or_else(|| assign_task(worked.expertise_level, self.rng));
            let credits = task_pay(task, worked.work_ethic);
            let mastery_gain = random_gain(self.rng, self.rules.learning.task_mastery_gain_max);
            let next_task = assign_task(worked.expertise_level, self.rng);
            self.apply(&minion.id, &Transition::CompleteTask {
                credits,
                mastery_gain,
                next_task,
            })?;
            self.tally.tasks_completed = self.tally.tasks_completed.saturating_add(1);
            self.tally.credits_earned = self.tally.credits_earned.saturating_add(credits);
            self.record(
                minion,
                ActivityKind::Work,
                format!(
                    "{} completed {} (+{credits} credits)",
                    minion.name,
                    task.label()
                ),
            );
        }
        Ok(())
    }

    fn on_break(&mut self, minion: &Minion) -> Result<(), AgentError> {
        let length = self
            .rules
            .work_cycles
            .for_profile(minion.work_cycle)
            .break_minutes()
            .unwrap_or(0);
        if minion.minutes_in_status >= length {
            self.apply(&minion.id, &Transition::EndBreak)?;
            self.record(
                minion,
                ActivityKind::Break,
                format!("{} is refreshed and ready for work", minion.name),
            );
        }
        Ok(())
    }

    fn learning(&mut self, minion: &Minion) -> Result<(), AgentError> {
        if minion.minutes_in_status < self.rules.learning.session_minutes {
            return Ok(());
        }
        let mastery_gain = random_gain(self.rng, self.rules.learning.study_mastery_gain_max);
        let initiative_credits = self.rules.learning.initiative_credits;
        self.apply(&minion.id, &Transition::FinishStudy {
            mastery_gain,
            initiative_credits,
        })?;
        self.tally.credits_earned = self.tally.credits_earned.saturating_add(initiative_credits);
        let domain = minion
            .learning_focus
            .map_or("an unfocused topic", |domain| domain.label());
        self.record(
            minion,
            ActivityKind::Learning,
            format!(
                "{} finished self-study in {domain} (+{initiative_credits} credits)",
                minion.name
            ),
        );
        Ok(())
    }

    fn economy(&mut self, id: &MinionId) -> Result<(), AgentError> {
        let minion = self.store.get(id)?.clone();
        let propensity = minion.spending_propensity.to_f64().unwrap_or(0.0);
        let wants_to_spend = roll(
            self.rng,
            propensity * self.rules.probabilities.spending_scale,
        );
        let item = if wants_to_spend {
            affordable_purchases(minion.credits).choose(self.rng).copied()
        } else {
            None
        };
        if let Some(item) = item {
            self.apply(id, &Transition::Purchase { item })?;
            self.tally.credits_spent = self.tally.credits_spent.saturating_add(item.cost());
            self.record(
                &minion,
                ActivityKind::Economy,
                format!(
                    "{} bought {} for {} credits",
                    minion.name,
                    item.label(),
                    item.cost()
                ),
            );
        }

        let minion = self.store.get(id)?.clone();
        if minion.credits < minion.savings_goal {
            return Ok(());
        }
        let goal = minion.savings_goal;
        let economy = &self.rules.economy;
        let bonus = percent_of(goal, economy.savings_bonus_pct)?;
        let growth = percent_of(goal, economy.savings_growth_pct)?;
        let next_goal = goal.saturating_add(growth.max(1));
        self.apply(id, &Transition::ReachSavingsGoal { bonus, next_goal })?;
        self.tally.credits_earned = self.tally.credits_earned.saturating_add(bonus);
        self.record(
            &minion,
            ActivityKind::Economy,
            format!(
                "{} reached a savings goal of {goal} credits (+{bonus} bonus)",
                minion.name
            ),
        );
        Ok(())
    }

    fn evolve(&mut self, id: &MinionId, before: Decimal) -> Result<(), AgentError> {
        let minion = self.store.get(id)?.clone();
        let multiplier = match minion.status {
            Status::Working => Decimal::new(12, 1),
            Status::Learning => Decimal::new(11, 1),
            Status::Idle | Status::OnBreak => Decimal::ONE,
        };
        let amount = minion.evolution_rate.saturating_mul(multiplier);
        let after = self
            .apply(id, &Transition::Evolve { amount })?
            .consciousness_level;

        for threshold in MILESTONES {
            let level = Decimal::from(threshold);
            if before >= level || after < level {
                continue;
            }
            let bonus = self.rules.economy.milestone_bonus;
            self.apply(id, &Transition::Earn { credits: bonus })?;
            self.tally.milestones = self.tally.milestones.saturating_add(1);
            self.tally.credits_earned = self.tally.credits_earned.saturating_add(bonus);

            let current = self.store.get(id)?.clone();
            let mut message = format!(
                "{} reached {} (+{bonus} credits)",
                minion.name,
                narrative::milestone_name(threshold).unwrap_or("a milestone")
            );
            if current.tier < self.store.max_tier() {
                let promoted = self.apply(id, &Transition::Promote)?;
                message.push_str(&format!(", promoted to tier {}", promoted.tier));
            }
            info!(
                tick = self.tick,
                minion_id = %id,
                threshold,
                "Consciousness milestone"
            );
            self.record(&minion, ActivityKind::Milestone, message);
        }
        Ok(())
    }
}

/// Bernoulli draw. Probabilities outside `[0, 1]` saturate; NaN never fires.
fn roll(rng: &mut StdRng, probability: f64) -> bool {
    rng.random::<f64>() < probability
}

/// Uniform gain in `[0, max]` with two decimal places.
fn random_gain(rng: &mut StdRng, max: Decimal) -> Decimal {
    let ceiling = max
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|hundredths| hundredths.floor().to_i64())
        .unwrap_or(0)
        .max(0);
    Decimal::new(rng.random_range(0..=ceiling), 2)
}

fn percent_of(value: u64, pct: u64) -> Result<u64, AgentError> {
    value
        .checked_mul(pct)
        .and_then(|scaled| scaled.checked_div(100))
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: format!("{pct}% of {value}"),
        })
}
