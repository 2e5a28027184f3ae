//! Core record types: minions, activity records, aggregates, and the
//! persisted snapshot document.
//!
//! All of these serialize with `camelCase` keys because the persisted JSON
//! document and the dashboard both consume them directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActivityKind, Role, Shift, Specialty, Status, TaskKind, WorkCycle};
use crate::ids::MinionId;

// ---------------------------------------------------------------------------
// Minion
// ---------------------------------------------------------------------------

/// A simulated worker.
///
/// Fields are public for reading and for snapshot round-trips. Only the
/// entity store in `roster-agents` mutates a live minion, through validated
/// transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Minion {
    /// Stable unique identifier.
    pub id: MinionId,
    /// Generated display name (`ATLAS-X101`).
    pub name: String,
    /// Rank, starting at 1 and raised by consciousness milestones.
    pub tier: u8,
    /// Organisational role.
    pub role: Role,
    /// Primary knowledge domain.
    pub specialty: Specialty,
    /// Secondary knowledge domain.
    pub secondary_specialty: Specialty,
    /// Rostered shift window.
    pub shift: Shift,
    /// Work/break rhythm profile.
    pub work_cycle: WorkCycle,
    /// Current state-machine status.
    pub status: Status,
    /// Spendable balance. Never negative by construction.
    pub credits: u64,
    /// Lifetime credits earned (bonuses included, spending excluded).
    pub total_earned: u64,
    /// Simulated minutes worked since the last break or shift change.
    ///
    /// Stored as whole minutes; the document carries it as decimal hours
    /// under `hoursWorkedInShift`.
    #[serde(rename = "hoursWorkedInShift", with = "shift_hours")]
    #[ts(as = "String")]
    pub minutes_worked_in_shift: u32,
    /// Simulated minutes spent in the current status.
    pub minutes_in_status: u32,
    /// Energy from 0 to 100.
    pub energy: u32,
    /// Set when a work cycle completes, cleared when the break ends.
    pub needs_break: bool,
    /// Consciousness progress in `[0, 100]`.
    #[ts(as = "String")]
    pub consciousness_level: Decimal,
    /// Consciousness gained per tick before status multipliers.
    #[ts(as = "String")]
    pub evolution_rate: Decimal,
    /// Expertise in `[0, 100]`, used for task difficulty matching.
    pub expertise_level: u32,
    /// Mastery per domain, each in `[0, 100]`.
    #[ts(as = "BTreeMap<Specialty, String>")]
    pub mastery: BTreeMap<Specialty, Decimal>,
    /// Work ethic in `[0, 1]`; scales task pay.
    #[ts(as = "String")]
    pub work_ethic: Decimal,
    /// Propensity to spend in `[0, 1]`.
    #[ts(as = "String")]
    pub spending_propensity: Decimal,
    /// Balance that triggers the next savings bonus.
    pub savings_goal: u64,
    /// Task in progress while working.
    pub current_task: Option<TaskKind>,
    /// Domain being studied while learning.
    pub learning_focus: Option<Specialty>,
    /// Number of tasks completed over the run.
    pub tasks_completed: u64,
    /// Number of breaks completed over the run.
    pub breaks_taken: u64,
}

impl Minion {
    /// Hours worked in the current shift, derived from minutes.
    pub fn hours_worked_in_shift(&self) -> Decimal {
        shift_hours::to_hours(self.minutes_worked_in_shift)
    }

    /// Mastery of a domain, zero when untracked.
    pub fn mastery_of(&self, domain: Specialty) -> Decimal {
        self.mastery.get(&domain).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Minutes in memory, decimal hours on the wire.
mod shift_hours {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

    const MINUTES_PER_HOUR: u32 = 60;

    pub(super) fn to_hours(minutes: u32) -> Decimal {
        Decimal::from(minutes)
            .checked_div(Decimal::from(MINUTES_PER_HOUR))
            .unwrap_or(Decimal::ZERO)
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn serialize<S>(minutes: &u32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&to_hours(*minutes), serializer)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hours = <Decimal as Deserialize>::deserialize(deserializer)?;
        hours
            .checked_mul(Decimal::from(MINUTES_PER_HOUR))
            .map(|minutes| minutes.round())
            .and_then(|minutes| minutes.to_u32())
            .ok_or_else(|| de::Error::custom(format!("hours worked out of range: {hours}")))
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// One immutable line in the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ActivityRecord {
    /// Simulated time at which the transition happened.
    pub timestamp: DateTime<Utc>,
    /// Tick during which the record was produced.
    pub tick: u64,
    /// Minion concerned, absent for system records (persistence).
    pub entity_id: Option<MinionId>,
    /// Record category.
    pub kind: ActivityKind,
    /// Human-readable description.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Summary statistics derived from the whole store at one point in time.
///
/// Never stored independently: always recomputed from the minions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AggregateSnapshot {
    /// Number of minions.
    pub population: u32,
    /// Sum of every minion's spendable credits.
    pub total_credits: u64,
    /// Sum of every minion's lifetime earnings.
    pub total_earned: u64,
    /// Sum of every minion's completed tasks.
    pub tasks_completed: u64,
    /// Count per status; all four statuses are always present.
    pub by_status: BTreeMap<Status, u32>,
    /// Count per primary specialty.
    pub by_specialty: BTreeMap<Specialty, u32>,
    /// Count per shift.
    pub by_shift: BTreeMap<Shift, u32>,
    /// Minions working or learning.
    pub active: u32,
    /// Mean consciousness level, rounded to two decimal places.
    #[ts(as = "String")]
    pub average_consciousness: Decimal,
    /// Mean energy, rounded down.
    pub average_energy: u32,
}

impl AggregateSnapshot {
    /// Number of minions currently in `status`.
    pub fn count(&self, status: Status) -> u32 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Views and persisted state
// ---------------------------------------------------------------------------

/// A consistent read-only copy of the simulation published between ticks.
///
/// Readers (persistence, observer) only ever see one of these, never the
/// live store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RosterView {
    /// Last completed tick.
    pub tick: u64,
    /// Simulated time after that tick.
    pub sim_time: DateTime<Utc>,
    /// Every minion in store order.
    pub minions: Vec<Minion>,
    /// Aggregate computed from `minions`.
    pub aggregate: AggregateSnapshot,
    /// Retained activity, oldest first.
    pub activity: Vec<ActivityRecord>,
}

/// The document written by the persistence adapter.
///
/// On load only `entities`, `tick` and `activity` are trusted; the
/// aggregate is recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PersistedState {
    /// Every minion in store order.
    pub entities: Vec<Minion>,
    /// Aggregate at save time.
    pub aggregate: AggregateSnapshot,
    /// Wall-clock time of the save (ISO-8601).
    pub saved_at: DateTime<Utc>,
    /// Last completed tick at save time.
    #[serde(default)]
    pub tick: u64,
    /// Retained activity at save time, oldest first.
    #[serde(default)]
    pub activity: Vec<ActivityRecord>,
}

impl PersistedState {
    /// Capture a published view as a persistable document.
    pub fn from_view(view: &RosterView, saved_at: DateTime<Utc>) -> Self {
        Self {
            entities: view.minions.clone(),
            aggregate: view.aggregate.clone(),
            saved_at,
            tick: view.tick,
            activity: view.activity.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn minion(minutes_worked: u32) -> Minion {
        Minion {
            id: MinionId::from_index(1),
            name: "ATLAS-X101".to_owned(),
            tier: 1,
            role: Role::Specialist,
            specialty: Specialty::Inverters,
            secondary_specialty: Specialty::Batteries,
            shift: Shift::Morning,
            work_cycle: WorkCycle::Standard,
            status: Status::Working,
            credits: 300,
            total_earned: 300,
            minutes_worked_in_shift: minutes_worked,
            minutes_in_status: minutes_worked,
            energy: 80,
            needs_break: false,
            consciousness_level: Decimal::from(12),
            evolution_rate: Decimal::new(3, 1),
            expertise_level: 40,
            mastery: BTreeMap::from([(Specialty::Inverters, Decimal::from(40))]),
            work_ethic: Decimal::new(8, 1),
            spending_propensity: Decimal::new(2, 1),
            savings_goal: 900,
            current_task: Some(TaskKind::ProductComparison),
            learning_focus: None,
            tasks_completed: 3,
            breaks_taken: 1,
        }
    }

    #[test]
    fn shift_time_travels_as_hours() {
        let worked = minion(90);
        let json = serde_json::to_value(&worked).unwrap();
        let hours = json
            .get("hoursWorkedInShift")
            .and_then(serde_json::Value::as_str)
            .and_then(|raw| raw.parse::<Decimal>().ok());
        assert_eq!(hours, Some(Decimal::new(15, 1)));
        assert!(json.get("minutesWorkedInShift").is_none());
        assert_eq!(worked.hours_worked_in_shift(), Decimal::new(15, 1));

        // Minutes that are not a clean fraction of an hour still come back.
        let odd = minion(7);
        let back: Minion = serde_json::from_value(serde_json::to_value(&odd).unwrap()).unwrap();
        assert_eq!(back, odd);
    }

    #[test]
    fn negative_shift_hours_are_rejected() {
        let mut json = serde_json::to_value(minion(0)).unwrap();
        if let Some(hours) = json.get_mut("hoursWorkedInShift") {
            *hours = serde_json::Value::from("-1");
        }
        assert!(serde_json::from_value::<Minion>(json).is_err());
    }

    #[test]
    fn persisted_state_uses_document_keys() {
        let state = PersistedState {
            entities: vec![minion(30)],
            aggregate: AggregateSnapshot::default(),
            saved_at: DateTime::from_timestamp(0, 0).unwrap(),
            tick: 0,
            activity: Vec::new(),
        };
        let json = serde_json::to_value(&state).unwrap();
        let entity = json
            .get("entities")
            .and_then(|entities| entities.get(0))
            .unwrap();
        assert!(entity.get("hoursWorkedInShift").is_some());
        assert!(entity.get("consciousnessLevel").is_some());
        assert!(json.get("aggregate").is_some());
        assert_eq!(
            json.get("savedAt").and_then(serde_json::Value::as_str),
            Some("1970-01-01T00:00:00Z")
        );
    }

    #[test]
    fn minimal_document_defaults_optional_fields() {
        let raw = r#"{"entities":[],"aggregate":{"population":0,"totalCredits":0,"totalEarned":0,"tasksCompleted":0,"byStatus":{},"bySpecialty":{},"byShift":{},"active":0,"averageConsciousness":"0","averageEnergy":0},"savedAt":"2025-01-01T00:00:00Z"}"#;
        let state: PersistedState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.tick, 0);
        assert!(state.activity.is_empty());
    }

    #[test]
    fn aggregate_count_defaults_to_zero() {
        let aggregate = AggregateSnapshot::default();
        assert_eq!(aggregate.count(Status::Learning), 0);
    }
}
