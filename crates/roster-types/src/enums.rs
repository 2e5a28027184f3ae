//! Enumeration types for the roster simulation.
//!
//! Every enumeration here is a closed set. Catalog data attached to a
//! variant (base credits, shift windows, purchase prices) lives next to the
//! variant so callers never consult a parallel lookup table.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// The single active state of a minion's work cycle.
///
/// Every minion is in exactly one status. Transitions between them are
/// governed by the legality table in `roster-agents`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Status {
    /// Available and waiting for a shift window or a study session.
    #[default]
    Idle,
    /// On shift, accumulating hours and completing tasks.
    Working,
    /// Recovering after a full work cycle.
    OnBreak,
    /// Running an autonomous self-study session.
    Learning,
}

impl Status {
    /// All statuses in declaration order.
    pub const ALL: [Self; 4] = [Self::Idle, Self::Working, Self::OnBreak, Self::Learning];
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Organisational role assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    /// Leads a group of operators.
    Coordinator,
    /// Deep knowledge of one domain.
    Specialist,
    /// General document processing.
    Operator,
}

// ---------------------------------------------------------------------------
// Specialty
// ---------------------------------------------------------------------------

/// Knowledge domain a minion can specialise in or study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Specialty {
    /// Photovoltaic module specifications.
    SolarPanels,
    /// String and micro inverters.
    Inverters,
    /// Battery chemistry and storage systems.
    Batteries,
    /// Racking and mounting hardware.
    MountingSystems,
    /// Electrical wiring standards.
    ElectricalStandards,
    /// Grid connection and export rules.
    GridConnection,
    /// Site safety procedures.
    SafetyProtocols,
    /// Australian regulatory framework.
    AustralianRegulations,
    /// Installation procedures and sequencing.
    InstallationProcedures,
    /// Ongoing system maintenance.
    Maintenance,
}

impl Specialty {
    /// All domains in round-robin assignment order.
    pub const ALL: [Self; 10] = [
        Self::SolarPanels,
        Self::Inverters,
        Self::Batteries,
        Self::MountingSystems,
        Self::ElectricalStandards,
        Self::GridConnection,
        Self::SafetyProtocols,
        Self::AustralianRegulations,
        Self::InstallationProcedures,
        Self::Maintenance,
    ];

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::SolarPanels => "solar panels",
            Self::Inverters => "inverters",
            Self::Batteries => "batteries",
            Self::MountingSystems => "mounting systems",
            Self::ElectricalStandards => "electrical standards",
            Self::GridConnection => "grid connection",
            Self::SafetyProtocols => "safety protocols",
            Self::AustralianRegulations => "australian regulations",
            Self::InstallationProcedures => "installation procedures",
            Self::Maintenance => "maintenance",
        }
    }
}

// ---------------------------------------------------------------------------
// Shift
// ---------------------------------------------------------------------------

/// Eight-hour shift window a minion is rostered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Shift {
    /// 07:00 to 14:59.
    Morning,
    /// 15:00 to 22:59.
    Afternoon,
    /// 23:00 to 06:59 (wraps midnight).
    Night,
}

impl Shift {
    /// All shifts in round-robin assignment order.
    pub const ALL: [Self; 3] = [Self::Morning, Self::Afternoon, Self::Night];

    /// Hour of day (0-23) at which the shift starts.
    pub const fn start_hour(self) -> u32 {
        match self {
            Self::Morning => 7,
            Self::Afternoon => 15,
            Self::Night => 23,
        }
    }

    /// Whether the given hour of day (0-23) falls inside this shift.
    pub const fn contains_hour(self, hour: u32) -> bool {
        match self {
            Self::Morning => hour >= 7 && hour < 15,
            Self::Afternoon => hour >= 15 && hour < 23,
            Self::Night => hour >= 23 || hour < 7,
        }
    }
}

// ---------------------------------------------------------------------------
// Work cycle profile
// ---------------------------------------------------------------------------

/// Named work/break rhythm. Durations are configured per profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum WorkCycle {
    /// 6 hours on, 1.5 hours off by default.
    Standard,
    /// 4 hours on, 2 hours off by default.
    Intensive,
    /// 8 hours on, 30 minutes off by default.
    Maintenance,
}

impl WorkCycle {
    /// All profiles in round-robin assignment order.
    pub const ALL: [Self; 3] = [Self::Standard, Self::Intensive, Self::Maintenance];
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// How demanding a task is relative to a minion's expertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Difficulty {
    /// Suitable for anyone with expertise up to 40.
    Easy,
    /// Suitable for everyone.
    Medium,
    /// Requires expertise of at least 30.
    Hard,
}

/// A unit of paid work a minion can be assigned during a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TaskKind {
    /// Extract data from a product spec sheet.
    SpecSheetProcessing,
    /// Study an installation manual end to end.
    InstallationManualStudy,
    /// Analyse a standards document.
    StandardsAnalysis,
    /// Compare competing products.
    ProductComparison,
    /// Answer a technical question.
    TechnicalQaResponse,
    /// OCR a scanned document.
    DocumentOcrProcessing,
    /// Combine several sources into one summary.
    KnowledgeSynthesis,
}

impl TaskKind {
    /// The full task catalog in assignment order.
    pub const ALL: [Self; 7] = [
        Self::SpecSheetProcessing,
        Self::InstallationManualStudy,
        Self::StandardsAnalysis,
        Self::ProductComparison,
        Self::TechnicalQaResponse,
        Self::DocumentOcrProcessing,
        Self::KnowledgeSynthesis,
    ];

    /// Credits paid before the work-ethic multiplier.
    pub const fn base_credits(self) -> u64 {
        match self {
            Self::SpecSheetProcessing => 25,
            Self::InstallationManualStudy => 45,
            Self::StandardsAnalysis => 75,
            Self::ProductComparison => 35,
            Self::TechnicalQaResponse => 15,
            Self::DocumentOcrProcessing => 20,
            Self::KnowledgeSynthesis => 55,
        }
    }

    /// Difficulty tier used for assignment filtering.
    pub const fn difficulty(self) -> Difficulty {
        match self {
            Self::SpecSheetProcessing | Self::TechnicalQaResponse | Self::DocumentOcrProcessing => {
                Difficulty::Easy
            }
            Self::InstallationManualStudy | Self::ProductComparison => Difficulty::Medium,
            Self::StandardsAnalysis | Self::KnowledgeSynthesis => Difficulty::Hard,
        }
    }

    /// Domain whose mastery grows when this task completes.
    pub const fn domain(self) -> Specialty {
        match self {
            Self::SpecSheetProcessing => Specialty::SolarPanels,
            Self::InstallationManualStudy => Specialty::InstallationProcedures,
            Self::StandardsAnalysis => Specialty::ElectricalStandards,
            Self::ProductComparison => Specialty::Inverters,
            Self::TechnicalQaResponse => Specialty::AustralianRegulations,
            Self::DocumentOcrProcessing => Specialty::Batteries,
            Self::KnowledgeSynthesis => Specialty::GridConnection,
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::SpecSheetProcessing => "spec sheet processing",
            Self::InstallationManualStudy => "installation manual study",
            Self::StandardsAnalysis => "standards analysis",
            Self::ProductComparison => "product comparison",
            Self::TechnicalQaResponse => "technical Q&A response",
            Self::DocumentOcrProcessing => "document OCR processing",
            Self::KnowledgeSynthesis => "knowledge synthesis",
        }
    }
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

/// Something a minion can spend credits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PurchaseItem {
    /// Raises the consciousness evolution rate.
    LearningModule,
    /// Restores 20 energy.
    EnergyBooster,
    /// Raises expertise by 5.
    KnowledgeDatabaseAccess,
    /// Raises work ethic by 0.1.
    CollaborationTools,
    /// Raises consciousness by 2.
    ConsciousnessEnhancer,
}

impl PurchaseItem {
    /// The full purchase catalog.
    pub const ALL: [Self; 5] = [
        Self::LearningModule,
        Self::EnergyBooster,
        Self::KnowledgeDatabaseAccess,
        Self::CollaborationTools,
        Self::ConsciousnessEnhancer,
    ];

    /// Price in credits.
    pub const fn cost(self) -> u64 {
        match self {
            Self::LearningModule => 100,
            Self::EnergyBooster => 50,
            Self::KnowledgeDatabaseAccess => 150,
            Self::CollaborationTools => 75,
            Self::ConsciousnessEnhancer => 200,
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::LearningModule => "Advanced Learning Module",
            Self::EnergyBooster => "Energy Booster",
            Self::KnowledgeDatabaseAccess => "Knowledge Database Access",
            Self::CollaborationTools => "Collaboration Tools",
            Self::ConsciousnessEnhancer => "Consciousness Enhancer",
        }
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// Category of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActivityKind {
    /// Shift started or ended, task completed.
    Work,
    /// Break started or finished.
    Break,
    /// Self-study started or finished.
    Learning,
    /// Purchase or savings goal.
    Economy,
    /// Consciousness milestone or promotion.
    Milestone,
    /// Snapshot saved or restored.
    Persistence,
    /// A rejected transition or a failed save.
    Fault,
    /// An operator command such as a population reset.
    Operator,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_cover_every_hour_exactly_once() {
        for hour in 0..24 {
            let covering = Shift::ALL
                .iter()
                .filter(|shift| shift.contains_hour(hour))
                .count();
            assert_eq!(covering, 1, "hour {hour} covered by {covering} shifts");
        }
    }

    #[test]
    fn shift_start_is_inside_its_window() {
        for shift in Shift::ALL {
            assert!(shift.contains_hour(shift.start_hour()));
        }
    }

    #[test]
    fn every_task_has_positive_pay() {
        for task in TaskKind::ALL {
            assert!(task.base_credits() > 0);
        }
    }

    #[test]
    fn status_serializes_as_variant_name() {
        let json = serde_json::to_string(&Status::OnBreak).ok();
        assert_eq!(json.as_deref(), Some("\"OnBreak\""));
    }
}
