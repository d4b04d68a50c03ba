//! Read models returned by the cycle handlers.

use serde::Serialize;
use serde_json::Value;

use crate::domain::cycle::{Cycle, CycleStatus, ItemAssignment, Phase, PhaseName, PhaseStatus};
use crate::domain::foundation::{CycleId, Timestamp};

/// Snapshot of one phase row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub name: PhaseName,
    pub order: i16,
    pub status: PhaseStatus,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub duration_minutes: Option<i64>,
    pub phase_data: Value,
}

impl From<&Phase> for PhaseSummary {
    fn from(phase: &Phase) -> Self {
        Self {
            name: phase.name(),
            order: phase.order(),
            status: phase.status(),
            start_time: phase.start_time(),
            end_time: phase.end_time(),
            duration_minutes: phase.duration_minutes(),
            phase_data: phase.phase_data().clone(),
        }
    }
}

/// Header of a cycle plus its phases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    pub cycle_id: CycleId,
    pub cycle_type: String,
    pub status: CycleStatus,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub notes: Option<String>,
    pub item_count: usize,
    pub phases: Vec<PhaseSummary>,
}

impl CycleSummary {
    pub fn new(cycle: &Cycle, phases: &[Phase], item_count: usize) -> Self {
        Self {
            cycle_id: cycle.id(),
            cycle_type: cycle.cycle_type().to_string(),
            status: cycle.status(),
            start_time: cycle.start_time(),
            end_time: cycle.end_time(),
            notes: cycle.notes().map(str::to_string),
            item_count,
            phases: phases.iter().map(PhaseSummary::from).collect(),
        }
    }

    /// The phase currently running, if any.
    pub fn running_phase(&self) -> Option<&PhaseSummary> {
        self.phases.iter().find(|p| p.status == PhaseStatus::Running)
    }
}

/// A cycle with everything attached to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleView {
    pub summary: CycleSummary,
    pub items: Vec<ItemAssignment>,
}
