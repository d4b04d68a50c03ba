//! Unit of work - a declarative description of one logical multi-row write.
//!
//! A unit lists everything an operation wants to change, together with the
//! row images needed to undo each change. The coordinator applies the writes
//! in a fixed order (cycle, phases, items, audit) and journals an inverse for
//! every write that succeeded.

use std::time::Duration;

use crate::domain::cycle::{AuditEntry, Cycle, ItemAssignment, ItemStatus, Phase, PhaseName};
use crate::domain::foundation::{CycleId, FacilityId, Timestamp};

/// The single cycle-row write of a unit.
#[derive(Debug, Clone)]
pub enum CycleWrite {
    /// Insert a brand new cycle. Undone by deleting it.
    Insert(Cycle),
    /// Overwrite a cycle row. Undone by writing `before` back.
    Update { before: Cycle, after: Cycle },
}

impl CycleWrite {
    pub fn cycle_id(&self) -> CycleId {
        match self {
            CycleWrite::Insert(cycle) => cycle.id(),
            CycleWrite::Update { after, .. } => after.id(),
        }
    }
}

/// A phase-row write.
#[derive(Debug, Clone)]
pub enum PhaseWrite {
    /// Insert a batch of rows for one cycle. Undone by deleting the cycle's rows.
    InsertAll(Vec<Phase>),
    /// Overwrite one row. Undone by writing `before` back.
    Update { before: Phase, after: Phase },
}

/// An item-state write through the gateway.
#[derive(Debug, Clone)]
pub enum ItemWrite {
    /// Conditionally attach an unassigned item to a cycle.
    Assign {
        before: ItemAssignment,
        cycle_id: CycleId,
        phase: PhaseName,
        status: ItemStatus,
    },
    /// Move an assigned item to another phase.
    SetPhase {
        before: ItemAssignment,
        phase: PhaseName,
    },
    /// Clear the cycle assignment of a batch and set their status.
    Release {
        before: Vec<ItemAssignment>,
        status: ItemStatus,
    },
}

/// A condition re-checked inside the unit immediately before the first write.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// The cycle's running phase must still be `phase`, started at `started_at`.
    RunningPhase {
        cycle_id: CycleId,
        phase: PhaseName,
        started_at: Option<Timestamp>,
    },
}

/// Everything one operation writes.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    pub(crate) operation: &'static str,
    pub(crate) facility_id: FacilityId,
    pub(crate) precondition: Option<Precondition>,
    pub(crate) cycle: CycleWrite,
    pub(crate) phases: Vec<PhaseWrite>,
    pub(crate) items: Vec<ItemWrite>,
    pub(crate) audit: Vec<AuditEntry>,
}

impl UnitOfWork {
    pub fn new(operation: &'static str, facility_id: FacilityId, cycle: CycleWrite) -> Self {
        Self {
            operation,
            facility_id,
            precondition: None,
            cycle,
            phases: Vec::new(),
            items: Vec::new(),
            audit: Vec::new(),
        }
    }

    pub fn require(mut self, precondition: Precondition) -> Self {
        self.precondition = Some(precondition);
        self
    }

    pub fn phase(mut self, write: PhaseWrite) -> Self {
        self.phases.push(write);
        self
    }

    pub fn item(mut self, write: ItemWrite) -> Self {
        self.items.push(write);
        self
    }

    pub fn items(mut self, writes: impl IntoIterator<Item = ItemWrite>) -> Self {
        self.items.extend(writes);
        self
    }

    pub fn audit(mut self, entry: AuditEntry) -> Self {
        self.audit.push(entry);
        self
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn cycle_id(&self) -> CycleId {
        self.cycle.cycle_id()
    }
}

/// Outcome of a committed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReceipt {
    pub operation: &'static str,
    pub cycle_id: CycleId,
    pub writes: usize,
    pub duration: Duration,
}
