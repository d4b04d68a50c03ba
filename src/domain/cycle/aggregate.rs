//! Cycle aggregate - one pass of a batch of items through the pipeline.
//!
//! The cycle row only carries header data and the status; phase rows and item
//! assignments live in their own tables and are coordinated by the
//! application layer.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CycleId, DomainError, ErrorCode, FacilityId, Timestamp, UserId, ValidationError,
};

use super::{CycleStatus, PhaseName};

/// The Cycle aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    id: CycleId,
    facility_id: FacilityId,
    cycle_type: String,
    status: CycleStatus,
    start_time: Timestamp,
    end_time: Option<Timestamp>,
    notes: Option<String>,
    created_by: UserId,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Cycle {
    /// Creates a new cycle positioned at the first phase.
    pub fn new(
        facility_id: FacilityId,
        cycle_type: impl Into<String>,
        notes: Option<String>,
        created_by: UserId,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let cycle_type = cycle_type.into();
        if cycle_type.trim().is_empty() {
            return Err(ValidationError::empty_field("cycle_type"));
        }
        let notes = notes.filter(|n| !n.trim().is_empty());

        Ok(Self {
            id: CycleId::new(),
            facility_id,
            cycle_type,
            status: CycleStatus::InPhase(PhaseName::first()),
            start_time: now,
            end_time: None,
            notes,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitutes a cycle from persisted data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: CycleId,
        facility_id: FacilityId,
        cycle_type: String,
        status: CycleStatus,
        start_time: Timestamp,
        end_time: Option<Timestamp>,
        notes: Option<String>,
        created_by: UserId,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            facility_id,
            cycle_type,
            status,
            start_time,
            end_time,
            notes,
            created_by,
            created_at,
            updated_at,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> CycleId {
        self.id
    }

    pub fn facility_id(&self) -> &FacilityId {
        &self.facility_id
    }

    pub fn cycle_type(&self) -> &str {
        &self.cycle_type
    }

    pub fn status(&self) -> CycleStatus {
        self.status
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the cycle reached `completed` or `rolled_back`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    // ───────────────────────────────────────────────────────────────
    // Transitions
    // ───────────────────────────────────────────────────────────────

    /// Moves the cycle status to mirror a newly running phase.
    pub fn advance_to(&mut self, phase: PhaseName, at: Timestamp) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.status = CycleStatus::InPhase(phase);
        self.updated_at = at;
        Ok(())
    }

    /// Finalizes the cycle.
    pub fn complete(&mut self, at: Timestamp) -> Result<(), DomainError> {
        self.finish(CycleStatus::Completed, at)
    }

    /// Marks a just-created cycle as undone.
    pub fn roll_back(&mut self, at: Timestamp) -> Result<(), DomainError> {
        self.finish(CycleStatus::RolledBack, at)
    }

    fn finish(&mut self, status: CycleStatus, at: Timestamp) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.status = status;
        self.end_time = Some(at);
        self.updated_at = at;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::CycleAlreadyTerminal,
                format!("Cycle {} is already {}", self.id, self.status),
            )
            .with_detail("cycle_id", self.id.to_string()));
        }
        Ok(())
    }
}
