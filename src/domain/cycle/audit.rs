//! Audit entries - immutable records of state-changing operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::foundation::{AuditEntryId, CycleId, FacilityId, Timestamp, UserId};

/// Resource type recorded for every cycle audit entry.
pub const CYCLE_RESOURCE: &str = "reprocessing_cycle";

/// What kind of mutation an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    CycleCreated,
    PhaseTransition,
    CycleCompleted,
    CycleRolledBack,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CycleCreated => "cycle_created",
            AuditAction::PhaseTransition => "phase_transition",
            AuditAction::CycleCompleted => "cycle_completed",
            AuditAction::CycleRolledBack => "cycle_rolled_back",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub actor_id: UserId,
    pub facility_id: FacilityId,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub metadata: Value,
    pub recorded_at: Timestamp,
}

impl AuditEntry {
    /// Starts an entry about a cycle.
    pub fn for_cycle(
        actor_id: UserId,
        facility_id: FacilityId,
        action: AuditAction,
        cycle_id: CycleId,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor_id,
            facility_id,
            action,
            resource_type: CYCLE_RESOURCE.to_string(),
            resource_id: cycle_id.to_string(),
            old_values: None,
            new_values: None,
            metadata: Value::Object(Default::default()),
            recorded_at,
        }
    }

    pub fn with_old_values(mut self, values: Value) -> Self {
        self.old_values = Some(values);
        self
    }

    pub fn with_new_values(mut self, values: Value) -> Self {
        self.new_values = Some(values);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns true if this entry is about the given cycle.
    pub fn concerns(&self, cycle_id: CycleId) -> bool {
        self.resource_type == CYCLE_RESOURCE && self.resource_id == cycle_id.to_string()
    }
}
