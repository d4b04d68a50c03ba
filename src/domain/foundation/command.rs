//! Command infrastructure for cycle handlers.
//!
//! `CommandMetadata` carries the identity context (actor and facility) that
//! the session layer supplies for every mutating call. Both values are
//! mandatory; handlers call [`CommandMetadata::identity`] before doing any
//! work so a missing value surfaces as a validation failure.

use serde::{Deserialize, Serialize};

use super::{FacilityId, UserId, ValidationError};

/// Metadata context for command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Operator executing this command, as reported by the session layer.
    pub actor_id: String,

    /// Facility the operator is acting in.
    pub facility_id: String,

    /// Links related operations across a single user request.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

/// Validated actor/facility pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub actor_id: UserId,
    pub facility_id: FacilityId,
}

impl CommandMetadata {
    /// Creates new command metadata from raw session values.
    pub fn new(actor_id: impl Into<String>, facility_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            facility_id: facility_id.into(),
            correlation_id: None,
        }
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Returns the correlation ID if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Validates and returns the actor/facility pair.
    pub fn identity(&self) -> Result<Identity, ValidationError> {
        Ok(Identity {
            actor_id: UserId::new(self.actor_id.clone())?,
            facility_id: FacilityId::new(self.facility_id.clone())?,
        })
    }
}
