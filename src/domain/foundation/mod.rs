//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the reprocessing domain.

mod command;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use command::{CommandMetadata, Identity};
pub use errors::{DomainError, ErrorCategory, ErrorCode, ValidationError};
pub use ids::{AuditEntryId, CycleId, FacilityId, ItemId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
