//! Reprocessing cycle domain.
//!
//! A cycle carries a batch of items through five fixed phases. This module
//! holds the entities and rules; coordination across tables lives in the
//! application layer.

mod aggregate;
mod audit;
mod errors;
mod item;
mod phase;
mod phase_name;
mod status;

pub use aggregate::Cycle;
pub use audit::{AuditAction, AuditEntry, CYCLE_RESOURCE};
pub use errors::{CycleError, TransactionError, UnitStep};
pub use item::{ItemAssignment, ItemStatus, Priority};
pub use phase::{merge_phase_data, Phase};
pub use phase_name::PhaseName;
pub use status::{CycleStatus, PhaseStatus};
