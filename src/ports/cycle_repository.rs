//! Cycle repository port.
//!
//! Defines the contract for persisting cycle header rows. Every call is scoped
//! by facility; a cycle belonging to another facility is invisible.
//!
//! # Design
//!
//! - **Per-statement consistency**: implementations guarantee each call is
//!   atomic on its own, nothing more. Multi-row atomicity is provided by the
//!   transaction coordinator's compensation journal.

use crate::domain::cycle::Cycle;
use crate::domain::foundation::{CycleId, DomainError, FacilityId};
use async_trait::async_trait;

/// Repository port for cycle rows.
#[async_trait]
pub trait CycleRepository: Send + Sync {
    /// Insert a new cycle.
    ///
    /// # Errors
    ///
    /// - `ConstraintViolation` if the id already exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, cycle: &Cycle) -> Result<(), DomainError>;

    /// Overwrite an existing cycle row.
    ///
    /// # Errors
    ///
    /// - `CycleNotFound` if the cycle doesn't exist in its facility
    /// - `DatabaseError` on persistence failure
    async fn update(&self, cycle: &Cycle) -> Result<(), DomainError>;

    /// Find a cycle by ID within a facility.
    async fn find_by_id(
        &self,
        facility_id: &FacilityId,
        id: &CycleId,
    ) -> Result<Option<Cycle>, DomainError>;

    /// Delete a cycle row. Only used to compensate a failed creation.
    ///
    /// # Errors
    ///
    /// - `CycleNotFound` if the cycle doesn't exist in the facility
    async fn delete(&self, facility_id: &FacilityId, id: &CycleId) -> Result<(), DomainError>;
}
