//! Phase repository port.
//!
//! Phase rows are keyed by `(cycle_id, phase_name)`. They carry no facility
//! column, so callers resolve the owning cycle through `CycleRepository`
//! first.

use crate::domain::cycle::{Phase, PhaseName, PhaseStatus};
use crate::domain::foundation::{CycleId, DomainError};
use async_trait::async_trait;

/// Repository port for phase rows.
#[async_trait]
pub trait PhaseRepository: Send + Sync {
    /// Insert a batch of phase rows in one statement.
    async fn insert_all(&self, phases: &[Phase]) -> Result<(), DomainError>;

    /// Overwrite one phase row if its stored status is still `expected`.
    ///
    /// # Errors
    ///
    /// - `PhaseNotFound` if no row exists for `(cycle_id, name)`
    /// - `ConcurrentModification` if the stored status is no longer `expected`
    async fn update(&self, phase: &Phase, expected: PhaseStatus) -> Result<(), DomainError>;

    /// All phases of a cycle, ordered by phase order.
    async fn find_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Phase>, DomainError>;

    /// The phase currently marked running, if any.
    async fn find_running(&self, cycle_id: &CycleId) -> Result<Option<Phase>, DomainError>;

    /// One phase row by name.
    async fn find(&self, cycle_id: &CycleId, name: PhaseName)
        -> Result<Option<Phase>, DomainError>;

    /// Delete every phase row of a cycle. Only used to compensate a failed creation.
    async fn delete_by_cycle(&self, cycle_id: &CycleId) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PhaseRepository) {}
    }
}
