//! ItemStateGateway port - the inventory system's view of items.
//!
//! Item rows belong to the inventory system. The engine never touches item
//! schema directly; every per-item mutation goes through this port.
//!
//! ## Exclusivity
//!
//! `assign_to_cycle` is a conditional write: it only succeeds while the item's
//! `current_cycle_id` is null. Implementations must perform the check and the
//! write in one statement so a race yields `ItemAlreadyAssigned` instead of a
//! double assignment.

use async_trait::async_trait;

use crate::domain::cycle::{ItemAssignment, ItemStatus, PhaseName};
use crate::domain::foundation::{CycleId, DomainError, ItemId};

/// Port for reading and mutating item cycle state.
#[async_trait]
pub trait ItemStateGateway: Send + Sync {
    /// Set an item's inventory status.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the item doesn't exist
    async fn set_status(&self, item_id: &ItemId, status: ItemStatus) -> Result<(), DomainError>;

    /// Set the phase an assigned item is in.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the item doesn't exist
    async fn set_phase(&self, item_id: &ItemId, phase: PhaseName) -> Result<(), DomainError>;

    /// Clear cycle and phase for the given items and set their status.
    ///
    /// Returns the number of rows changed.
    async fn clear_cycle_assignment(
        &self,
        item_ids: &[ItemId],
        status: ItemStatus,
    ) -> Result<u64, DomainError>;

    /// All items with the given status.
    async fn list_by_status(&self, status: ItemStatus) -> Result<Vec<ItemAssignment>, DomainError>;

    /// Items by id; unknown ids are omitted.
    async fn find_by_ids(&self, item_ids: &[ItemId]) -> Result<Vec<ItemAssignment>, DomainError>;

    /// All items currently assigned to a cycle, ordered by item id.
    async fn list_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<ItemAssignment>, DomainError>;

    /// Assign an unassigned item to a cycle.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the item doesn't exist
    /// - `ItemAlreadyAssigned` if `current_cycle_id` is not null
    async fn assign_to_cycle(
        &self,
        item_id: &ItemId,
        cycle_id: &CycleId,
        phase: PhaseName,
        status: ItemStatus,
    ) -> Result<(), DomainError>;

    /// Write back a previously captured snapshot. Used by compensation.
    async fn restore(&self, snapshot: &ItemAssignment) -> Result<(), DomainError>;
}
