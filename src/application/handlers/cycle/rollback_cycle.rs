//! RollbackCycleHandler - Command handler for undoing a freshly created cycle.
//!
//! Thin wrapper over [`TransactionCoordinator::rollback_cycle_creation`] that
//! validates the caller identity first.

use std::sync::Arc;

use serde::Serialize;

use crate::application::transaction::TransactionCoordinator;
use crate::domain::cycle::CycleError;
use crate::domain::foundation::{CommandMetadata, CycleId, ItemId};

/// Command to roll back a cycle that has not progressed past bath1.
#[derive(Debug, Clone)]
pub struct RollbackCycleCommand {
    pub cycle_id: CycleId,
}

/// Result of a successful rollback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollbackSummary {
    pub cycle_id: CycleId,
    pub items_released: Vec<ItemId>,
}

/// Handler for rolling back cycle creation.
pub struct RollbackCycleHandler {
    coordinator: Arc<TransactionCoordinator>,
}

impl RollbackCycleHandler {
    pub fn new(coordinator: Arc<TransactionCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn handle(
        &self,
        cmd: RollbackCycleCommand,
        metadata: CommandMetadata,
    ) -> Result<RollbackSummary, CycleError> {
        let identity = metadata.identity()?;
        let rollback = self
            .coordinator
            .rollback_cycle_creation(cmd.cycle_id, &identity)
            .await?;

        Ok(RollbackSummary {
            cycle_id: cmd.cycle_id,
            items_released: rollback.items_released,
        })
    }
}
