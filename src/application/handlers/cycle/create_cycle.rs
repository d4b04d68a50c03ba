//! CreateCycleHandler - Command handler for starting a reprocessing cycle.
//!
//! Builds the cycle, its fixed five-phase set with bath1 running, and one
//! assignment per item, then submits everything to the coordinator as a
//! single unit of work.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::application::audit::AuditRecorder;
use crate::application::transaction::{
    CycleWrite, ItemWrite, PhaseWrite, TransactionCoordinator, UnitOfWork,
};
use crate::domain::cycle::{Cycle, CycleError, ItemStatus, Phase, PhaseName};
use crate::domain::foundation::{CommandMetadata, ItemId, Timestamp, ValidationError};
use crate::ports::ItemStateGateway;

use super::summary::CycleSummary;

const OPERATION: &str = "create_cycle";

/// Command to create a new cycle.
#[derive(Debug, Clone)]
pub struct CreateCycleCommand {
    /// Items entering the cycle. Must be non-empty and unique.
    pub item_ids: Vec<String>,
    /// Free-form cycle tag, e.g. "routine".
    pub cycle_type: String,
    pub notes: Option<String>,
}

/// Handler for creating cycles.
pub struct CreateCycleHandler {
    items: Arc<dyn ItemStateGateway>,
    coordinator: Arc<TransactionCoordinator>,
}

impl CreateCycleHandler {
    pub fn new(items: Arc<dyn ItemStateGateway>, coordinator: Arc<TransactionCoordinator>) -> Self {
        Self { items, coordinator }
    }

    pub async fn handle(
        &self,
        cmd: CreateCycleCommand,
        metadata: CommandMetadata,
    ) -> Result<CycleSummary, CycleError> {
        // 1. Validate input
        let identity = metadata.identity()?;
        let item_ids = parse_item_ids(&cmd.item_ids)?;
        let now = Timestamp::now();
        let cycle = Cycle::new(
            identity.facility_id.clone(),
            cmd.cycle_type,
            cmd.notes,
            identity.actor_id.clone(),
            now,
        )?;
        let cycle_id = cycle.id();

        // 2. Every item must exist and be free
        let found = self
            .items
            .find_by_ids(&item_ids)
            .await
            .map_err(|e| CycleError::from_port(OPERATION, e))?;
        let mut snapshots = Vec::with_capacity(item_ids.len());
        for id in &item_ids {
            let item = found
                .iter()
                .find(|i| &i.item_id == id)
                .ok_or_else(|| CycleError::not_found(format!("Item not found: {}", id)))?;
            if let Some(existing) = item.current_cycle_id {
                warn!(item_id = %id, existing_cycle = %existing, "Item already in a cycle");
                return Err(CycleError::conflict(format!(
                    "Item {} is already assigned to cycle {}",
                    id, existing
                )));
            }
            snapshots.push(item.clone());
        }

        // 3. One unit: cycle, phases, assignments, audit
        let phases = Phase::initial_set(cycle_id, now);
        let entry = AuditRecorder::cycle_created(&identity, &cycle, &item_ids, now);
        let unit = UnitOfWork::new(
            OPERATION,
            identity.facility_id.clone(),
            CycleWrite::Insert(cycle.clone()),
        )
        .phase(PhaseWrite::InsertAll(phases.clone()))
        .items(snapshots.into_iter().map(|before| ItemWrite::Assign {
            before,
            cycle_id,
            phase: PhaseName::first(),
            status: ItemStatus::IN_CYCLE,
        }))
        .audit(entry);
        self.coordinator.run(unit).await?;

        info!(
            cycle_id = %cycle_id,
            facility_id = %identity.facility_id,
            cycle_type = %cycle.cycle_type(),
            item_count = item_ids.len(),
            correlation_id = metadata.correlation_id().unwrap_or_default(),
            "Cycle created"
        );
        Ok(CycleSummary::new(&cycle, &phases, item_ids.len()))
    }
}

fn parse_item_ids(raw: &[String]) -> Result<Vec<ItemId>, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::empty_field("item_ids"));
    }
    let mut seen = HashSet::with_capacity(raw.len());
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        let id = ItemId::new(value.clone())?;
        if !seen.insert(id.clone()) {
            return Err(ValidationError::duplicate("item_ids", id.as_str()));
        }
        ids.push(id);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::ops;
    use crate::application::handlers::cycle::test_support::*;
    use crate::domain::cycle::{AuditAction, CycleStatus, PhaseStatus};
    use crate::domain::foundation::ErrorCode;

    fn command(ids: &[&str]) -> CreateCycleCommand {
        CreateCycleCommand {
            item_ids: ids.iter().map(|s| s.to_string()).collect(),
            cycle_type: "routine".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn creates_cycle_with_phases_and_assignments() {
        let backend = backend_with(&[("T1", 1), ("T2", 2)]).await;
        let handler = create_handler(&backend);

        let summary = handler
            .handle(command(&["T1", "T2"]), metadata())
            .await
            .unwrap();

        assert_eq!(summary.status, CycleStatus::InPhase(PhaseName::Bath1));
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.phases.len(), 5);
        assert_eq!(summary.running_phase().unwrap().name, PhaseName::Bath1);
        assert!(summary.phases[1..]
            .iter()
            .all(|p| p.status == PhaseStatus::Pending));

        for id in ["T1", "T2"] {
            let item = backend.items.get(&item(id)).await.unwrap();
            assert!(item.is_assigned_to(summary.cycle_id));
            assert_eq!(item.current_phase, Some(PhaseName::Bath1));
            assert_eq!(item.status, ItemStatus::Dirty);
        }
        let entries = backend.audit.entries_for(summary.cycle_id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::CycleCreated);
        assert_eq!(entries[0].metadata["item_count"], 2);
    }

    #[tokio::test]
    async fn empty_item_list_is_validation_error() {
        let backend = backend_with(&[]).await;
        let err = create_handler(&backend)
            .handle(command(&[]), metadata())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CycleError::Validation(ValidationError::empty_field("item_ids"))
        );
        assert_eq!(backend.cycles.count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_item_ids_are_rejected() {
        let backend = backend_with(&[("T1", 1)]).await;
        let err = create_handler(&backend)
            .handle(command(&["T1", "T1"]), metadata())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[tokio::test]
    async fn blank_cycle_type_is_rejected() {
        let backend = backend_with(&[("T1", 1)]).await;
        let mut cmd = command(&["T1"]);
        cmd.cycle_type = "  ".to_string();
        let err = create_handler(&backend)
            .handle(cmd, metadata())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CycleError::Validation(ValidationError::empty_field("cycle_type"))
        );
    }

    #[tokio::test]
    async fn missing_facility_is_rejected() {
        let backend = backend_with(&[("T1", 1)]).await;
        let err = create_handler(&backend)
            .handle(command(&["T1"]), CommandMetadata::new("tech-1", ""))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CycleError::Validation(ValidationError::empty_field("facility_id"))
        );
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let backend = backend_with(&[("T1", 1)]).await;
        let err = create_handler(&backend)
            .handle(command(&["T1", "T9"]), metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, CycleError::NotFound(_)));
        assert_eq!(backend.cycles.count().await, 0);
        assert!(!backend.items.get(&item("T1")).await.unwrap().is_assigned());
    }

    #[tokio::test]
    async fn item_in_another_cycle_is_conflict() {
        let backend = backend_with(&[("T1", 1), ("T2", 1)]).await;
        let handler = create_handler(&backend);
        handler.handle(command(&["T2"]), metadata()).await.unwrap();

        let err = handler
            .handle(command(&["T1", "T2"]), metadata())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ConflictError");
        assert_eq!(backend.cycles.count().await, 1);
        assert!(!backend.items.get(&item("T1")).await.unwrap().is_assigned());
    }

    #[tokio::test]
    async fn failed_phase_insert_leaves_nothing_behind() {
        let backend = backend_with(&[("T1", 1)]).await;
        backend
            .failures
            .fail_once(ops::PHASE_INSERT, ErrorCode::DatabaseError)
            .await;

        let err = create_handler(&backend)
            .handle(command(&["T1"]), metadata())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "TransactionError");
        assert_eq!(backend.cycles.count().await, 0);
        assert_eq!(backend.phases.count().await, 0);
        assert!(!backend.items.get(&item("T1")).await.unwrap().is_assigned());
        assert!(backend.audit.entries().await.is_empty());
    }
}
