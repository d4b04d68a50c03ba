//! CompleteCycleHandler - Command handler for finalizing a cycle.
//!
//! The running phase is treated as the last phase of the flow. Pending phases
//! that were never reached stay pending.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::application::audit::AuditRecorder;
use crate::application::transaction::{
    CycleWrite, ItemWrite, PhaseWrite, Precondition, TransactionCoordinator, UnitOfWork,
};
use crate::domain::cycle::{CycleError, ItemStatus, PhaseName};
use crate::domain::foundation::{CommandMetadata, CycleId, Timestamp};
use crate::ports::{CycleRepository, ItemStateGateway, PhaseRepository};

const OPERATION: &str = "complete_cycle";

/// Command to complete a cycle.
#[derive(Debug, Clone)]
pub struct CompleteCycleCommand {
    pub cycle_id: CycleId,
    /// Reference to an externally produced receipt, e.g. a sterilization record.
    pub receipt_ref: Option<String>,
}

/// Result of a successful completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionSummary {
    pub cycle_id: CycleId,
    pub final_phase: PhaseName,
    pub items_returned: usize,
    pub end_time: Timestamp,
    pub message: String,
}

/// Message reported to the operator after completion.
pub fn completion_message(items_returned: usize) -> String {
    format!(
        "Cycle completed successfully. {} item(s) returned to inventory.",
        items_returned
    )
}

/// Handler for completing cycles.
pub struct CompleteCycleHandler {
    cycles: Arc<dyn CycleRepository>,
    phases: Arc<dyn PhaseRepository>,
    items: Arc<dyn ItemStateGateway>,
    coordinator: Arc<TransactionCoordinator>,
}

impl CompleteCycleHandler {
    pub fn new(
        cycles: Arc<dyn CycleRepository>,
        phases: Arc<dyn PhaseRepository>,
        items: Arc<dyn ItemStateGateway>,
        coordinator: Arc<TransactionCoordinator>,
    ) -> Self {
        Self {
            cycles,
            phases,
            items,
            coordinator,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteCycleCommand,
        metadata: CommandMetadata,
    ) -> Result<CompletionSummary, CycleError> {
        let identity = metadata.identity()?;
        let cycle_id = cmd.cycle_id;
        let port_err = |e| CycleError::from_port(OPERATION, e);

        // 1. Load the cycle and its running phase
        let before = self
            .cycles
            .find_by_id(&identity.facility_id, &cycle_id)
            .await
            .map_err(port_err)?
            .ok_or_else(|| CycleError::not_found(format!("Cycle not found: {}", cycle_id)))?;
        if before.is_terminal() {
            return Err(CycleError::conflict(format!(
                "Cycle {} is already {}",
                cycle_id,
                before.status()
            )));
        }
        let running = self
            .phases
            .find_running(&cycle_id)
            .await
            .map_err(port_err)?
            .ok_or_else(|| {
                CycleError::not_found(format!("No running phase for cycle {}", cycle_id))
            })?;
        let final_phase = running.name();

        // 2. Build the terminal rows
        let assigned = self.items.list_by_cycle(&cycle_id).await.map_err(port_err)?;
        let items_returned = assigned.len();
        let now = Timestamp::now();
        let mut finished = running.clone();
        finished
            .complete(now, None)
            .map_err(|e| CycleError::conflict(e.message))?;
        let mut after = before.clone();
        after
            .complete(now)
            .map_err(|e| CycleError::conflict(e.message))?;

        let entry = AuditRecorder::cycle_completed(
            &identity,
            &before,
            &after,
            final_phase,
            items_returned,
            cmd.receipt_ref.as_deref(),
            now,
        );
        let mut unit = UnitOfWork::new(
            OPERATION,
            identity.facility_id.clone(),
            CycleWrite::Update { before, after },
        )
        .require(Precondition::RunningPhase {
            cycle_id,
            phase: final_phase,
            started_at: running.start_time(),
        })
        .phase(PhaseWrite::Update {
            before: running,
            after: finished,
        });
        if !assigned.is_empty() {
            unit = unit.item(ItemWrite::Release {
                before: assigned,
                status: ItemStatus::RELEASED,
            });
        }

        // 3. Apply
        self.coordinator.run(unit.audit(entry)).await?;

        info!(
            cycle_id = %cycle_id,
            final_phase = %final_phase,
            items_returned,
            "Cycle completed"
        );
        Ok(CompletionSummary {
            cycle_id,
            final_phase,
            items_returned,
            end_time: now,
            message: completion_message(items_returned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::ops;
    use crate::application::handlers::cycle::test_support::*;
    use crate::domain::cycle::{AuditAction, CycleStatus, PhaseStatus};
    use crate::domain::foundation::ErrorCode;

    fn command(cycle_id: CycleId) -> CompleteCycleCommand {
        CompleteCycleCommand {
            cycle_id,
            receipt_ref: None,
        }
    }

    #[test]
    fn message_reports_item_count() {
        assert_eq!(
            completion_message(1),
            "Cycle completed successfully. 1 item(s) returned to inventory."
        );
    }

    #[tokio::test]
    async fn completes_cycle_and_releases_items() {
        let backend = backend_with(&[("T1", 1), ("T2", 1)]).await;
        let cycle_id = create(&backend, &["T1", "T2"]).await;

        let summary = complete_handler(&backend)
            .handle(command(cycle_id), metadata())
            .await
            .unwrap();

        assert_eq!(summary.items_returned, 2);
        assert_eq!(summary.final_phase, PhaseName::Bath1);
        assert_eq!(summary.message, completion_message(2));

        let cycle = backend.cycles.get(&cycle_id).await.unwrap();
        assert_eq!(cycle.status(), CycleStatus::Completed);
        assert!(cycle.end_time().is_some());
        assert_eq!(backend.phases.running_count(&cycle_id).await, 0);
        for assignment in backend.items.all().await {
            assert!(!assignment.is_assigned());
            assert_eq!(assignment.status, ItemStatus::Available);
        }
    }

    #[tokio::test]
    async fn untouched_phases_stay_pending() {
        let backend = backend_with(&[("T1", 1)]).await;
        let cycle_id = create(&backend, &["T1"]).await;

        complete_handler(&backend)
            .handle(command(cycle_id), metadata())
            .await
            .unwrap();

        let phases = backend.phases.find_by_cycle(&cycle_id).await.unwrap();
        assert_eq!(phases[0].status(), PhaseStatus::Completed);
        assert!(phases[1..]
            .iter()
            .all(|p| p.status() == PhaseStatus::Pending));
    }

    #[tokio::test]
    async fn receipt_reference_is_audited() {
        let backend = backend_with(&[("T1", 1)]).await;
        let cycle_id = create(&backend, &["T1"]).await;
        let mut cmd = command(cycle_id);
        cmd.receipt_ref = Some("AUTOCLAVE-0042".to_string());

        complete_handler(&backend).handle(cmd, metadata()).await.unwrap();

        let entries = backend.audit.entries_for(cycle_id).await;
        let completed = entries
            .iter()
            .find(|e| e.action == AuditAction::CycleCompleted)
            .unwrap();
        assert_eq!(completed.metadata["receipt_ref"], "AUTOCLAVE-0042");
        assert_eq!(completed.metadata["items_returned"], 1);
    }

    #[tokio::test]
    async fn second_completion_is_conflict() {
        let backend = backend_with(&[("T1", 1)]).await;
        let cycle_id = create(&backend, &["T1"]).await;
        let handler = complete_handler(&backend);
        handler.handle(command(cycle_id), metadata()).await.unwrap();

        let err = handler.handle(command(cycle_id), metadata()).await.unwrap_err();
        assert!(matches!(err, CycleError::Conflict(_)));
        assert_eq!(
            backend.audit.count_action(AuditAction::CycleCompleted).await,
            1
        );
    }

    #[tokio::test]
    async fn no_running_phase_is_not_found_and_changes_nothing() {
        let backend = backend_with(&[("T1", 1)]).await;
        let cycle_id = create(&backend, &["T1"]).await;
        // Simulate a cycle whose running phase was lost.
        let mut bath1 = backend
            .phases
            .find_running(&cycle_id)
            .await
            .unwrap()
            .unwrap();
        bath1.fail(Timestamp::now()).unwrap();
        backend
            .phases
            .update(&bath1, PhaseStatus::Running)
            .await
            .unwrap();
        let cycle_before = backend.cycles.get(&cycle_id).await.unwrap();
        let items_before = backend.items.all().await;

        let err = complete_handler(&backend)
            .handle(command(cycle_id), metadata())
            .await
            .unwrap_err();

        assert!(matches!(err, CycleError::NotFound(_)));
        assert_eq!(backend.cycles.get(&cycle_id).await.unwrap(), cycle_before);
        assert_eq!(backend.items.all().await, items_before);
        assert_eq!(backend.audit.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_release_restores_cycle() {
        let backend = backend_with(&[("T1", 1)]).await;
        let cycle_id = create(&backend, &["T1"]).await;
        backend
            .failures
            .fail_once(ops::ITEM_CLEAR, ErrorCode::ConnectionFailed)
            .await;

        let err = complete_handler(&backend)
            .handle(command(cycle_id), metadata())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "TransactionError");
        let cycle = backend.cycles.get(&cycle_id).await.unwrap();
        assert_eq!(cycle.status(), CycleStatus::InPhase(PhaseName::Bath1));
        assert!(cycle.end_time().is_none());
        assert_eq!(backend.phases.running_count(&cycle_id).await, 1);
        assert!(backend
            .items
            .get(&item("T1"))
            .await
            .unwrap()
            .is_assigned_to(cycle_id));
    }
}
