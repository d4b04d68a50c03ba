//! TransactionCoordinator - applies a unit of work as one logical write.
//!
//! The persistence ports only guarantee per-statement consistency, so the
//! coordinator runs each unit as a saga: every successful write pushes its
//! inverse onto a journal, and any failure replays the journal in reverse
//! before the error surfaces. Audit rows are appended last and are never
//! compensated.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::application::audit::AuditRecorder;
use crate::domain::cycle::{
    Cycle, CycleError, CycleStatus, ItemAssignment, ItemStatus, Phase, PhaseName, PhaseStatus,
    TransactionError, UnitStep,
};
use crate::domain::foundation::{
    CycleId, DomainError, ErrorCode, FacilityId, Identity, ItemId, Timestamp,
};
use crate::ports::{
    AuditSink, CycleRepository, DurationRecorder, ItemStateGateway, NoopDurationRecorder,
    PhaseRepository,
};

use super::unit_of_work::{
    CycleWrite, ItemWrite, PhaseWrite, Precondition, UnitOfWork, UnitReceipt,
};

/// Operation label used for the standalone rollback.
pub const ROLLBACK_OPERATION: &str = "rollback_cycle_creation";

/// Outcome of [`TransactionCoordinator::rollback_cycle_creation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReceipt {
    pub receipt: UnitReceipt,
    pub items_released: Vec<ItemId>,
}

/// Inverse of one applied write.
#[derive(Debug)]
enum Compensation {
    DeleteCycle {
        facility_id: FacilityId,
        cycle_id: CycleId,
    },
    RestoreCycle(Cycle),
    DeletePhases(CycleId),
    RestorePhase {
        phase: Phase,
        current: PhaseStatus,
    },
    RestoreItems(Vec<ItemAssignment>),
}

impl Compensation {
    fn describe(&self) -> String {
        match self {
            Compensation::DeleteCycle { cycle_id, .. } => format!("delete cycle {}", cycle_id),
            Compensation::RestoreCycle(cycle) => format!("restore cycle {}", cycle.id()),
            Compensation::DeletePhases(cycle_id) => {
                format!("delete phases of cycle {}", cycle_id)
            }
            Compensation::RestorePhase { phase, .. } => {
                format!("restore phase {} of cycle {}", phase.name(), phase.cycle_id())
            }
            Compensation::RestoreItems(items) => {
                let ids: Vec<&str> = items.iter().map(|i| i.item_id.as_str()).collect();
                format!("restore items [{}]", ids.join(", "))
            }
        }
    }
}

/// Applies units of work with compensating rollback.
pub struct TransactionCoordinator {
    cycles: Arc<dyn CycleRepository>,
    phases: Arc<dyn PhaseRepository>,
    items: Arc<dyn ItemStateGateway>,
    audit: Arc<dyn AuditSink>,
    durations: Arc<dyn DurationRecorder>,
}

impl TransactionCoordinator {
    pub fn new(
        cycles: Arc<dyn CycleRepository>,
        phases: Arc<dyn PhaseRepository>,
        items: Arc<dyn ItemStateGateway>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            cycles,
            phases,
            items,
            audit,
            durations: Arc::new(NoopDurationRecorder),
        }
    }

    /// Reports unit durations to the given recorder.
    pub fn with_duration_recorder(mut self, durations: Arc<dyn DurationRecorder>) -> Self {
        self.durations = durations;
        self
    }

    /// Runs a unit of work. Either every write persists, or every applied
    /// write has been undone when this returns an error.
    pub async fn run(&self, unit: UnitOfWork) -> Result<UnitReceipt, CycleError> {
        let operation = unit.operation;
        let cycle_id = unit.cycle_id();
        let started = Instant::now();

        let result = self.execute(&unit).await;
        let duration = started.elapsed();
        self.durations.record(operation, duration, result.is_ok());

        let writes = result?;
        debug!(
            operation,
            cycle_id = %cycle_id,
            writes,
            duration_ms = duration.as_millis() as u64,
            "Unit of work committed"
        );
        Ok(UnitReceipt {
            operation,
            cycle_id,
            writes,
            duration,
        })
    }

    /// Undoes a cycle that has not progressed past creation.
    ///
    /// The cycle must still be in `bath1` with bath1 running. Bath1 is marked
    /// failed, the cycle becomes `rolled_back`, and every assigned item is
    /// released.
    pub async fn rollback_cycle_creation(
        &self,
        cycle_id: CycleId,
        identity: &Identity,
    ) -> Result<RollbackReceipt, CycleError> {
        let facility_id = &identity.facility_id;
        let before = self
            .cycles
            .find_by_id(facility_id, &cycle_id)
            .await
            .map_err(|e| CycleError::from_port(ROLLBACK_OPERATION, e))?
            .ok_or_else(|| CycleError::not_found(format!("Cycle not found: {}", cycle_id)))?;

        if before.is_terminal() {
            return Err(CycleError::conflict(format!(
                "Cycle {} is already {}",
                cycle_id,
                before.status()
            )));
        }

        let phases = self
            .phases
            .find_by_cycle(&cycle_id)
            .await
            .map_err(|e| CycleError::from_port(ROLLBACK_OPERATION, e))?;
        let progressed = before.status() != CycleStatus::InPhase(PhaseName::Bath1)
            || phases.iter().any(|p| {
                p.name() != PhaseName::Bath1 && p.status() != PhaseStatus::Pending
            });
        if progressed {
            return Err(CycleError::conflict(format!(
                "Cycle {} has progressed past creation and cannot be rolled back",
                cycle_id
            )));
        }
        let bath1 = phases
            .into_iter()
            .find(|p| p.name() == PhaseName::Bath1 && p.is_running())
            .ok_or_else(|| {
                CycleError::not_found(format!("No running bath1 phase for cycle {}", cycle_id))
            })?;

        let assigned = self
            .items
            .list_by_cycle(&cycle_id)
            .await
            .map_err(|e| CycleError::from_port(ROLLBACK_OPERATION, e))?;

        let now = Timestamp::now();
        let mut after = before.clone();
        after.roll_back(now).map_err(|e| CycleError::conflict(e.message))?;
        let mut failed = bath1.clone();
        failed.fail(now).map_err(|e| CycleError::conflict(e.message))?;

        let entry = AuditRecorder::cycle_rolled_back(identity, &before, &after, &assigned, now);
        let items_released: Vec<ItemId> = assigned.iter().map(|i| i.item_id.clone()).collect();
        let mut unit = UnitOfWork::new(
            ROLLBACK_OPERATION,
            facility_id.clone(),
            CycleWrite::Update {
                before,
                after,
            },
        )
        .require(Precondition::RunningPhase {
            cycle_id,
            phase: PhaseName::Bath1,
            started_at: bath1.start_time(),
        })
        .phase(PhaseWrite::Update {
            before: bath1,
            after: failed,
        });
        if !assigned.is_empty() {
            unit = unit.item(ItemWrite::Release {
                before: assigned,
                status: ItemStatus::RELEASED,
            });
        }
        let receipt = self.run(unit.audit(entry)).await?;

        info!(
            cycle_id = %cycle_id,
            facility_id = %facility_id,
            items_released = items_released.len(),
            "Cycle creation rolled back"
        );
        Ok(RollbackReceipt {
            receipt,
            items_released,
        })
    }

    async fn execute(&self, unit: &UnitOfWork) -> Result<usize, CycleError> {
        let operation = unit.operation;
        if unit.audit.is_empty() {
            return Err(CycleError::Transaction(TransactionError::new(
                operation,
                UnitStep::AuditAppend,
                DomainError::new(ErrorCode::InternalError, "Unit of work has no audit entry"),
            )));
        }

        if let Some(precondition) = &unit.precondition {
            self.check(operation, precondition).await?;
        }

        let mut journal = Vec::new();
        match self.apply(unit, &mut journal).await {
            Ok(()) => Ok(journal.len() + unit.audit.len()),
            Err((step, cause)) => {
                warn!(
                    operation,
                    cycle_id = %unit.cycle_id(),
                    step = %step,
                    error = %cause,
                    compensations = journal.len(),
                    "Unit of work failed, compensating"
                );
                let failures = self.compensate(operation, journal).await;
                let err = TransactionError::new(operation, step, cause)
                    .with_compensation_failures(failures);
                if err.is_fully_compensated() {
                    Err(CycleError::from_cause(err))
                } else {
                    // Partial state is left behind; never downgrade to a business error.
                    Err(CycleError::Transaction(err))
                }
            }
        }
    }

    async fn check(&self, operation: &str, precondition: &Precondition) -> Result<(), CycleError> {
        match precondition {
            Precondition::RunningPhase {
                cycle_id,
                phase,
                started_at,
            } => {
                let running = self
                    .phases
                    .find_running(cycle_id)
                    .await
                    .map_err(|e| {
                        CycleError::from_cause(TransactionError::new(
                            operation,
                            UnitStep::Precondition,
                            e,
                        ))
                    })?;
                match running {
                    Some(p) if p.name() == *phase && p.start_time() == *started_at => Ok(()),
                    other => {
                        let found = other
                            .map(|p| p.name().to_string())
                            .unwrap_or_else(|| "none".to_string());
                        warn!(
                            operation,
                            cycle_id = %cycle_id,
                            expected = %phase,
                            found = %found,
                            "Running phase changed before write"
                        );
                        Err(CycleError::from_cause(TransactionError::new(
                            operation,
                            UnitStep::Precondition,
                            DomainError::new(
                                ErrorCode::ConcurrentModification,
                                format!(
                                    "Cycle {} was modified concurrently: expected running phase {}, found {}",
                                    cycle_id, phase, found
                                ),
                            ),
                        )))
                    }
                }
            }
        }
    }

    async fn apply(
        &self,
        unit: &UnitOfWork,
        journal: &mut Vec<Compensation>,
    ) -> Result<(), (UnitStep, DomainError)> {
        // 1. Cycle row
        match &unit.cycle {
            CycleWrite::Insert(cycle) => {
                self.cycles
                    .insert(cycle)
                    .await
                    .map_err(|e| (UnitStep::CycleWrite, e))?;
                journal.push(Compensation::DeleteCycle {
                    facility_id: unit.facility_id.clone(),
                    cycle_id: cycle.id(),
                });
            }
            CycleWrite::Update { before, after } => {
                self.cycles
                    .update(after)
                    .await
                    .map_err(|e| (UnitStep::CycleWrite, e))?;
                journal.push(Compensation::RestoreCycle(before.clone()));
            }
        }

        // 2. Phase rows
        for write in &unit.phases {
            match write {
                PhaseWrite::InsertAll(phases) => {
                    let Some(first) = phases.first() else {
                        continue;
                    };
                    self.phases
                        .insert_all(phases)
                        .await
                        .map_err(|e| (UnitStep::PhaseWrite, e))?;
                    journal.push(Compensation::DeletePhases(first.cycle_id()));
                }
                PhaseWrite::Update { before, after } => {
                    self.phases
                        .update(after, before.status())
                        .await
                        .map_err(|e| (UnitStep::PhaseWrite, e))?;
                    journal.push(Compensation::RestorePhase {
                        phase: before.clone(),
                        current: after.status(),
                    });
                }
            }
        }

        // 3. Item state
        for write in &unit.items {
            match write {
                ItemWrite::Assign {
                    before,
                    cycle_id,
                    phase,
                    status,
                } => {
                    self.items
                        .assign_to_cycle(&before.item_id, cycle_id, *phase, *status)
                        .await
                        .map_err(|e| (UnitStep::ItemWrite, e))?;
                    journal.push(Compensation::RestoreItems(vec![before.clone()]));
                }
                ItemWrite::SetPhase { before, phase } => {
                    self.items
                        .set_phase(&before.item_id, *phase)
                        .await
                        .map_err(|e| (UnitStep::ItemWrite, e))?;
                    journal.push(Compensation::RestoreItems(vec![before.clone()]));
                }
                ItemWrite::Release { before, status } => {
                    let ids: Vec<ItemId> = before.iter().map(|i| i.item_id.clone()).collect();
                    self.items
                        .clear_cycle_assignment(&ids, *status)
                        .await
                        .map_err(|e| (UnitStep::ItemWrite, e))?;
                    journal.push(Compensation::RestoreItems(before.clone()));
                }
            }
        }

        // 4. Audit trail
        for entry in &unit.audit {
            self.audit
                .append(entry)
                .await
                .map_err(|e| (UnitStep::AuditAppend, e))?;
        }

        Ok(())
    }

    /// Replays the journal newest first. Returns a description of every
    /// compensation that failed.
    async fn compensate(&self, operation: &str, journal: Vec<Compensation>) -> Vec<String> {
        let mut failures = Vec::new();
        for compensation in journal.into_iter().rev() {
            if let Err(e) = self.undo(&compensation).await {
                let action = compensation.describe();
                error!(operation, action = %action, error = %e, "Compensation failed");
                failures.push(format!("{}: {}", action, e));
            }
        }
        failures
    }

    async fn undo(&self, compensation: &Compensation) -> Result<(), DomainError> {
        match compensation {
            Compensation::DeleteCycle {
                facility_id,
                cycle_id,
            } => self.cycles.delete(facility_id, cycle_id).await,
            Compensation::RestoreCycle(cycle) => self.cycles.update(cycle).await,
            Compensation::DeletePhases(cycle_id) => {
                self.phases.delete_by_cycle(cycle_id).await.map(|_| ())
            }
            Compensation::RestorePhase { phase, current } => {
                self.phases.update(phase, *current).await
            }
            Compensation::RestoreItems(items) => {
                // Keep going so one stuck row does not strand the rest.
                let mut first_err = None;
                for item in items {
                    if let Err(e) = self.items.restore(item).await {
                        first_err.get_or_insert(e);
                    }
                }
                first_err.map_or(Ok(()), Err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{ops, InMemoryBackend};
    use crate::domain::cycle::{AuditAction, AuditEntry, Priority};
    use crate::domain::foundation::UserId;
    use crate::ports::{ErrorCodeClassifier, FailureClassifier};
    use std::sync::Mutex;
    use std::time::Duration;

    // ─────────────────────────────────────────────────────────────────────
    // Test fixtures
    // ─────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingDurations {
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl DurationRecorder for RecordingDurations {
        fn record(&self, operation: &str, _duration: Duration, succeeded: bool) {
            self.calls
                .lock()
                .unwrap()
                .push((operation.to_string(), succeeded));
        }
    }

    fn identity() -> Identity {
        Identity {
            actor_id: UserId::new("tech-1").unwrap(),
            facility_id: FacilityId::new("facility-1").unwrap(),
        }
    }

    fn item(id: &str) -> ItemId {
        ItemId::new(id).unwrap()
    }

    async fn backend_with_items(ids: &[&str]) -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        for id in ids {
            backend
                .items
                .seed(ItemAssignment::available(item(id), Priority::default()))
                .await;
        }
        backend
    }

    fn coordinator(backend: &InMemoryBackend) -> TransactionCoordinator {
        TransactionCoordinator::new(
            backend.cycles.clone(),
            backend.phases.clone(),
            backend.items.clone(),
            backend.audit.clone(),
        )
    }

    fn creation_unit(backend_items: &[ItemAssignment]) -> UnitOfWork {
        let id = identity();
        let now = Timestamp::now();
        let cycle = Cycle::new(
            id.facility_id.clone(),
            "routine",
            None,
            id.actor_id.clone(),
            now,
        )
        .unwrap();
        let cycle_id = cycle.id();
        let entry = AuditEntry::for_cycle(
            id.actor_id.clone(),
            id.facility_id.clone(),
            AuditAction::CycleCreated,
            cycle_id,
            now,
        );
        UnitOfWork::new("create_cycle", id.facility_id, CycleWrite::Insert(cycle))
            .phase(PhaseWrite::InsertAll(Phase::initial_set(cycle_id, now)))
            .items(backend_items.iter().map(|before| ItemWrite::Assign {
                before: before.clone(),
                cycle_id,
                phase: PhaseName::Bath1,
                status: ItemStatus::IN_CYCLE,
            }))
            .audit(entry)
    }

    async fn create(backend: &InMemoryBackend, ids: &[&str]) -> CycleId {
        let items = backend.items.all().await;
        let selected: Vec<ItemAssignment> = items
            .into_iter()
            .filter(|i| ids.contains(&i.item_id.as_str()))
            .collect();
        coordinator(backend)
            .run(creation_unit(&selected))
            .await
            .unwrap()
            .cycle_id
    }

    // ─────────────────────────────────────────────────────────────────────
    // run
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn run_applies_every_write() {
        let backend = backend_with_items(&["T1", "T2"]).await;
        let items = backend.items.all().await;

        let receipt = coordinator(&backend)
            .run(creation_unit(&items))
            .await
            .unwrap();

        assert_eq!(receipt.operation, "create_cycle");
        // cycle + phase batch + two assignments + one audit row
        assert_eq!(receipt.writes, 5);
        assert_eq!(backend.cycles.count().await, 1);
        assert_eq!(backend.phases.count().await, 5);
        assert_eq!(backend.phases.running_count(&receipt.cycle_id).await, 1);
        for assignment in backend.items.all().await {
            assert!(assignment.is_assigned_to(receipt.cycle_id));
            assert_eq!(assignment.current_phase, Some(PhaseName::Bath1));
            assert_eq!(assignment.status, ItemStatus::Dirty);
        }
        assert_eq!(backend.audit.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_item_write_compensates_everything() {
        let backend = backend_with_items(&["T1", "T2"]).await;
        backend
            .failures
            .fail_after(ops::ITEM_ASSIGN, 1, ErrorCode::ConnectionFailed)
            .await;
        let items = backend.items.all().await;
        let snapshot = items.clone();

        let err = coordinator(&backend)
            .run(creation_unit(&items))
            .await
            .unwrap_err();

        let tx = err.as_transaction().expect("transaction error");
        assert_eq!(tx.step, UnitStep::ItemWrite);
        assert!(tx.is_fully_compensated());
        assert_eq!(backend.cycles.count().await, 0);
        assert_eq!(backend.phases.count().await, 0);
        assert_eq!(backend.items.all().await, snapshot);
        assert!(backend.audit.entries().await.is_empty());
    }

    #[tokio::test]
    async fn failed_audit_append_compensates_state_writes() {
        let backend = backend_with_items(&["T1"]).await;
        backend
            .failures
            .fail_once(ops::AUDIT_APPEND, ErrorCode::Timeout)
            .await;
        let items = backend.items.all().await;

        let err = coordinator(&backend)
            .run(creation_unit(&items))
            .await
            .unwrap_err();

        assert_eq!(err.as_transaction().unwrap().step, UnitStep::AuditAppend);
        assert_eq!(backend.cycles.count().await, 0);
        assert!(!backend.items.get(&item("T1")).await.unwrap().is_assigned());
    }

    #[tokio::test]
    async fn already_assigned_item_surfaces_as_conflict() {
        let backend = backend_with_items(&["T1", "T2"]).await;
        let stale = backend.items.all().await;
        create(&backend, &["T2"]).await;

        let err = coordinator(&backend)
            .run(creation_unit(&stale))
            .await
            .unwrap_err();

        assert!(matches!(err, CycleError::Conflict(_)));
        assert_eq!(backend.cycles.count().await, 1);
        assert!(!backend.items.get(&item("T1")).await.unwrap().is_assigned());
    }

    #[tokio::test]
    async fn lost_assignment_race_with_failed_restore_stays_transaction_error() {
        let backend = backend_with_items(&["T1", "T2"]).await;
        let stale = backend.items.all().await;
        create(&backend, &["T2"]).await;
        backend
            .failures
            .fail_once(ops::ITEM_RESTORE, ErrorCode::ConnectionFailed)
            .await;

        let err = coordinator(&backend)
            .run(creation_unit(&stale))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "TransactionError");
        let tx = err.as_transaction().expect("transaction error");
        assert_eq!(tx.cause.code, ErrorCode::ItemAlreadyAssigned);
        assert_eq!(tx.compensation_failures.len(), 1);
        assert!(tx.compensation_failures[0].starts_with("restore items [T1]"));
        assert!(!ErrorCodeClassifier.classify_error(&err).is_retryable());
        // T1 could not be restored and is reported, not hidden.
        assert!(backend.items.get(&item("T1")).await.unwrap().is_assigned());
        assert_eq!(backend.cycles.count().await, 1);
    }

    #[tokio::test]
    async fn compensation_failures_are_attached() {
        let backend = backend_with_items(&["T1"]).await;
        backend
            .failures
            .fail_once(ops::AUDIT_APPEND, ErrorCode::DatabaseError)
            .await;
        backend
            .failures
            .fail_once(ops::ITEM_RESTORE, ErrorCode::ConnectionFailed)
            .await;
        let items = backend.items.all().await;

        let err = coordinator(&backend)
            .run(creation_unit(&items))
            .await
            .unwrap_err();

        let tx = err.as_transaction().unwrap();
        assert_eq!(tx.compensation_failures.len(), 1);
        assert!(tx.compensation_failures[0].starts_with("restore items [T1]"));
        // Remaining compensations still ran.
        assert_eq!(backend.cycles.count().await, 0);
    }

    #[tokio::test]
    async fn unit_without_audit_entry_is_rejected_before_writing() {
        let backend = backend_with_items(&[]).await;
        let id = identity();
        let cycle = Cycle::new(
            id.facility_id.clone(),
            "routine",
            None,
            id.actor_id,
            Timestamp::now(),
        )
        .unwrap();

        let err = coordinator(&backend)
            .run(UnitOfWork::new("create_cycle", id.facility_id, CycleWrite::Insert(cycle)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "TransactionError");
        assert_eq!(backend.cycles.count().await, 0);
    }

    #[tokio::test]
    async fn stale_running_phase_is_conflict_and_writes_nothing() {
        let backend = backend_with_items(&["T1"]).await;
        let cycle_id = create(&backend, &["T1"]).await;
        let id = identity();
        let before = backend.cycles.get(&cycle_id).await.unwrap();
        let mut after = before.clone();
        after.advance_to(PhaseName::Drying, Timestamp::now()).unwrap();
        let entry = AuditEntry::for_cycle(
            id.actor_id,
            id.facility_id.clone(),
            AuditAction::PhaseTransition,
            cycle_id,
            Timestamp::now(),
        );

        let err = coordinator(&backend)
            .run(
                UnitOfWork::new(
                    "transition_phase",
                    id.facility_id,
                    CycleWrite::Update { before: before.clone(), after },
                )
                .require(Precondition::RunningPhase {
                    cycle_id,
                    phase: PhaseName::Bath2,
                    started_at: None,
                })
                .audit(entry),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CycleError::Conflict(_)));
        assert_eq!(backend.cycles.get(&cycle_id).await.unwrap(), before);
        assert_eq!(backend.audit.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn stale_phase_row_is_conflict_and_cycle_is_restored() {
        let backend = backend_with_items(&["T1"]).await;
        let cycle_id = create(&backend, &["T1"]).await;
        let id = identity();
        let now = Timestamp::now();
        let before = backend.cycles.get(&cycle_id).await.unwrap();
        let stale_bath2 = backend
            .phases
            .find(&cycle_id, PhaseName::Bath2)
            .await
            .unwrap()
            .unwrap();
        // Another writer starts bath2 after our read.
        let mut theirs = stale_bath2.clone();
        theirs.start(now, None).unwrap();
        backend
            .phases
            .update(&theirs, PhaseStatus::Pending)
            .await
            .unwrap();

        let mut after = before.clone();
        after.advance_to(PhaseName::Bath2, now).unwrap();
        let mut ours = stale_bath2.clone();
        ours.start(now, None).unwrap();
        let entry = AuditEntry::for_cycle(
            id.actor_id,
            id.facility_id.clone(),
            AuditAction::PhaseTransition,
            cycle_id,
            now,
        );

        let err = coordinator(&backend)
            .run(
                UnitOfWork::new(
                    "transition_phase",
                    id.facility_id,
                    CycleWrite::Update {
                        before: before.clone(),
                        after,
                    },
                )
                .phase(PhaseWrite::Update {
                    before: stale_bath2,
                    after: ours,
                })
                .audit(entry),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CycleError::Conflict(_)));
        assert_eq!(backend.cycles.get(&cycle_id).await.unwrap(), before);
        assert_eq!(
            backend.audit.count_action(AuditAction::PhaseTransition).await,
            0
        );
    }

    #[tokio::test]
    async fn durations_are_reported_for_success_and_failure() {
        let backend = backend_with_items(&["T1"]).await;
        let durations = Arc::new(RecordingDurations::default());
        let coordinator = coordinator(&backend).with_duration_recorder(durations.clone());
        let items = backend.items.all().await;

        coordinator.run(creation_unit(&items)).await.unwrap();
        assert!(coordinator.run(creation_unit(&items)).await.is_err());

        let calls = durations.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("create_cycle".to_string(), true),
                ("create_cycle".to_string(), false)
            ]
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // rollback_cycle_creation
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn rollback_releases_items_and_marks_cycle() {
        let backend = backend_with_items(&["T1", "T2"]).await;
        let cycle_id = create(&backend, &["T1", "T2"]).await;

        let rollback = coordinator(&backend)
            .rollback_cycle_creation(cycle_id, &identity())
            .await
            .unwrap();

        assert_eq!(rollback.items_released, vec![item("T1"), item("T2")]);
        assert_eq!(rollback.receipt.operation, ROLLBACK_OPERATION);
        let cycle = backend.cycles.get(&cycle_id).await.unwrap();
        assert_eq!(cycle.status(), CycleStatus::RolledBack);
        assert!(cycle.end_time().is_some());
        assert_eq!(backend.phases.running_count(&cycle_id).await, 0);
        for assignment in backend.items.all().await {
            assert!(!assignment.is_assigned());
            assert_eq!(assignment.status, ItemStatus::Available);
        }
        assert_eq!(
            backend.audit.count_action(AuditAction::CycleRolledBack).await,
            1
        );
    }

    #[tokio::test]
    async fn rollback_of_terminal_cycle_is_conflict() {
        let backend = backend_with_items(&["T1"]).await;
        let cycle_id = create(&backend, &["T1"]).await;
        let coordinator = coordinator(&backend);
        coordinator
            .rollback_cycle_creation(cycle_id, &identity())
            .await
            .unwrap();

        let err = coordinator
            .rollback_cycle_creation(cycle_id, &identity())
            .await
            .unwrap_err();
        assert!(matches!(err, CycleError::Conflict(_)));
    }

    #[tokio::test]
    async fn rollback_of_unknown_cycle_is_not_found() {
        let backend = backend_with_items(&[]).await;
        let err = coordinator(&backend)
            .rollback_cycle_creation(CycleId::new(), &identity())
            .await
            .unwrap_err();
        assert!(matches!(err, CycleError::NotFound(_)));
    }

    #[tokio::test]
    async fn rollback_in_other_facility_is_not_found() {
        let backend = backend_with_items(&["T1"]).await;
        let cycle_id = create(&backend, &["T1"]).await;
        let other = Identity {
            actor_id: UserId::new("tech-1").unwrap(),
            facility_id: FacilityId::new("facility-2").unwrap(),
        };

        let err = coordinator(&backend)
            .rollback_cycle_creation(cycle_id, &other)
            .await
            .unwrap_err();
        assert!(matches!(err, CycleError::NotFound(_)));
    }
}
