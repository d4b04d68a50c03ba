//! TransitionPhaseHandler - Command handler for advancing a cycle.
//!
//! Completes the running phase, starts the target phase, moves every assigned
//! item along, and applies the early-exit rule when leaving bath2 for drying.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::application::audit::AuditRecorder;
use crate::application::transaction::{
    CycleWrite, ItemWrite, PhaseWrite, Precondition, TransactionCoordinator, UnitOfWork,
};
use crate::config::EngineConfig;
use crate::domain::cycle::{
    CycleError, ItemAssignment, ItemStatus, PhaseName, PhaseStatus, Priority,
};
use crate::domain::foundation::{CommandMetadata, CycleId, ItemId, Timestamp};
use crate::ports::{CycleRepository, ItemStateGateway, PhaseRepository};

use super::summary::PhaseSummary;

const OPERATION: &str = "transition_phase";

/// Business rules applied on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRules {
    /// Only the immediate successor of the running phase may be targeted.
    pub enforce_phase_order: bool,
    /// Items with this priority leave the cycle on bath2 -> drying.
    pub early_exit_priority: Priority,
}

impl TransitionRules {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            enforce_phase_order: config.enforce_phase_order,
            early_exit_priority: Priority::new(config.early_exit_priority),
        }
    }

    /// Returns true if leaving `from` for `to` triggers early exit.
    pub fn is_early_exit_point(from: PhaseName, to: PhaseName) -> bool {
        from == PhaseName::Bath2 && to == PhaseName::Drying
    }
}

impl Default for TransitionRules {
    fn default() -> Self {
        Self {
            enforce_phase_order: true,
            early_exit_priority: Priority::EARLY_EXIT,
        }
    }
}

/// Command to move a cycle to another phase.
#[derive(Debug, Clone)]
pub struct TransitionPhaseCommand {
    pub cycle_id: CycleId,
    /// Target phase name; parsed by the handler.
    pub target_phase: String,
    /// Readings to merge into the completed phase and seed the new one.
    pub phase_data: Option<Value>,
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTransitionSummary {
    pub cycle_id: CycleId,
    pub completed: PhaseSummary,
    pub started: PhaseSummary,
    pub items_advanced: usize,
    pub items_removed: Vec<ItemId>,
}

/// Handler for phase transitions.
pub struct TransitionPhaseHandler {
    cycles: Arc<dyn CycleRepository>,
    phases: Arc<dyn PhaseRepository>,
    items: Arc<dyn ItemStateGateway>,
    coordinator: Arc<TransactionCoordinator>,
    rules: TransitionRules,
}

impl TransitionPhaseHandler {
    pub fn new(
        cycles: Arc<dyn CycleRepository>,
        phases: Arc<dyn PhaseRepository>,
        items: Arc<dyn ItemStateGateway>,
        coordinator: Arc<TransactionCoordinator>,
        rules: TransitionRules,
    ) -> Self {
        Self {
            cycles,
            phases,
            items,
            coordinator,
            rules,
        }
    }

    pub async fn handle(
        &self,
        cmd: TransitionPhaseCommand,
        metadata: CommandMetadata,
    ) -> Result<PhaseTransitionSummary, CycleError> {
        let identity = metadata.identity()?;
        let target_name: PhaseName = cmd.target_phase.parse()?;
        let cycle_id = cmd.cycle_id;
        let port_err = |e| CycleError::from_port(OPERATION, e);

        // 1. Load and check the cycle
        let before = self
            .cycles
            .find_by_id(&identity.facility_id, &cycle_id)
            .await
            .map_err(port_err)?
            .ok_or_else(|| CycleError::not_found(format!("Cycle not found: {}", cycle_id)))?;
        // A terminal cycle has no running phase to leave.
        if before.is_terminal() {
            return Err(CycleError::not_found(format!(
                "No running phase for cycle {} ({})",
                cycle_id,
                before.status()
            )));
        }

        // 2. Resolve source and target phases
        let source = self
            .phases
            .find_running(&cycle_id)
            .await
            .map_err(port_err)?
            .ok_or_else(|| {
                CycleError::not_found(format!("No running phase for cycle {}", cycle_id))
            })?;
        let source_name = source.name();
        if source_name == target_name {
            return Err(CycleError::conflict(format!(
                "Phase {} is already running",
                target_name
            )));
        }
        let target = self
            .phases
            .find(&cycle_id, target_name)
            .await
            .map_err(port_err)?
            .ok_or_else(|| {
                CycleError::not_found(format!(
                    "Phase {} not found for cycle {}",
                    target_name, cycle_id
                ))
            })?;
        if target.status() != PhaseStatus::Pending {
            return Err(CycleError::conflict(format!(
                "Phase {} is {}, expected pending",
                target_name,
                target.status().as_str()
            )));
        }
        if self.rules.enforce_phase_order && !source_name.is_followed_by(target_name) {
            warn!(
                cycle_id = %cycle_id,
                from = %source_name,
                to = %target_name,
                "Out-of-order transition rejected"
            );
            return Err(CycleError::conflict(format!(
                "Cannot move from {} to {}: next phase is {}",
                source_name,
                target_name,
                source_name
                    .next()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "none".to_string())
            )));
        }

        // 3. Split items into advancing and leaving
        let assigned = self.items.list_by_cycle(&cycle_id).await.map_err(port_err)?;
        let (leaving, staying): (Vec<ItemAssignment>, Vec<ItemAssignment>) =
            if TransitionRules::is_early_exit_point(source_name, target_name) {
                assigned
                    .into_iter()
                    .partition(|i| i.priority == self.rules.early_exit_priority)
            } else {
                (Vec::new(), assigned)
            };
        let items_removed: Vec<ItemId> = leaving.iter().map(|i| i.item_id.clone()).collect();

        // 4. Build the new rows
        let now = Timestamp::now();
        let mut completed = source.clone();
        completed
            .complete(now, cmd.phase_data.as_ref())
            .map_err(|e| CycleError::conflict(e.message))?;
        let mut started = target.clone();
        started
            .start(now, cmd.phase_data.as_ref())
            .map_err(|e| CycleError::conflict(e.message))?;
        let mut after = before.clone();
        after
            .advance_to(target_name, now)
            .map_err(|e| CycleError::conflict(e.message))?;

        let entry = AuditRecorder::phase_transition(
            &identity,
            &before,
            &after,
            source_name,
            target_name,
            &items_removed,
            now,
        );
        let items_advanced = staying.len();
        let mut unit = UnitOfWork::new(
            OPERATION,
            identity.facility_id.clone(),
            CycleWrite::Update { before, after },
        )
        .require(Precondition::RunningPhase {
            cycle_id,
            phase: source_name,
            started_at: source.start_time(),
        })
        .phase(PhaseWrite::Update {
            before: source,
            after: completed.clone(),
        })
        .phase(PhaseWrite::Update {
            before: target,
            after: started.clone(),
        })
        .items(staying.into_iter().map(|before| ItemWrite::SetPhase {
            before,
            phase: target_name,
        }));
        if !leaving.is_empty() {
            unit = unit.item(ItemWrite::Release {
                before: leaving,
                status: ItemStatus::RELEASED,
            });
        }

        // 5. Apply
        self.coordinator.run(unit.audit(entry)).await?;

        info!(
            cycle_id = %cycle_id,
            from = %source_name,
            to = %target_name,
            items_advanced,
            items_removed = items_removed.len(),
            "Phase transition applied"
        );
        Ok(PhaseTransitionSummary {
            cycle_id,
            completed: PhaseSummary::from(&completed),
            started: PhaseSummary::from(&started),
            items_advanced,
            items_removed,
        })
    }
}
