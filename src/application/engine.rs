//! CycleEngine - every cycle handler wired to one set of ports.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::ports::{AuditSink, CycleRepository, DurationRecorder, ItemStateGateway, PhaseRepository};

use super::handlers::{
    CompleteCycleHandler, CreateCycleHandler, GetCycleHandler, RollbackCycleHandler,
    TransitionPhaseHandler, TransitionRules,
};
use super::transaction::TransactionCoordinator;

/// Ports the engine is built from.
#[derive(Clone)]
pub struct EnginePorts {
    pub cycles: Arc<dyn CycleRepository>,
    pub phases: Arc<dyn PhaseRepository>,
    pub items: Arc<dyn ItemStateGateway>,
    pub audit: Arc<dyn AuditSink>,
    pub durations: Arc<dyn DurationRecorder>,
}

/// The lifecycle services sharing one coordinator.
pub struct CycleEngine {
    pub create: CreateCycleHandler,
    pub transition: TransitionPhaseHandler,
    pub complete: CompleteCycleHandler,
    pub rollback: RollbackCycleHandler,
    pub get: GetCycleHandler,
    coordinator: Arc<TransactionCoordinator>,
}

impl CycleEngine {
    pub fn new(ports: EnginePorts, config: &EngineConfig) -> Self {
        let coordinator = Arc::new(
            TransactionCoordinator::new(
                ports.cycles.clone(),
                ports.phases.clone(),
                ports.items.clone(),
                ports.audit.clone(),
            )
            .with_duration_recorder(ports.durations.clone()),
        );

        Self {
            create: CreateCycleHandler::new(ports.items.clone(), coordinator.clone()),
            transition: TransitionPhaseHandler::new(
                ports.cycles.clone(),
                ports.phases.clone(),
                ports.items.clone(),
                coordinator.clone(),
                TransitionRules::from_config(config),
            ),
            complete: CompleteCycleHandler::new(
                ports.cycles.clone(),
                ports.phases.clone(),
                ports.items.clone(),
                coordinator.clone(),
            ),
            rollback: RollbackCycleHandler::new(coordinator.clone()),
            get: GetCycleHandler::new(ports.cycles, ports.phases, ports.items),
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &Arc<TransactionCoordinator> {
        &self.coordinator
    }
}
