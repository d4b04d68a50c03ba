//! Shared fixtures for handler tests.

use std::sync::Arc;

use crate::adapters::memory::InMemoryBackend;
use crate::application::transaction::TransactionCoordinator;
use crate::domain::cycle::{ItemAssignment, Priority};
use crate::domain::foundation::{CommandMetadata, CycleId, ItemId};

use super::{
    CompleteCycleHandler, CreateCycleCommand, CreateCycleHandler, RollbackCycleHandler,
    TransitionPhaseHandler, TransitionRules,
};

pub fn metadata() -> CommandMetadata {
    CommandMetadata::new("tech-1", "facility-1")
}

pub fn item(id: &str) -> ItemId {
    ItemId::new(id).unwrap()
}

/// Backend seeded with available items given as `(id, priority)`.
pub async fn backend_with(items: &[(&str, i32)]) -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    for (id, priority) in items {
        backend
            .items
            .seed(ItemAssignment::available(item(id), Priority::new(*priority)))
            .await;
    }
    backend
}

pub fn coordinator(backend: &InMemoryBackend) -> Arc<TransactionCoordinator> {
    Arc::new(TransactionCoordinator::new(
        backend.cycles.clone(),
        backend.phases.clone(),
        backend.items.clone(),
        backend.audit.clone(),
    ))
}

pub fn create_handler(backend: &InMemoryBackend) -> CreateCycleHandler {
    CreateCycleHandler::new(backend.items.clone(), coordinator(backend))
}

pub fn transition_handler(backend: &InMemoryBackend) -> TransitionPhaseHandler {
    transition_handler_with(backend, TransitionRules::default())
}

pub fn transition_handler_with(
    backend: &InMemoryBackend,
    rules: TransitionRules,
) -> TransitionPhaseHandler {
    TransitionPhaseHandler::new(
        backend.cycles.clone(),
        backend.phases.clone(),
        backend.items.clone(),
        coordinator(backend),
        rules,
    )
}

pub fn complete_handler(backend: &InMemoryBackend) -> CompleteCycleHandler {
    CompleteCycleHandler::new(
        backend.cycles.clone(),
        backend.phases.clone(),
        backend.items.clone(),
        coordinator(backend),
    )
}

pub fn rollback_handler(backend: &InMemoryBackend) -> RollbackCycleHandler {
    RollbackCycleHandler::new(coordinator(backend))
}

/// Creates a routine cycle over the given items.
pub async fn create(backend: &InMemoryBackend, ids: &[&str]) -> CycleId {
    create_handler(backend)
        .handle(
            CreateCycleCommand {
                item_ids: ids.iter().map(|s| s.to_string()).collect(),
                cycle_type: "routine".to_string(),
                notes: None,
            },
            metadata(),
        )
        .await
        .unwrap()
        .cycle_id
}
