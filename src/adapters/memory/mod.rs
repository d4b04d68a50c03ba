//! In-memory adapters for every persistence and collaborator port.
//!
//! Deterministic and fast; used by unit and integration tests and for local
//! experimentation. Each adapter can share a [`FailureInjector`] so a test can
//! fail any single port call.

mod audit_sink;
mod cycle_repository;
mod failure;
mod item_gateway;
mod phase_repository;

pub use audit_sink::InMemoryAuditSink;
pub use cycle_repository::InMemoryCycleRepository;
pub use failure::{ops, FailureInjector};
pub use item_gateway::InMemoryItemStateGateway;
pub use phase_repository::InMemoryPhaseRepository;

use std::sync::Arc;

/// All in-memory adapters wired to one failure injector.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    pub cycles: Arc<InMemoryCycleRepository>,
    pub phases: Arc<InMemoryPhaseRepository>,
    pub items: Arc<InMemoryItemStateGateway>,
    pub audit: Arc<InMemoryAuditSink>,
    pub failures: Arc<FailureInjector>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let failures = Arc::new(FailureInjector::new());
        Self {
            cycles: Arc::new(InMemoryCycleRepository::with_failures(failures.clone())),
            phases: Arc::new(InMemoryPhaseRepository::with_failures(failures.clone())),
            items: Arc::new(InMemoryItemStateGateway::with_failures(failures.clone())),
            audit: Arc::new(InMemoryAuditSink::with_failures(failures.clone())),
            failures,
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
