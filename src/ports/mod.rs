//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `CycleRepository` - Cycle header rows, scoped by facility
//! - `PhaseRepository` - The five phase rows of each cycle
//!
//! ## Collaborator Ports
//!
//! - `ItemStateGateway` - Inventory-owned item state
//! - `AuditSink` - Append-only audit trail
//! - `DurationRecorder` - Unit-of-work timings for an external metrics collector
//! - `FailureClassifier` - Caller-side retry classification

mod audit_sink;
mod cycle_repository;
mod duration_recorder;
mod failure_classifier;
mod item_state_gateway;
mod phase_repository;

pub use audit_sink::AuditSink;
pub use cycle_repository::CycleRepository;
pub use duration_recorder::{DurationRecorder, NoopDurationRecorder};
pub use failure_classifier::{ErrorCodeClassifier, FailureClassifier, Retryability};
pub use item_state_gateway::ItemStateGateway;
pub use phase_repository::PhaseRepository;
