//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the engine to external systems:
//! - `memory` - In-memory ports with failure injection, for tests
//! - `postgres` - sqlx-backed repositories, item gateway and audit sink
//! - `telemetry` - Tracing-backed duration recorder

pub mod memory;
pub mod postgres;
pub mod telemetry;

pub use memory::{FailureInjector, InMemoryBackend};
pub use postgres::{
    PostgresAuditSink, PostgresCycleRepository, PostgresItemGateway, PostgresPhaseRepository,
};
pub use telemetry::TracingDurationRecorder;
