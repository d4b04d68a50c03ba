//! PostgreSQL adapters - Database implementations for the cycle ports.
//!
//! - `PostgresCycleRepository` - `reprocessing_cycles`, facility scoped
//! - `PostgresPhaseRepository` - `reprocessing_phases`
//! - `PostgresItemGateway` - cycle columns of the inventory `items` table
//! - `PostgresAuditSink` - append-only `audit_logs`

mod audit_sink;
mod cycle_repository;
mod db_error;
mod item_gateway;
mod phase_repository;

pub use audit_sink::PostgresAuditSink;
pub use cycle_repository::PostgresCycleRepository;
pub use item_gateway::PostgresItemGateway;
pub use phase_repository::PostgresPhaseRepository;
