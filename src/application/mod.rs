//! Application layer - Commands, Queries, and Handlers.
//!
//! Handlers validate input, read current state through the ports, and submit
//! every mutation to the [`TransactionCoordinator`] as a single unit of work.

pub mod audit;
pub mod engine;
pub mod handlers;
pub mod outcome;
pub mod retry;
pub mod transaction;

pub use audit::AuditRecorder;
pub use engine::{CycleEngine, EnginePorts};
pub use handlers::*;
pub use outcome::{OperationOutcome, OutcomeError};
pub use retry::RetryPolicy;
pub use transaction::{
    CycleWrite, ItemWrite, PhaseWrite, Precondition, RollbackReceipt, TransactionCoordinator,
    UnitOfWork, UnitReceipt, ROLLBACK_OPERATION,
};
