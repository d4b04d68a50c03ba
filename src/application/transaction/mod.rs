//! Saga-style coordination of multi-row writes.

mod coordinator;
mod unit_of_work;

pub use coordinator::{RollbackReceipt, TransactionCoordinator, ROLLBACK_OPERATION};
pub use unit_of_work::{CycleWrite, ItemWrite, PhaseWrite, Precondition, UnitOfWork, UnitReceipt};
