//! Cycle command and query handlers.

// Command handlers
mod complete_cycle;
mod create_cycle;
mod rollback_cycle;
mod transition_phase;

// Query handlers
mod get_cycle;

mod summary;

#[cfg(test)]
pub(crate) mod test_support;

pub use complete_cycle::{
    completion_message, CompleteCycleCommand, CompleteCycleHandler, CompletionSummary,
};
pub use create_cycle::{CreateCycleCommand, CreateCycleHandler};
pub use rollback_cycle::{RollbackCycleCommand, RollbackCycleHandler, RollbackSummary};
pub use transition_phase::{
    PhaseTransitionSummary, TransitionPhaseCommand, TransitionPhaseHandler, TransitionRules,
};

pub use get_cycle::{GetCycleHandler, GetCycleQuery};
pub use summary::{CycleSummary, CycleView, PhaseSummary};
