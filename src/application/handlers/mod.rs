//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod cycle;

pub use cycle::{
    // Commands
    CompleteCycleCommand, CompleteCycleHandler, CreateCycleCommand, CreateCycleHandler,
    RollbackCycleCommand, RollbackCycleHandler, TransitionPhaseCommand, TransitionPhaseHandler,
    TransitionRules,
    // Queries
    GetCycleHandler, GetCycleQuery,
    // Results
    CompletionSummary, CycleSummary, CycleView, PhaseSummary, PhaseTransitionSummary,
    RollbackSummary,
};
