//! Reprocessing Engine - Cycle lifecycle for instrument reprocessing
//!
//! This crate drives batches of items through the fixed reprocessing phases
//! (bath1, bath2, drying, autoclave, packaging). Every mutation spans several
//! tables and is applied as one compensating unit of work.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

pub use application::{CycleEngine, EnginePorts, OperationOutcome, RetryPolicy};
pub use domain::cycle::CycleError;
