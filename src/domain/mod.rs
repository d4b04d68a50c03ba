//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, metadata)
//! - `cycle` - Reprocessing cycles, phases, item assignments, audit entries

pub mod cycle;
pub mod foundation;
