//! Telemetry adapters.

mod duration_recorder;

pub use duration_recorder::TracingDurationRecorder;
