//! DurationRecorder port - hands unit-of-work timings to a metrics collector.

use std::time::Duration;

/// Receives the measured duration of every unit of work.
///
/// Called synchronously after the unit finishes; implementations must not
/// block.
pub trait DurationRecorder: Send + Sync {
    fn record(&self, operation: &str, duration: Duration, succeeded: bool);
}

/// Recorder that discards every measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDurationRecorder;

impl DurationRecorder for NoopDurationRecorder {
    fn record(&self, _operation: &str, _duration: Duration, _succeeded: bool) {}
}
