//! DurationRecorder that reports unit-of-work timings as tracing events.

use std::time::Duration;

use tracing::{debug, warn};

use crate::ports::DurationRecorder;

/// Emits one event per unit of work; slow or failed units log at warn.
#[derive(Debug, Clone)]
pub struct TracingDurationRecorder {
    slow_threshold: Duration,
}

impl TracingDurationRecorder {
    pub fn new(slow_threshold: Duration) -> Self {
        Self { slow_threshold }
    }

    pub fn is_slow(&self, duration: Duration) -> bool {
        duration >= self.slow_threshold
    }
}

impl Default for TracingDurationRecorder {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl DurationRecorder for TracingDurationRecorder {
    fn record(&self, operation: &str, duration: Duration, succeeded: bool) {
        let duration_ms = duration.as_millis() as u64;
        if !succeeded || self.is_slow(duration) {
            warn!(
                target: "reprocessing::metrics",
                operation,
                duration_ms,
                succeeded,
                "Unit of work timing"
            );
        } else {
            debug!(
                target: "reprocessing::metrics",
                operation,
                duration_ms,
                succeeded,
                "Unit of work timing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_threshold_is_inclusive() {
        let recorder = TracingDurationRecorder::new(Duration::from_millis(100));
        assert!(!recorder.is_slow(Duration::from_millis(99)));
        assert!(recorder.is_slow(Duration::from_millis(100)));
    }

    #[test]
    fn record_does_not_require_subscriber() {
        let recorder = TracingDurationRecorder::default();
        recorder.record("create_cycle", Duration::from_millis(3), true);
        recorder.record("create_cycle", Duration::from_secs(2), false);
    }
}
