//! Lifecycle rule configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Tunables for the cycle engine.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reject transitions that skip a phase.
    #[serde(default = "default_enforce_phase_order")]
    pub enforce_phase_order: bool,

    /// Priority tag of items that leave the cycle between bath2 and drying.
    #[serde(default = "default_early_exit_priority")]
    pub early_exit_priority: i32,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.early_exit_priority <= 0 {
            return Err(ValidationError::InvalidEarlyExitPriority(
                self.early_exit_priority,
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enforce_phase_order: default_enforce_phase_order(),
            early_exit_priority: default_early_exit_priority(),
        }
    }
}

fn default_enforce_phase_order() -> bool {
    true
}

fn default_early_exit_priority() -> i32 {
    2
}
