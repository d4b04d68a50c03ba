//! Uniform `{success, message, data, error}` result shape for callers.

use serde::{Deserialize, Serialize};

use crate::domain::cycle::CycleError;

/// Error half of an [`OperationOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    /// One of `ValidationError`, `NotFoundError`, `ConflictError`, `TransactionError`.
    pub kind: String,
    pub message: String,
}

/// Serializable result of a cycle operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl<T> OperationOutcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn failed(err: &CycleError) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(OutcomeError {
                kind: err.kind().to_string(),
                message: err.to_string(),
            }),
        }
    }

    pub fn from_result(result: Result<T, CycleError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failed(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_error() {
        let outcome = OperationOutcome::from_result(Ok::<_, CycleError>(3)).with_message("done");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"success": true, "message": "done", "data": 3})
        );
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let outcome: OperationOutcome<()> =
            OperationOutcome::from_result(Err(CycleError::not_found("Cycle not found: x")));

        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, "NotFoundError");
        assert_eq!(error.message, "Not found: Cycle not found: x");
    }
}
