//! Mapping from sqlx failures to port errors.

use std::fmt::Display;

use crate::domain::foundation::{DomainError, ErrorCode};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Classifies a sqlx error so retry policies can tell transient from permanent.
pub(crate) fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    let code = classify(&err);
    DomainError::new(code, format!("{}: {}", context, err)).with_detail("context", context)
}

fn classify(err: &sqlx::Error) -> ErrorCode {
    match err {
        sqlx::Error::PoolTimedOut => ErrorCode::Timeout,
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::Tls(_) => {
            ErrorCode::ConnectionFailed
        }
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION) | Some(CHECK_VIOLATION) => {
                ErrorCode::ConstraintViolation
            }
            _ => ErrorCode::DatabaseError,
        },
        _ => ErrorCode::DatabaseError,
    }
}

/// A stored value that no longer parses into its domain type.
pub(crate) fn corrupt(column: &str, err: impl Display) -> DomainError {
    DomainError::new(
        ErrorCode::InternalError,
        format!("Invalid value in column {}: {}", column, err),
    )
    .with_detail("column", column)
}
