//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Early-exit priority must be positive, got {0}")]
    InvalidEarlyExitPriority(i32),

    #[error("Unknown log format '{0}', expected 'pretty' or 'json'")]
    InvalidLogFormat(String),

    #[error("Invalid log filter: {0}")]
    InvalidLogLevel(String),

    #[error("Retry max_attempts must be between 1 and 10")]
    InvalidRetryAttempts,

    #[error("Retry base delay exceeds max delay")]
    InvalidRetryDelay,
}
