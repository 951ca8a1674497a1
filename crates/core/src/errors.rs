//! Core error types for the quote pipeline.
//!
//! This module defines storage-agnostic error types. Backend-specific errors
//! (Diesel, Redis, ...) are converted to these types by the store crates.

use thiserror::Error;

use quotefeed_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    /// The cache cannot serve the request right now. Never fatal to a tick.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A durable write was rejected. Retried by the scheduler.
    #[error("Durable write failed: {0}")]
    DurableWrite(String),

    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert backend-specific errors into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Configuration problems. These are the only process-fatal errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No symbol set configured")]
    EmptySymbolSet,

    #[error("Poll interval must be greater than zero")]
    InvalidInterval,

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    #[error("Timeout '{0}' must be greater than zero")]
    InvalidTimeout(&'static str),

    #[error("Job id '{0}' is configured more than once")]
    DuplicateJob(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::CacheUnavailable("connection refused".to_string());
        assert_eq!(error.to_string(), "Cache unavailable: connection refused");

        let error: Error = ConfigError::EmptySymbolSet.into();
        assert_eq!(
            error.to_string(),
            "Invalid configuration: No symbol set configured"
        );

        let error: Error = DatabaseError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(
            error.to_string(),
            "Database operation failed: Database query failed: disk I/O error"
        );
    }

    #[test]
    fn test_market_data_error_converts() {
        let error: Error = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        }
        .into();
        assert!(matches!(error, Error::MarketData(_)));
    }
}
