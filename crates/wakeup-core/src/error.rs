//! Core error types for wakeup-core.
//!
//! `CoreError` covers the scheduler and the stats accumulator. Config files
//! and the accelerometer report their own `ConfigError` and `SensorError`,
//! which callers handle next to the operation that raised them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for wakeup-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected before any state was touched
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Snooze requested after the per-alarm limit was reached
    #[error("Snooze limit exceeded: {snooze_count} of {max} snoozes already used")]
    SnoozeLimitExceeded { snooze_count: u32, max: u32 },

    /// Alarm missing or id mismatch
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation is not valid in the scheduler's current state
    #[error("Cannot {operation} while alarm is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// Persistence collaborator failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Alarm time is not `HH:MM`
    #[error("Invalid alarm time '{0}': expected HH:MM with HH in 0-23 and MM in 0-59")]
    InvalidTime(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    Query(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Stored record could not be encoded or decoded
    #[error("Record serialization failed: {0}")]
    Serialization(String),

    /// Backend refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path key does not exist
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Sensor-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// No accelerometer on this device
    #[error("Accelerometer is not available")]
    Unavailable,

    /// The sample stream could not be opened
    #[error("Failed to subscribe to accelerometer: {0}")]
    SubscriptionFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::Query(err.to_string())
                }
            }
            _ => StorageError::Query(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
