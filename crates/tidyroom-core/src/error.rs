//! Core error types for tidyroom-core.
//!
//! This module defines the error hierarchy using thiserror. The split
//! follows the propagation policy: user-input errors are detected before
//! any mutation, advisory service failures degrade to fallbacks and are
//! surfaced as warnings alongside success, required service failures and
//! storage failures abort the operation.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tidyroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session gating and lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Points ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Verification judging errors
    #[error("Judge error: {0}")]
    Judge(#[from] JudgeError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Gating and lifecycle errors. All of these are detected before any
/// mutation, so a failed operation leaves no trace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The day's session quota has been met ("kitchen closed")
    #[error("Kitchen closed: {completed_today} of {daily_target} sessions already completed today")]
    KitchenClosed {
        completed_today: usize,
        daily_target: u32,
    },

    /// An in-progress session already exists for the area
    #[error("Session already active for area '{area_id}'")]
    SessionAlreadyActive { area_id: String },

    /// The operation requires a photo that was not supplied
    #[error("Photo required to start or extend a session")]
    PhotoRequired,

    /// Golden tier requested while the eligibility rule is not met
    #[error("Golden tier not eligible")]
    GoldenNotEligible,

    /// No area with the given id
    #[error("Unknown area: {0}")]
    AreaNotFound(String),

    /// No session with the given id in the area
    #[error("Unknown session: {0}")]
    SessionNotFound(String),

    /// No task with the given id in the session
    #[error("Unknown task: {0}")]
    TaskNotFound(String),
}

/// Points ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Spend exceeds the available balance. No partial spends.
    #[error("Insufficient points: cost {cost}, available {available}")]
    InsufficientPoints { cost: i64, available: i64 },
}

/// Verification judging errors. These are required-call failures: the
/// session is left untouched when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JudgeError {
    /// The external judge could not produce a verdict
    #[error("Judging failed: {0}")]
    JudgingFailed(String),

    /// A required photo is missing or unreadable
    #[error("Invalid photo data")]
    InvalidPhotoData,
}

/// Advisory task/image generation failures. These never abort a session
/// start; the caller falls back and records a warning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The generation service is not reachable or not configured
    #[error("Task generation unavailable: {0}")]
    Unavailable(String),

    /// The service responded but the payload was unusable
    #[error("Task generation returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Storage-specific errors.
///
/// An operation's in-memory mutation may already be applied when the
/// flush fails; that inconsistency window is surfaced, not hidden.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A persisted value could not be decoded into its domain type
    #[error("Corrupt value in column '{column}': {value:?}")]
    Corrupt { column: String, value: String },
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

    /// Home/config directory could not be resolved
    #[error("Could not resolve data directory: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
