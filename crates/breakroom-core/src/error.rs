//! Error types for breakroom-core.
//!
//! Scheduling errors are deliberately thin: most policy violations
//! (postponing in strict mode, skipping past a limit) are rejected as
//! no-ops rather than surfaced as errors. What remains here is invalid
//! external input and storage failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::scheduler::EventKind;

/// Errors raised by the scheduler and the command surface.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// `arm` was called while another event is pending.
    #[error("scheduler already armed with '{pending:?}', clear it first")]
    AlreadyArmed { pending: EventKind },

    /// Malformed `--wait`/`--for` values. The command is rejected with
    /// no state change.
    #[error("invalid duration '{input}'")]
    InvalidDuration { input: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown or malformed configuration key
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to (de)serialize configuration
    #[error("failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Config directory errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// State-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database
    #[error("failed to open state store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A stored value could not be interpreted
    #[error("invalid stored value: {0}")]
    InvalidValue(String),

    /// Data directory errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}
