//! Error types for devname
//!
//! Provides a unified error type for all fallible operations.
//!
//! Most of these never reach the driver: storage failures are logged and the
//! engine keeps going without persistence.

use thiserror::Error;

/// Result type alias using DevNameError
pub type Result<T> = std::result::Result<T, DevNameError>;

/// Unified error type for devname operations
#[derive(Debug, Error)]
pub enum DevNameError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Cloud Errors
    // -------------------------------------------------------------------------
    #[error("Cloud error: {0}")]
    Cloud(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for DevNameError {
    fn from(err: bincode::Error) -> Self {
        DevNameError::Serialization(err.to_string())
    }
}
