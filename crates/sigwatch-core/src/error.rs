//! Error types for sigwatch-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid status: {0} (must be red, yellow, or green)")]
    InvalidStatus(String),

    #[error("Invalid distance: {0}")]
    InvalidDistance(String),

    #[error("At least one of status or distance_cm must be provided")]
    EmptyPatch,
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
