//! Hub error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type HubResult<T> = Result<T, HubError>;
