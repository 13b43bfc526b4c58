use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DurabilityError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("path has no parent directory: {0}")]
    InvalidPath(PathBuf),

    #[error("checkpoint not found for run '{0}'")]
    CheckpointNotFound(String),

    #[error("checkpoint for run '{0}' is invalid: {1}")]
    CheckpointInvalid(String, String),

    #[error("run '{0}' is already complete")]
    AlreadyComplete(String),

    #[error("results writer channel closed")]
    WriterClosed,
}

impl From<DurabilityError> for membench_core::CaseError {
    fn from(err: DurabilityError) -> Self {
        membench_core::CaseError::new(err.to_string())
    }
}
