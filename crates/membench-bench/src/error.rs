//! `membench-bench`'s error boundary, following the teacher's per-crate
//! `thiserror` enum convention (`copilot_sdk::error::CopilotError`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("unsupported ingestion strategy: {0}")]
    UnsupportedIngestionStrategy(String),

    #[error("unsupported evaluation protocol: {0}")]
    UnsupportedEvaluationProtocol(String),

    #[error("failed to read data file {path}: {source}")]
    DataFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse data file {path}: {source}")]
    DataFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest field '{field}' missing or malformed: {reason}")]
    MalformedField { field: String, reason: String },

    #[error("provider error during {operation}: {message}")]
    Provider { operation: String, message: String },
}

impl BenchError {
    pub fn provider(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl From<BenchError> for membench_core::CaseError {
    fn from(err: BenchError) -> Self {
        membench_core::CaseError::new(err.to_string())
    }
}
