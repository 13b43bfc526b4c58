use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unknown provider '{0}' in plan entry")]
    UnknownProvider(String),

    #[error("unknown benchmark '{0}' in plan entry")]
    UnknownBenchmark(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<membench_core::CaseError> for ExecError {
    fn from(err: membench_core::CaseError) -> Self {
        ExecError::Persistence(err.message)
    }
}
