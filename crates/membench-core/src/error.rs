//! Shared error taxonomy helpers.
//!
//! Each crate in the workspace defines its own `thiserror`-derived error
//! enum at its boundary (`PlanError`, `BenchError`, `ExecError`,
//! `DurabilityError`); this module only holds the pieces shared by all of
//! them: the transient/permanent classification used by the retry policy
//! lives in `membench-exec`, but the `ErrorCategory` type itself is part of
//! the core data model so benchmark and provider errors can be classified
//! uniformly regardless of which crate raised them.

use serde::{Deserialize, Serialize};

/// Whether an error observed while running a case should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Transient,
    Permanent,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Transient => write!(f, "transient"),
            ErrorCategory::Permanent => write!(f, "permanent"),
        }
    }
}

/// An error surfaced by a `Provider` or `Benchmark` implementation.
///
/// The core only needs enough structure to classify and report the error;
/// it does not attempt to model every provider's error type.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CaseError {
    pub message: String,
    pub status: Option<u16>,
}

impl CaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}
