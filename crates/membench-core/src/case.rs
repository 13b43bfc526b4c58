//! Benchmark cases and their outcomes.

use crate::error::CaseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One unit of work inside a benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkCase {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub input: serde_json::Map<String, serde_json::Value>,
    pub expected: serde_json::Value,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Pass => write!(f, "pass"),
            CaseStatus::Fail => write!(f, "fail"),
            CaseStatus::Skip => write!(f, "skip"),
            CaseStatus::Error => write!(f, "error"),
        }
    }
}

/// One attempt record in a case's retry history (spec.md 4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAttempt {
    pub attempt: u32,
    pub category: String,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub delay_ms: u64,
}

/// The raw outcome of `Benchmark::run_case`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_id: String,
    pub status: CaseStatus,
    #[serde(default)]
    pub scores: HashMap<String, f64>,
    pub duration_ms: u64,
    #[serde(default)]
    pub error: Option<CaseError>,
    #[serde(default)]
    pub artifacts: Option<serde_json::Value>,
}

impl CaseResult {
    pub fn new(case_id: impl Into<String>, status: CaseStatus, duration_ms: u64) -> Self {
        Self {
            case_id: case_id.into(),
            status,
            scores: HashMap::new(),
            duration_ms,
            error: None,
            artifacts: None,
        }
    }

    pub fn with_scores(mut self, scores: HashMap<String, f64>) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_error(mut self, error: CaseError) -> Self {
        self.error = Some(error);
        self
    }
}

/// `CaseResult` augmented with the fields the executor adds once it wraps a
/// case in retry/scope/timing machinery (spec.md 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCaseResult {
    #[serde(flatten)]
    pub case: CaseResult,
    pub provider_name: String,
    pub benchmark_name: String,
    #[serde(default)]
    pub operation_timings: Option<HashMap<String, u64>>,
    #[serde(default)]
    pub retry_history: Vec<RetryAttempt>,
}

impl RunCaseResult {
    pub fn new(case: CaseResult, provider_name: impl Into<String>, benchmark_name: impl Into<String>) -> Self {
        Self {
            case,
            provider_name: provider_name.into(),
            benchmark_name: benchmark_name.into(),
            operation_timings: None,
            retry_history: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_result_builder_round_trips() {
        let mut scores = HashMap::new();
        scores.insert("correctness".to_string(), 1.0);

        let result = CaseResult::new("case-1", CaseStatus::Pass, 42).with_scores(scores.clone());
        assert_eq!(result.status, CaseStatus::Pass);
        assert_eq!(result.scores, scores);

        let json = serde_json::to_string(&result).unwrap();
        let back: CaseResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.case_id, "case-1");
    }

    #[test]
    fn run_case_result_flattens_case_fields() {
        let result = CaseResult::new("case-1", CaseStatus::Fail, 10);
        let run_result = RunCaseResult::new(result, "mem0", "longmemeval");

        let json = serde_json::to_value(&run_result).unwrap();
        assert_eq!(json["case_id"], "case-1");
        assert_eq!(json["provider_name"], "mem0");
    }
}
