//! Run-plan data model (spec.md 3, 4.C). Shared between `membench-plan`
//! (producer), `membench-exec` (consumer), and `membench-durability`
//! (persists the selection alongside the checkpoint/manifest).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A CLI/programmatic selection: which providers and benchmarks to run,
/// and how wide the executor's concurrency pool should be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub providers: Vec<String>,
    pub benchmarks: Vec<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

impl Selection {
    pub fn new(providers: Vec<String>, benchmarks: Vec<String>, concurrency: usize) -> Self {
        Self {
            providers,
            benchmarks,
            concurrency: concurrency.max(1),
        }
    }
}

/// Why a `(provider, benchmark)` entry was marked ineligible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipReason {
    pub provider: String,
    pub benchmark: String,
    pub missing_capabilities: Vec<String>,
    pub message: String,
}

/// One cell of the provider x benchmark matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlanEntry {
    pub provider_name: String,
    pub benchmark_name: String,
    pub eligible: bool,
    #[serde(default)]
    pub skip_reason: Option<SkipReason>,
}

/// The deterministic output of the plan builder (spec.md 4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<RunPlanEntry>,
    pub eligible_count: usize,
    pub skipped_count: usize,
}

impl RunPlan {
    pub fn eligible_entries(&self) -> impl Iterator<Item = &RunPlanEntry> {
        self.entries.iter().filter(|e| e.eligible)
    }
}
