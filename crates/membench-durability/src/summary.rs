//! Summary builder (spec.md 4.E): groups `RunCaseResult`s by
//! `(provider, benchmark)`, grounded on the teacher's `BenchmarkResult`
//! metrics-bag shape (`copilot-benchmarks::result`), generalized from a
//! single flat metrics JSON blob to per-key score averaging across cases.

use chrono::{DateTime, Utc};
use membench_core::{CaseStatus, RunCaseResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const SUMMARY_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseCounts {
    pub cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl CaseCounts {
    fn record(&mut self, status: CaseStatus) {
        self.cases += 1;
        match status {
            CaseStatus::Pass => self.passed += 1,
            CaseStatus::Fail => self.failed += 1,
            CaseStatus::Skip => self.skipped += 1,
            CaseStatus::Error => self.errors += 1,
        }
    }

    fn add(&mut self, other: &CaseCounts) {
        self.cases += other.cases;
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CombinationSummary {
    pub provider: String,
    pub benchmark: String,
    pub counts: CaseCounts,
    pub duration_ms: u64,
    pub score_averages: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub version: u32,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub combinations: Vec<CombinationSummary>,
    pub skipped_combos: usize,
    pub totals: CaseCounts,
    pub total_duration_ms: u64,
}

/// Build the summary document. `results` need not be sorted; grouping keys
/// are ordered lexicographically via a `BTreeMap` so `combinations` comes
/// out sorted regardless of input order (spec.md 4.E, invariant 2 analog).
pub fn build_summary(run_id: &str, results: &[RunCaseResult], skipped_combos: usize) -> MetricsSummary {
    let mut groups: BTreeMap<(String, String), Vec<&RunCaseResult>> = BTreeMap::new();
    for result in results {
        groups
            .entry((result.provider_name.clone(), result.benchmark_name.clone()))
            .or_default()
            .push(result);
    }

    let mut combinations = Vec::with_capacity(groups.len());
    let mut totals = CaseCounts::default();
    let mut total_duration_ms = 0u64;

    for ((provider, benchmark), group) in groups {
        let mut counts = CaseCounts::default();
        let mut duration_ms = 0u64;
        let mut score_sums: HashMap<String, (f64, usize)> = HashMap::new();

        for result in &group {
            counts.record(result.case.status);
            duration_ms += result.case.duration_ms;
            for (key, value) in &result.case.scores {
                let entry = score_sums.entry(key.clone()).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let score_averages = score_sums
            .into_iter()
            .map(|(key, (sum, count))| (key, sum / count as f64))
            .collect();

        totals.add(&counts);
        total_duration_ms += duration_ms;
        combinations.push(CombinationSummary { provider, benchmark, counts, duration_ms, score_averages });
    }

    MetricsSummary {
        version: SUMMARY_VERSION,
        run_id: run_id.to_string(),
        generated_at: Utc::now(),
        combinations,
        skipped_combos,
        totals,
        total_duration_ms,
    }
}
