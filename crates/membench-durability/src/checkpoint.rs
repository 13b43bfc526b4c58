//! Checkpoint manager (spec.md 4.E): create/load/recordCompletion/
//! validateSelections/getCompletedKeys, backed by `write_json_atomic`.

use crate::atomic::write_json_atomic;
use crate::error::DurabilityError;
use chrono::{DateTime, Utc};
use membench_core::Selection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointSelections {
    pub providers: Vec<String>,
    pub benchmarks: Vec<String>,
}

impl From<&Selection> for CheckpointSelections {
    fn from(selection: &Selection) -> Self {
        let mut providers = selection.providers.clone();
        let mut benchmarks = selection.benchmarks.clone();
        providers.sort();
        benchmarks.sort();
        Self { providers, benchmarks }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub run_id: String,
    pub selections: CheckpointSelections,
    pub total_cases: usize,
    pub completed_count: usize,
    /// case_key -> status, in completion order of insertion (map order is
    /// not guaranteed, but `completed_count` and `|completed|` always agree).
    pub completed: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    fn validate_invariants(&self, run_id: &str) -> Result<(), DurabilityError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(DurabilityError::CheckpointInvalid(
                run_id.to_string(),
                format!("unsupported checkpoint version {}", self.version),
            ));
        }
        if self.completed_count != self.completed.len() {
            return Err(DurabilityError::CheckpointInvalid(
                run_id.to_string(),
                format!(
                    "completed_count ({}) does not match |completed| ({})",
                    self.completed_count,
                    self.completed.len()
                ),
            ));
        }
        Ok(())
    }
}

pub enum LoadOutcome {
    NotFound,
    Loaded(Checkpoint),
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionDiff {
    pub missing_providers: Vec<String>,
    pub extra_providers: Vec<String>,
    pub missing_benchmarks: Vec<String>,
    pub extra_benchmarks: Vec<String>,
}

impl SelectionDiff {
    pub fn is_compatible(&self) -> bool {
        self.missing_providers.is_empty()
            && self.extra_providers.is_empty()
            && self.missing_benchmarks.is_empty()
            && self.extra_benchmarks.is_empty()
    }
}

fn checkpoint_path(run_dir: &Path) -> PathBuf {
    run_dir.join("checkpoint.json")
}

/// `create(run_id, selections, total_cases)` — initial checkpoint with an
/// empty `completed` set, immediately persisted.
pub fn create(
    run_dir: &Path,
    run_id: &str,
    selection: &Selection,
    total_cases: usize,
) -> Result<Checkpoint, DurabilityError> {
    let now = Utc::now();
    let checkpoint = Checkpoint {
        version: CHECKPOINT_VERSION,
        run_id: run_id.to_string(),
        selections: CheckpointSelections::from(selection),
        total_cases,
        completed_count: 0,
        completed: HashMap::new(),
        created_at: now,
        updated_at: now,
    };
    write_json_atomic(&checkpoint_path(run_dir), &checkpoint)?;
    Ok(checkpoint)
}

/// `load(run_id)` — {not_found | loaded | invalid(reason)}.
pub fn load(run_dir: &Path, run_id: &str) -> Result<LoadOutcome, DurabilityError> {
    let path = checkpoint_path(run_dir);
    if !path.exists() {
        return Ok(LoadOutcome::NotFound);
    }

    let raw = std::fs::read_to_string(&path)?;
    let checkpoint: Checkpoint = match serde_json::from_str(&raw) {
        Ok(c) => c,
        Err(err) => return Ok(LoadOutcome::Invalid(format!("malformed checkpoint JSON: {err}"))),
    };

    match checkpoint.validate_invariants(run_id) {
        Ok(()) => Ok(LoadOutcome::Loaded(checkpoint)),
        Err(DurabilityError::CheckpointInvalid(_, reason)) => Ok(LoadOutcome::Invalid(reason)),
        Err(other) => Err(other),
    }
}

/// `recordCompletion(checkpoint, case_key, status)` — updated snapshot
/// persisted atomically; increments `completed_count`; updates `updated_at`.
pub fn record_completion(
    run_dir: &Path,
    checkpoint: &mut Checkpoint,
    case_key: &str,
    status: &str,
) -> Result<(), DurabilityError> {
    checkpoint.completed.insert(case_key.to_string(), status.to_string());
    checkpoint.completed_count = checkpoint.completed.len();
    checkpoint.updated_at = Utc::now();
    write_json_atomic(&checkpoint_path(run_dir), checkpoint)
}

/// `validateSelections(checkpoint, selections)` — four-way diff of
/// missing/extra providers/benchmarks. Resume requires exact set equality
/// on both dimensions.
pub fn validate_selections(checkpoint: &Checkpoint, selection: &Selection) -> SelectionDiff {
    let current = CheckpointSelections::from(selection);

    let checkpoint_providers: HashSet<_> = checkpoint.selections.providers.iter().collect();
    let current_providers: HashSet<_> = current.providers.iter().collect();
    let checkpoint_benchmarks: HashSet<_> = checkpoint.selections.benchmarks.iter().collect();
    let current_benchmarks: HashSet<_> = current.benchmarks.iter().collect();

    let mut missing_providers: Vec<String> = checkpoint_providers
        .difference(&current_providers)
        .map(|s| s.to_string())
        .collect();
    let mut extra_providers: Vec<String> = current_providers
        .difference(&checkpoint_providers)
        .map(|s| s.to_string())
        .collect();
    let mut missing_benchmarks: Vec<String> = checkpoint_benchmarks
        .difference(&current_benchmarks)
        .map(|s| s.to_string())
        .collect();
    let mut extra_benchmarks: Vec<String> = current_benchmarks
        .difference(&checkpoint_benchmarks)
        .map(|s| s.to_string())
        .collect();

    missing_providers.sort();
    extra_providers.sort();
    missing_benchmarks.sort();
    extra_benchmarks.sort();

    SelectionDiff { missing_providers, extra_providers, missing_benchmarks, extra_benchmarks }
}

/// `getCompletedKeys(checkpoint)` — the set the executor uses to skip
/// already-finished cases.
pub fn completed_keys(checkpoint: &Checkpoint) -> HashSet<String> {
    checkpoint.completed.keys().cloned().collect()
}
