//! Run manifest: environment & provenance capture (spec.md 4.E).

use chrono::{DateTime, Utc};
use membench_core::Selection;
use membench_registry::{BenchmarkProvenance, ProviderProvenance};
use serde::{Deserialize, Serialize};
use std::process::Command;

pub const RUN_MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitProvenance {
    pub commit: String,
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub version: u32,
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub runtime_name: String,
    pub runtime_version: String,
    pub os: String,
    pub arch: String,
    pub args: Vec<String>,
    pub selection: Selection,
    pub providers: Vec<ProviderProvenance>,
    pub benchmarks: Vec<BenchmarkProvenance>,
    #[serde(default)]
    pub git: Option<GitProvenance>,
}

impl RunManifest {
    pub fn capture(
        run_id: &str,
        timestamp: DateTime<Utc>,
        selection: &Selection,
        providers: Vec<ProviderProvenance>,
        benchmarks: Vec<BenchmarkProvenance>,
    ) -> Self {
        Self {
            version: RUN_MANIFEST_VERSION,
            run_id: run_id.to_string(),
            timestamp,
            runtime_name: "membench".to_string(),
            runtime_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            args: std::env::args().collect(),
            selection: selection.clone(),
            providers,
            benchmarks,
            git: capture_git_provenance(),
        }
    }
}

/// Best-effort: never fails the run (spec.md 4.E).
fn capture_git_provenance() -> Option<GitProvenance> {
    let commit = run_git(&["rev-parse", "HEAD"])?;
    let branch = run_git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    Some(GitProvenance { commit, branch })
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_fills_runtime_and_os_fields() {
        let selection = Selection::new(vec!["mem0".into()], vec!["longmemeval".into()], 1);
        let providers = vec![ProviderProvenance {
            name: "mem0".into(),
            version: "1.0.0".into(),
            manifest_hash: "deadbeef".into(),
        }];
        let benchmarks = vec![BenchmarkProvenance {
            name: "longmemeval".into(),
            version: "1.0.0".into(),
            case_count: 10,
        }];
        let manifest = RunManifest::capture("run1", Utc::now(), &selection, providers, benchmarks);

        assert_eq!(manifest.version, RUN_MANIFEST_VERSION);
        assert_eq!(manifest.runtime_name, "membench");
        assert_eq!(manifest.os, std::env::consts::OS);
        assert_eq!(manifest.selection.providers, vec!["mem0".to_string()]);
        assert_eq!(manifest.providers.len(), 1);
        assert_eq!(manifest.benchmarks[0].case_count, 10);
    }

    #[test]
    fn git_capture_never_panics_outside_a_repo() {
        // Best-effort: this must not panic regardless of whether the test
        // process happens to run inside a git checkout.
        let _ = capture_git_provenance();
    }
}
