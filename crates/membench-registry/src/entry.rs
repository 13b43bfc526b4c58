//! Registry entries: a named handle plus provenance metadata.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A registered provider, its version, and the SHA-256 manifest hash used
/// for run-manifest provenance (spec.md 4.A).
pub struct ProviderEntry {
    pub name: String,
    pub version: String,
    pub manifest_hash: String,
    pub provider: Arc<dyn membench_core::Provider>,
}

/// A registered benchmark, its version, and its manifest hash.
pub struct BenchmarkEntry {
    pub name: String,
    pub version: String,
    pub manifest_hash: String,
    pub benchmark: Arc<dyn membench_core::Benchmark>,
}

/// Provenance summary written into `run_manifest.json` (spec.md 3's
/// `RunManifest.providers[]` / `benchmarks[]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProvenance {
    pub name: String,
    pub version: String,
    pub manifest_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkProvenance {
    pub name: String,
    pub version: String,
    pub case_count: usize,
}

impl From<&ProviderEntry> for ProviderProvenance {
    fn from(entry: &ProviderEntry) -> Self {
        Self {
            name: entry.name.clone(),
            version: entry.version.clone(),
            manifest_hash: entry.manifest_hash.clone(),
        }
    }
}

impl From<&BenchmarkEntry> for BenchmarkProvenance {
    fn from(entry: &BenchmarkEntry) -> Self {
        Self {
            name: entry.name.clone(),
            version: entry.version.clone(),
            case_count: entry.benchmark.cases().len(),
        }
    }
}
