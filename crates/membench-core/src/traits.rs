//! Trait boundaries the engine core consumes from external collaborators.
//!
//! `Provider` and `Benchmark` are implemented outside this workspace (spec.md
//! 1: "external collaborators"). The core only depends on these interfaces.

use crate::capabilities::ProviderCapabilities;
use crate::case::{BenchmarkCase, CaseResult, RunCaseResult};
use crate::error::CaseError;
use crate::record::{MemoryRecord, RetrievalItem};
use crate::scope::ScopeContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub type ProviderResult<T> = Result<T, CaseError>;

/// A memory-system implementation under evaluation.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn add_memory(
        &self,
        scope: &ScopeContext,
        content: &str,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> ProviderResult<MemoryRecord>;

    async fn retrieve_memory(
        &self,
        scope: &ScopeContext,
        query: &str,
        limit: usize,
    ) -> ProviderResult<Vec<RetrievalItem>>;

    async fn delete_memory(&self, scope: &ScopeContext, id: &str) -> ProviderResult<bool>;

    async fn update_memory(
        &self,
        _scope: &ScopeContext,
        _id: &str,
        _content: &str,
    ) -> ProviderResult<MemoryRecord> {
        Err(CaseError::new("update_memory not supported by this provider"))
    }

    async fn list_memories(&self, _scope: &ScopeContext) -> ProviderResult<Vec<MemoryRecord>> {
        Err(CaseError::new("list_memories not supported by this provider"))
    }

    async fn reset_scope(&self, _scope: &ScopeContext) -> ProviderResult<()> {
        Err(CaseError::new("reset_scope not supported by this provider"))
    }

    async fn get_capabilities(&self) -> ProviderCapabilities;
}

/// A benchmark suite: metadata, a finite restartable case iterator, and a
/// per-case workflow.
#[async_trait]
pub trait Benchmark: Send + Sync {
    fn meta(&self) -> &BenchmarkMeta;

    /// Enumerate cases. Must be finite and produce the same sequence across
    /// repeated calls (spec.md 6: "finite, restartable").
    fn cases(&self) -> Vec<BenchmarkCase>;

    /// Execute one case end to end (ingest -> retrieve -> synthesize ->
    /// evaluate -> score -> cleanup). Returning `Err` signals a thrown
    /// error the executor's retry policy should classify and potentially
    /// retry; a returned `Ok(CaseResult)` with `status = Error` signals a
    /// terminal per-case failure that should not be retried (e.g. a judge
    /// parse error, per spec.md 7.6).
    async fn run_case(
        &self,
        provider: Arc<dyn Provider>,
        scope: &ScopeContext,
        case: &BenchmarkCase,
    ) -> Result<CaseResult, CaseError>;
}

/// Consumes each completed case as the executor produces it (spec.md 4.D,
/// 4.E): the durability layer implements this to append to `results.jsonl`
/// and advance the checkpoint in one step, keeping the executor ignorant of
/// persistence details.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record(&self, result: RunCaseResult) -> Result<(), CaseError>;
}

#[derive(Debug, Clone)]
pub struct BenchmarkMeta {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub required_capabilities: Vec<String>,
}
