//! A bundled reference `Provider` so `membench eval` has something to run
//! against without a real memory-system integration on hand. Not part of
//! the core evaluation engine — a thin, in-memory word-overlap store,
//! grounded on the hand-written `StubProvider`/`FixedProvider` fixtures the
//! core crates use in their own tests, generalized into something that
//! actually scores retrieval rather than returning canned records.

use async_trait::async_trait;
use membench_core::{
    CaseError, MemoryRecord, ProviderCapabilities, ProviderResult, RetrievalItem, ScopeContext,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct InMemoryProvider {
    next_id: AtomicU64,
    scopes: Mutex<HashMap<String, Vec<MemoryRecord>>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_key(scope: &ScopeContext) -> String {
        format!("{}|{}", scope.namespace, scope.session_id)
    }

    fn next_id(&self) -> String {
        format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

fn overlap_score(query: &str, content: &str) -> f64 {
    let query_words: std::collections::HashSet<String> =
        query.to_lowercase().split_whitespace().map(str::to_string).collect();
    if query_words.is_empty() {
        return 0.0;
    }
    let content_words: std::collections::HashSet<String> =
        content.to_lowercase().split_whitespace().map(str::to_string).collect();
    let hits = query_words.intersection(&content_words).count();
    hits as f64 / query_words.len() as f64
}

#[async_trait]
impl membench_core::Provider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn add_memory(
        &self,
        scope: &ScopeContext,
        content: &str,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> ProviderResult<MemoryRecord> {
        let mut record = MemoryRecord::new(self.next_id(), content);
        if let Some(metadata) = metadata {
            record = record.with_metadata(metadata);
        }
        self.scopes
            .lock()
            .entry(Self::bucket_key(scope))
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn retrieve_memory(
        &self,
        scope: &ScopeContext,
        query: &str,
        limit: usize,
    ) -> ProviderResult<Vec<RetrievalItem>> {
        let scopes = self.scopes.lock();
        let Some(records) = scopes.get(&Self::bucket_key(scope)) else {
            return Ok(vec![]);
        };

        let mut scored: Vec<RetrievalItem> = records
            .iter()
            .map(|record| RetrievalItem::new(record.clone(), overlap_score(query, &record.context)))
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn delete_memory(&self, scope: &ScopeContext, id: &str) -> ProviderResult<bool> {
        let mut scopes = self.scopes.lock();
        let Some(records) = scopes.get_mut(&Self::bucket_key(scope)) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|record| record.id != id);
        Ok(records.len() != before)
    }

    async fn update_memory(&self, scope: &ScopeContext, id: &str, content: &str) -> ProviderResult<MemoryRecord> {
        let mut scopes = self.scopes.lock();
        let records = scopes.entry(Self::bucket_key(scope)).or_default();
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            return Err(CaseError::new(format!("no memory with id '{id}'")));
        };
        record.context = content.to_string();
        Ok(record.clone())
    }

    async fn list_memories(&self, scope: &ScopeContext) -> ProviderResult<Vec<MemoryRecord>> {
        Ok(self.scopes.lock().get(&Self::bucket_key(scope)).cloned().unwrap_or_default())
    }

    async fn reset_scope(&self, scope: &ScopeContext) -> ProviderResult<()> {
        self.scopes.lock().remove(&Self::bucket_key(scope));
        Ok(())
    }

    async fn get_capabilities(&self) -> ProviderCapabilities {
        let mut caps = ProviderCapabilities::default();
        caps.core_operations.add_memory = true;
        caps.core_operations.retrieve_memory = true;
        caps.core_operations.delete_memory = true;
        caps.optional_operations.update_memory = true;
        caps.optional_operations.list_memories = true;
        caps.optional_operations.reset_scope = true;
        caps.optional_operations.get_capabilities = true;
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membench_core::Provider;

    #[tokio::test]
    async fn retrieves_by_word_overlap_ranked_highest_first() {
        let provider = InMemoryProvider::new();
        let scope = ScopeContext::for_case("run1", "in-memory", "bench", "case-1");

        provider.add_memory(&scope, "the capital of france is paris", None).await.unwrap();
        provider.add_memory(&scope, "bananas are a good source of potassium", None).await.unwrap();

        let hits = provider.retrieve_memory(&scope, "what is the capital of france", 5).await.unwrap();
        assert_eq!(hits[0].record.context, "the capital of france is paris");
    }

    #[tokio::test]
    async fn delete_memory_removes_only_the_matching_id() {
        let provider = InMemoryProvider::new();
        let scope = ScopeContext::for_case("run1", "in-memory", "bench", "case-1");
        let record = provider.add_memory(&scope, "hello", None).await.unwrap();

        assert!(provider.delete_memory(&scope, &record.id).await.unwrap());
        assert!(!provider.delete_memory(&scope, &record.id).await.unwrap());
    }

    #[tokio::test]
    async fn scopes_isolate_memories_across_cases() {
        let provider = InMemoryProvider::new();
        let scope_a = ScopeContext::for_case("run1", "in-memory", "bench", "case-1");
        let scope_b = ScopeContext::for_case("run1", "in-memory", "bench", "case-2");

        provider.add_memory(&scope_a, "only in case one", None).await.unwrap();
        let hits = provider.retrieve_memory(&scope_b, "only in case one", 5).await.unwrap();
        assert!(hits.is_empty());
    }
}
