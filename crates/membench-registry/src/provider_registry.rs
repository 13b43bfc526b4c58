//! Provider registry.
//!
//! Modeled on the teacher's `copilot_tenant::isolation` in-memory registry:
//! a `parking_lot::RwLock<HashMap<..>>` that is written during registration
//! and read-only for the rest of the process lifetime.

use crate::entry::ProviderEntry;
use crate::hash::manifest_hash;
use membench_core::Provider;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct ProviderRegistry {
    entries: RwLock<HashMap<String, Arc<ProviderEntry>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `name`. `manifest` is any JSON-serializable
    /// declaration the provider author wants captured for provenance (e.g.
    /// its capability set); it is hashed, not stored verbatim.
    pub fn register(
        &self,
        name: impl Into<String>,
        version: impl Into<String>,
        manifest: &serde_json::Value,
        provider: Arc<dyn Provider>,
    ) {
        let name = name.into();
        let entry = Arc::new(ProviderEntry {
            name: name.clone(),
            version: version.into(),
            manifest_hash: manifest_hash(manifest),
            provider,
        });
        tracing::info!(provider = %name, manifest_hash = %entry.manifest_hash, "registered provider");
        self.entries.write().insert(name, entry);
    }

    pub fn get(&self, name: &str) -> Option<Arc<ProviderEntry>> {
        self.entries.read().get(name).cloned()
    }

    /// Names in lexicographic order, for deterministic error messages
    /// (spec.md 4.A).
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use membench_core::{CaseError, ProviderCapabilities, ProviderResult, ScopeContext};
    use serde_json::json;

    struct StubProvider;

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn add_memory(
            &self,
            _scope: &ScopeContext,
            _content: &str,
            _metadata: Option<std::collections::HashMap<String, serde_json::Value>>,
        ) -> ProviderResult<membench_core::MemoryRecord> {
            Ok(membench_core::MemoryRecord::new("1", "x"))
        }

        async fn retrieve_memory(
            &self,
            _scope: &ScopeContext,
            _query: &str,
            _limit: usize,
        ) -> ProviderResult<Vec<membench_core::RetrievalItem>> {
            Ok(vec![])
        }

        async fn delete_memory(&self, _scope: &ScopeContext, _id: &str) -> ProviderResult<bool> {
            Ok(true)
        }

        async fn get_capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::default()
        }
    }

    fn _assert_case_error_unused(_: CaseError) {}

    #[test]
    fn register_and_lookup_by_name() {
        let registry = ProviderRegistry::new();
        registry.register("mem0", "1.0.0", &json!({"name": "mem0"}), Arc::new(StubProvider));

        let entry = registry.get("mem0").expect("registered");
        assert_eq!(entry.version, "1.0.0");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn names_are_lexicographically_sorted() {
        let registry = ProviderRegistry::new();
        registry.register("zeta", "1.0", &json!({}), Arc::new(StubProvider));
        registry.register("alpha", "1.0", &json!({}), Arc::new(StubProvider));
        assert_eq!(registry.names(), vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
