//! Scope isolation handle.
//!
//! Modeled on the teacher's `copilot_tenant::isolation::TenantContext`: a
//! small, cheaply-cloned struct that every provider call takes so that one
//! case's memories never leak into another's keyspace.

use serde::{Deserialize, Serialize};

/// Isolation handle passed to every `Provider` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeContext {
    pub user_id: String,
    pub run_id: String,
    pub session_id: String,
    pub namespace: String,
}

impl ScopeContext {
    pub fn new(
        user_id: impl Into<String>,
        run_id: impl Into<String>,
        session_id: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            run_id: run_id.into(),
            session_id: session_id.into(),
            namespace: namespace.into(),
        }
    }

    /// Build the scope for a single case, per spec.md 4.D:
    /// `user_id="user_{run_id}"`, `session_id="{provider}_{benchmark}_{case_id}"`,
    /// `namespace="runner_{run_id}"`.
    pub fn for_case(run_id: &str, provider_name: &str, benchmark_name: &str, case_id: &str) -> Self {
        Self {
            user_id: format!("user_{run_id}"),
            run_id: run_id.to_string(),
            session_id: format!("{provider_name}_{benchmark_name}_{case_id}"),
            namespace: format!("runner_{run_id}"),
        }
    }

    /// Prefixed cache/storage key, mirroring `TenantContext::cache_key`.
    pub fn scoped_key(&self, key: &str) -> String {
        format!("{}:{}:{}", self.namespace, self.session_id, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_case_builds_unique_session_ids() {
        let a = ScopeContext::for_case("run1", "mem0", "longmemeval", "case-1");
        let b = ScopeContext::for_case("run1", "mem0", "longmemeval", "case-2");
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.user_id, "user_run1");
        assert_eq!(a.namespace, "runner_run1");
    }

    #[test]
    fn scoped_key_includes_namespace_and_session() {
        let scope = ScopeContext::for_case("run1", "mem0", "bench", "case-1");
        let key = scope.scoped_key("memory:42");
        assert!(key.contains("runner_run1"));
        assert!(key.contains("mem0_bench_case-1"));
    }
}
