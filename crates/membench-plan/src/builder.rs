//! Plan builder / gating (spec.md 4.C).

use crate::error::PlanError;
use chrono::Utc;
use membench_core::{RunPlan, RunPlanEntry, Selection, SkipReason};
use membench_registry::{BenchmarkRegistry, ProviderRegistry};

/// Resolve a selection against the registries, expand the provider x
/// benchmark matrix in deterministic (lexicographic) order, and gate each
/// entry on capability satisfaction. Pure w.r.t. registry state: identical
/// inputs and registry contents yield an identical `entries` sequence.
pub async fn build_run_plan(
    selection: &Selection,
    providers: &ProviderRegistry,
    benchmarks: &BenchmarkRegistry,
) -> Result<RunPlan, PlanError> {
    if selection.providers.is_empty() || selection.benchmarks.is_empty() {
        return Err(PlanError::EmptySelection);
    }

    for name in &selection.providers {
        if providers.get(name).is_none() {
            return Err(PlanError::UnknownProvider {
                name: name.clone(),
                known: providers.names(),
            });
        }
    }
    for name in &selection.benchmarks {
        if benchmarks.get(name).is_none() {
            return Err(PlanError::UnknownBenchmark {
                name: name.clone(),
                known: benchmarks.names(),
            });
        }
    }

    let mut sorted_providers = selection.providers.clone();
    sorted_providers.sort();
    let mut sorted_benchmarks = selection.benchmarks.clone();
    sorted_benchmarks.sort();

    let mut entries = Vec::with_capacity(sorted_providers.len() * sorted_benchmarks.len());
    for provider_name in &sorted_providers {
        let provider_entry = providers.get(provider_name).expect("validated above");
        let capabilities = provider_entry.provider.get_capabilities().await;

        for benchmark_name in &sorted_benchmarks {
            let benchmark_entry = benchmarks.get(benchmark_name).expect("validated above");
            let required = &benchmark_entry.benchmark.meta().required_capabilities;
            let missing = capabilities.missing(required);

            let (eligible, skip_reason) = if missing.is_empty() {
                (true, None)
            } else {
                let message = format!(
                    "Provider '{provider_name}' lacks required capability: {}",
                    missing.join(", ")
                );
                (
                    false,
                    Some(SkipReason {
                        provider: provider_name.clone(),
                        benchmark: benchmark_name.clone(),
                        missing_capabilities: missing,
                        message,
                    }),
                )
            };

            entries.push(RunPlanEntry {
                provider_name: provider_name.clone(),
                benchmark_name: benchmark_name.clone(),
                eligible,
                skip_reason,
            });
        }
    }

    let eligible_count = entries.iter().filter(|e| e.eligible).count();
    let skipped_count = entries.len() - eligible_count;

    tracing::info!(
        eligible_count,
        skipped_count,
        entries = entries.len(),
        "built run plan"
    );

    Ok(RunPlan {
        run_id: uuid::Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        entries,
        eligible_count,
        skipped_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use membench_core::{
        Benchmark, BenchmarkCase, BenchmarkMeta, CaseResult, CaseStatus, MemoryRecord, Provider,
        ProviderCapabilities, ProviderResult, RetrievalItem, ScopeContext,
    };
    use serde_json::json;
    use std::sync::Arc;

    struct StubProvider {
        capabilities: ProviderCapabilities,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }
        async fn add_memory(
            &self,
            _: &ScopeContext,
            _: &str,
            _: Option<std::collections::HashMap<String, serde_json::Value>>,
        ) -> ProviderResult<MemoryRecord> {
            Ok(MemoryRecord::new("1", "x"))
        }
        async fn retrieve_memory(&self, _: &ScopeContext, _: &str, _: usize) -> ProviderResult<Vec<RetrievalItem>> {
            Ok(vec![])
        }
        async fn delete_memory(&self, _: &ScopeContext, _: &str) -> ProviderResult<bool> {
            Ok(true)
        }
        async fn get_capabilities(&self) -> ProviderCapabilities {
            self.capabilities
        }
    }

    struct StubBenchmark {
        meta: BenchmarkMeta,
    }

    #[async_trait]
    impl Benchmark for StubBenchmark {
        fn meta(&self) -> &BenchmarkMeta {
            &self.meta
        }
        fn cases(&self) -> Vec<BenchmarkCase> {
            vec![]
        }
        async fn run_case(
            &self,
            _: Arc<dyn Provider>,
            _: &ScopeContext,
            case: &BenchmarkCase,
        ) -> Result<CaseResult, membench_core::CaseError> {
            Ok(CaseResult::new(case.id.clone(), CaseStatus::Skip, 0))
        }
    }

    fn full_capabilities() -> ProviderCapabilities {
        let mut caps = ProviderCapabilities::default();
        caps.core_operations.add_memory = true;
        caps.core_operations.retrieve_memory = true;
        caps.core_operations.delete_memory = true;
        caps
    }

    #[tokio::test]
    async fn gates_entries_missing_capabilities() {
        let providers = ProviderRegistry::new();
        let mut caps = full_capabilities();
        caps.optional_operations.update_memory = false;
        providers.register("mem0", "1.0", &json!({}), Arc::new(StubProvider { capabilities: caps }));

        let benchmarks = BenchmarkRegistry::new();
        benchmarks.register(
            "strict",
            "1.0",
            &json!({}),
            Arc::new(StubBenchmark {
                meta: BenchmarkMeta {
                    name: "strict".into(),
                    version: "1.0".into(),
                    description: None,
                    required_capabilities: vec!["update_memory".into()],
                },
            }),
        );

        let selection = Selection::new(vec!["mem0".into()], vec!["strict".into()], 1);
        let plan = build_run_plan(&selection, &providers, &benchmarks).await.unwrap();

        assert_eq!(plan.eligible_count, 0);
        assert_eq!(plan.skipped_count, 1);
        let reason = plan.entries[0].skip_reason.as_ref().unwrap();
        assert_eq!(reason.missing_capabilities, vec!["update_memory".to_string()]);
        assert_eq!(reason.message, "Provider 'mem0' lacks required capability: update_memory");
    }

    #[tokio::test]
    async fn unknown_provider_lists_known_names() {
        let providers = ProviderRegistry::new();
        providers.register("mem0", "1.0", &json!({}), Arc::new(StubProvider { capabilities: full_capabilities() }));
        let benchmarks = BenchmarkRegistry::new();
        benchmarks.register(
            "b",
            "1.0",
            &json!({}),
            Arc::new(StubBenchmark {
                meta: BenchmarkMeta {
                    name: "b".into(),
                    version: "1.0".into(),
                    description: None,
                    required_capabilities: vec![],
                },
            }),
        );

        let selection = Selection::new(vec!["nope".into()], vec!["b".into()], 1);
        let err = build_run_plan(&selection, &providers, &benchmarks).await.unwrap_err();
        match err {
            PlanError::UnknownProvider { name, known } => {
                assert_eq!(name, "nope");
                assert_eq!(known, vec!["mem0".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn entries_sorted_lexicographically_regardless_of_input_order() {
        let providers = ProviderRegistry::new();
        providers.register("zeta", "1.0", &json!({}), Arc::new(StubProvider { capabilities: full_capabilities() }));
        providers.register("alpha", "1.0", &json!({}), Arc::new(StubProvider { capabilities: full_capabilities() }));
        let benchmarks = BenchmarkRegistry::new();
        benchmarks.register(
            "b",
            "1.0",
            &json!({}),
            Arc::new(StubBenchmark {
                meta: BenchmarkMeta {
                    name: "b".into(),
                    version: "1.0".into(),
                    description: None,
                    required_capabilities: vec![],
                },
            }),
        );

        let selection = Selection::new(vec!["zeta".into(), "alpha".into()], vec!["b".into()], 1);
        let plan = build_run_plan(&selection, &providers, &benchmarks).await.unwrap();
        assert_eq!(plan.entries[0].provider_name, "alpha");
        assert_eq!(plan.entries[1].provider_name, "zeta");
    }
}
