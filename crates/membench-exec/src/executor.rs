//! Batch-pool executor (spec.md 4.D), grounded on the corpus's
//! `llm-test-bench` `BenchmarkRunner::run`/`stream::iter(..).buffer_unordered(..)`
//! pattern, adapted from unbounded semaphore concurrency to strict
//! size-N batches so entries execute in plan order and checkpointing has a
//! predictable cadence.

use crate::cancellation::CancellationSignal;
use crate::error::ExecError;
use crate::retry::execute_with_retry;
use membench_core::{Provider, ResultSink, RetryConfig, RunCaseResult, RunPlan};
use membench_registry::{BenchmarkRegistry, ProviderRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

pub fn case_key(provider: &str, benchmark: &str, case_id: &str) -> String {
    format!("{provider}|{benchmark}|{case_id}")
}

/// Execute every eligible entry of `plan`, skipping case keys already in
/// `completed_keys` (the resume protocol, spec.md 4.E). Each completed case
/// is handed to `sink` before the next case (N=1) or the next batch (N>1)
/// is dispatched.
pub async fn execute_plan(
    plan: &RunPlan,
    run_id: &str,
    providers: &ProviderRegistry,
    benchmarks: &BenchmarkRegistry,
    retry_config: &RetryConfig,
    concurrency: usize,
    completed_keys: &HashSet<String>,
    cancellation: &CancellationSignal,
    sink: &Arc<dyn ResultSink>,
) -> Result<(), ExecError> {
    let concurrency = concurrency.max(1);

    for entry in plan.eligible_entries() {
        if cancellation.is_cancelled() {
            tracing::info!("cancellation observed, dispatching no further entries");
            break;
        }

        let Some(provider_entry) = providers.get(&entry.provider_name) else {
            tracing::error!(provider = %entry.provider_name, "entry skipped: provider vanished from registry");
            continue;
        };
        let Some(benchmark_entry) = benchmarks.get(&entry.benchmark_name) else {
            tracing::error!(benchmark = %entry.benchmark_name, "entry skipped: benchmark vanished from registry");
            continue;
        };

        let cases = benchmark_entry.benchmark.cases();
        let pending: Vec<_> = cases
            .into_iter()
            .filter(|case| {
                !completed_keys.contains(&case_key(&entry.provider_name, &entry.benchmark_name, &case.id))
            })
            .collect();

        for batch in pending.chunks(concurrency) {
            if cancellation.is_cancelled() {
                break;
            }

            let futures = batch.iter().map(|case| {
                let provider = provider_entry.provider.clone();
                let benchmark = benchmark_entry.benchmark.clone();
                let scope = membench_core::ScopeContext::for_case(
                    run_id,
                    &entry.provider_name,
                    &entry.benchmark_name,
                    &case.id,
                );
                let retry_config = retry_config.clone();
                let provider_name = entry.provider_name.clone();
                let benchmark_name = entry.benchmark_name.clone();
                let case = case.clone();

                async move {
                    run_one_case(provider, benchmark, scope, retry_config, provider_name, benchmark_name, case).await
                }
            });

            let results = futures::future::join_all(futures).await;
            for result in results {
                sink.record(result).await.map_err(ExecError::from)?;
            }
        }
    }

    Ok(())
}

async fn run_one_case(
    provider: Arc<dyn Provider>,
    benchmark: Arc<dyn membench_core::Benchmark>,
    scope: membench_core::ScopeContext,
    retry_config: RetryConfig,
    provider_name: String,
    benchmark_name: String,
    case: membench_core::BenchmarkCase,
) -> RunCaseResult {
    let started = Instant::now();

    let (mut case_result, retry_history) = execute_with_retry(&retry_config, &case.id, || {
        let provider = provider.clone();
        let benchmark = benchmark.clone();
        let scope = scope.clone();
        let case = case.clone();
        async move { benchmark.run_case(provider, &scope, &case).await }
    })
    .await;

    case_result.duration_ms = started.elapsed().as_millis() as u64;

    let mut run_result = RunCaseResult::new(case_result, provider_name, benchmark_name);
    run_result.retry_history = retry_history;
    run_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use membench_core::{
        Benchmark, BenchmarkCase, BenchmarkMeta, CaseError, CaseResult, CaseStatus,
        MemoryRecord, ProviderCapabilities, ProviderResult, RetrievalItem, ScopeContext,
    };
    use parking_lot::Mutex;
    use serde_json::json;

    struct NoopProvider;

    #[async_trait]
    impl Provider for NoopProvider {
        fn name(&self) -> &str {
            "noop"
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
            let mut caps = ProviderCapabilities::default();
            caps.core_operations.add_memory = true;
            caps.core_operations.retrieve_memory = true;
            caps.core_operations.delete_memory = true;
            caps
        }
    }

    struct OrderedBenchmark {
        meta: BenchmarkMeta,
        case_ids: Vec<String>,
    }

    #[async_trait]
    impl Benchmark for OrderedBenchmark {
        fn meta(&self) -> &BenchmarkMeta {
            &self.meta
        }
        fn cases(&self) -> Vec<BenchmarkCase> {
            self.case_ids
                .iter()
                .map(|id| BenchmarkCase {
                    id: id.clone(),
                    description: None,
                    input: serde_json::Map::new(),
                    expected: serde_json::Value::Null,
                    metadata: None,
                })
                .collect()
        }
        async fn run_case(
            &self,
            _provider: Arc<dyn Provider>,
            _scope: &ScopeContext,
            case: &BenchmarkCase,
        ) -> Result<CaseResult, CaseError> {
            Ok(CaseResult::new(case.id.clone(), CaseStatus::Pass, 0))
        }
    }

    struct CollectingSink {
        results: Mutex<Vec<RunCaseResult>>,
    }

    #[async_trait]
    impl ResultSink for CollectingSink {
        async fn record(&self, result: RunCaseResult) -> Result<(), CaseError> {
            self.results.lock().push(result);
            Ok(())
        }
    }

    fn plan_with_one_entry(providers: &ProviderRegistry, benchmarks: &BenchmarkRegistry, n_cases: usize) -> RunPlan {
        providers.register("p", "1.0", &json!({}), Arc::new(NoopProvider));
        benchmarks.register(
            "b",
            "1.0",
            &json!({}),
            Arc::new(OrderedBenchmark {
                meta: BenchmarkMeta {
                    name: "b".into(),
                    version: "1.0".into(),
                    description: None,
                    required_capabilities: vec![],
                },
                case_ids: (0..n_cases).map(|i| format!("case-{i}")).collect(),
            }),
        );
        RunPlan {
            run_id: "run1".into(),
            timestamp: chrono::Utc::now(),
            entries: vec![membench_core::RunPlanEntry {
                provider_name: "p".into(),
                benchmark_name: "b".into(),
                eligible: true,
                skip_reason: None,
            }],
            eligible_count: 1,
            skipped_count: 0,
        }
    }

    #[tokio::test]
    async fn concurrency_one_completes_in_plan_order() {
        let providers = ProviderRegistry::new();
        let benchmarks = BenchmarkRegistry::new();
        let plan = plan_with_one_entry(&providers, &benchmarks, 4);
        let collecting_sink = Arc::new(CollectingSink { results: Mutex::new(vec![]) });
        let sink: Arc<dyn ResultSink> = collecting_sink.clone();
        let cancellation = CancellationSignal::new();
        let retry_config = RetryConfig::default();
        let completed = HashSet::new();

        execute_plan(&plan, "run1", &providers, &benchmarks, &retry_config, 1, &completed, &cancellation, &sink)
            .await
            .unwrap();

        let collected = collecting_sink.results.lock();
        let ids: Vec<String> = collected.iter().map(|r| r.case.case_id.clone()).collect();
        assert_eq!(ids, vec!["case-0", "case-1", "case-2", "case-3"]);
    }

    #[tokio::test]
    async fn resume_skips_completed_case_keys() {
        let providers = ProviderRegistry::new();
        let benchmarks = BenchmarkRegistry::new();
        let plan = plan_with_one_entry(&providers, &benchmarks, 4);
        let collecting_sink = Arc::new(CollectingSink { results: Mutex::new(vec![]) });
        let sink: Arc<dyn ResultSink> = collecting_sink.clone();
        let cancellation = CancellationSignal::new();
        let retry_config = RetryConfig::default();
        let mut completed = HashSet::new();
        completed.insert(case_key("p", "b", "case-0"));
        completed.insert(case_key("p", "b", "case-1"));

        execute_plan(&plan, "run1", &providers, &benchmarks, &retry_config, 1, &completed, &cancellation, &sink)
            .await
            .unwrap();

        let collected = collecting_sink.results.lock();
        assert_eq!(collected.len(), 2);
        let ids: Vec<String> = collected.iter().map(|r| r.case.case_id.clone()).collect();
        assert_eq!(ids, vec!["case-2", "case-3"]);
    }
}
