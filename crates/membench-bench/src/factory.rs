//! Wires a manifest into a `Benchmark`, implementing the six-step per-case
//! workflow (spec.md 4.B): ingest, retrieve, synthesize, evaluate, score
//! retrieval, decide status, cleanup.

use crate::error::BenchError;
use crate::evaluation::{self, AnswerSynthesizer, EvaluationProtocol, JudgeClient};
use crate::ingestion::{self, derive_relevant_ids, Ingestion};
use crate::manifest::{BenchmarkManifest, EvaluationConfig};
use crate::retrieval_metrics;
use async_trait::async_trait;
use membench_core::{Benchmark, BenchmarkCase, BenchmarkMeta, CaseResult, CaseStatus, Provider, ScopeContext};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Dependencies the `llm-as-judge` protocol needs from the outside world.
/// Both are out-of-scope collaborators (spec.md 1); tests supply stubs.
pub struct JudgeDependencies {
    pub judge_client: Arc<dyn JudgeClient>,
    pub synthesizer: Arc<dyn AnswerSynthesizer>,
}

pub struct ManifestBenchmark {
    meta: BenchmarkMeta,
    cases: Vec<BenchmarkCase>,
    ingestion: Box<dyn Ingestion>,
    ingestion_config: crate::manifest::IngestionConfig,
    evaluation: Box<dyn EvaluationProtocol>,
    synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
    retrieval_limit: usize,
    question_field: String,
}

impl ManifestBenchmark {
    pub fn from_manifest(
        manifest: BenchmarkManifest,
        judge_deps: Option<JudgeDependencies>,
    ) -> Result<Self, BenchError> {
        manifest.validate()?;

        let records = crate::dataset::load_records(&manifest.data_file)?;
        let cases = crate::dataset::build_cases(records, &manifest);

        let ingestion = ingestion::build_ingestion(&manifest.ingestion)?;

        let (evaluation, synthesizer): (Box<dyn EvaluationProtocol>, Option<Arc<dyn AnswerSynthesizer>>) =
            match &manifest.evaluation {
                EvaluationConfig::ExactMatch {
                    case_sensitive,
                    normalize_whitespace,
                    trim,
                } => (
                    Box::new(evaluation::ExactMatchProtocol {
                        case_sensitive: *case_sensitive,
                        normalize_whitespace: *normalize_whitespace,
                        trim: *trim,
                    }),
                    None,
                ),
                EvaluationConfig::LlmAsJudge { type_instructions_file } => {
                    let deps = judge_deps.ok_or_else(|| {
                        BenchError::InvalidManifest(
                            "llm-as-judge protocol requires judge/synthesizer dependencies".into(),
                        )
                    })?;
                    let type_instructions = match type_instructions_file {
                        Some(path) => load_type_instructions(path)?,
                        None => HashMap::new(),
                    };
                    (
                        Box::new(evaluation::LlmAsJudgeProtocol {
                            judge_client: deps.judge_client,
                            type_instructions,
                        }),
                        Some(deps.synthesizer),
                    )
                }
                EvaluationConfig::DeletionCheck {} => {
                    return Err(BenchError::UnsupportedEvaluationProtocol("deletion-check".into()))
                }
            };

        Ok(Self {
            meta: BenchmarkMeta {
                name: manifest.name.clone(),
                version: manifest.version.clone(),
                description: None,
                required_capabilities: manifest.required_capabilities.clone(),
            },
            cases,
            ingestion,
            ingestion_config: manifest.ingestion,
            evaluation,
            synthesizer,
            retrieval_limit: manifest.query.retrieval_limit,
            question_field: manifest.query.question_field,
        })
    }
}

fn load_type_instructions(path: &std::path::Path) -> Result<HashMap<String, String>, BenchError> {
    let raw = std::fs::read_to_string(path).map_err(|source| BenchError::DataFileRead {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| BenchError::DataFileParse {
        path: path.display().to_string(),
        source,
    })
}

#[async_trait]
impl Benchmark for ManifestBenchmark {
    fn meta(&self) -> &BenchmarkMeta {
        &self.meta
    }

    fn cases(&self) -> Vec<BenchmarkCase> {
        self.cases.clone()
    }

    async fn run_case(
        &self,
        provider: Arc<dyn Provider>,
        scope: &ScopeContext,
        case: &BenchmarkCase,
    ) -> Result<CaseResult, membench_core::CaseError> {
        let started = Instant::now();

        // 1. Ingest. Ids ingested before a partial failure are still
        // returned, so cleanup below reaches them even when ingestion
        // itself errors out partway through a multi-write case.
        let (ingested_ids, ingest_result) = self.ingestion.ingest(&provider, scope, case).await;

        let result = match ingest_result {
            Ok(()) => self.run_case_body(&provider, scope, case, started).await,
            Err(err) => Err(membench_core::CaseError::from(err)),
        };

        // Best-effort cleanup on every exit path (spec.md 3, 9).
        for id in &ingested_ids {
            let _ = provider.delete_memory(scope, id).await;
        }
        result
    }
}

impl ManifestBenchmark {
    async fn run_case_body(
        &self,
        provider: &Arc<dyn Provider>,
        scope: &ScopeContext,
        case: &BenchmarkCase,
        started: Instant,
    ) -> Result<CaseResult, membench_core::CaseError> {
        let question = case
            .input
            .get(&self.question_field)
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        // 2. Retrieve.
        let retrieved = provider.retrieve_memory(scope, question, self.retrieval_limit).await?;

        // 3. Synthesize answer.
        let generated = match &self.synthesizer {
            Some(synthesizer) => {
                let contexts: Vec<String> = retrieved.iter().map(|item| item.text().to_string()).collect();
                synthesizer
                    .synthesize(question, &contexts)
                    .await
                    .map_err(membench_core::CaseError::from)?
            }
            None => evaluation::top_n_contexts(&retrieved, 3).join(" "),
        };

        let question_type = case.input.get("question_type").and_then(|v| v.as_str());

        // 4. Evaluate.
        let outcome = self
            .evaluation
            .evaluate(question, &case.expected, &generated, &retrieved, question_type)
            .await;

        // 5. Score retrieval.
        let mut scores = HashMap::new();
        scores.insert("correctness".to_string(), outcome.correctness);
        scores.insert("faithfulness".to_string(), outcome.faithfulness);

        let relevant_ids = derive_relevant_ids(&self.ingestion_config, case);
        if !relevant_ids.is_empty() {
            let metrics = retrieval_metrics::compute(&retrieved, &relevant_ids, self.retrieval_limit);
            scores.insert("precision".to_string(), metrics.precision);
            scores.insert("recall".to_string(), metrics.recall);
            scores.insert("f1".to_string(), metrics.f1);
            scores.insert("coverage_at_k".to_string(), metrics.coverage_at_k);
            scores.insert("ndcg_at_k".to_string(), metrics.ndcg_at_k);
            scores.insert("map".to_string(), metrics.map);
        }

        // 6. Decide status.
        let status = if outcome.judge_error {
            CaseStatus::Error
        } else if outcome.correctness >= 0.7 && outcome.faithfulness >= 0.5 {
            CaseStatus::Pass
        } else {
            CaseStatus::Fail
        };

        let artifacts = (outcome.reasoning.is_some() || outcome.type_specific.is_some() || outcome.additional.is_some())
            .then(|| {
                serde_json::json!({
                    "reasoning": outcome.reasoning,
                    "type_specific": outcome.type_specific,
                    "additional": outcome.additional,
                })
            });

        let mut result = CaseResult::new(case.id.clone(), status, started.elapsed().as_millis() as u64).with_scores(scores);
        result.artifacts = artifacts;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use membench_core::{MemoryRecord, ProviderCapabilities, ProviderResult, RetrievalItem};
    use std::io::Write;

    struct FixedProvider;

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn add_memory(
            &self,
            _scope: &ScopeContext,
            content: &str,
            _metadata: Option<HashMap<String, serde_json::Value>>,
        ) -> ProviderResult<MemoryRecord> {
            Ok(MemoryRecord::new("mem-1", content))
        }

        async fn retrieve_memory(
            &self,
            _scope: &ScopeContext,
            _query: &str,
            _limit: usize,
        ) -> ProviderResult<Vec<RetrievalItem>> {
            Ok(vec![RetrievalItem::new(MemoryRecord::new("mem-1", "Paris"), 1.0)])
        }

        async fn delete_memory(&self, _scope: &ScopeContext, _id: &str) -> ProviderResult<bool> {
            Ok(true)
        }

        async fn get_capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::default()
        }
    }

    #[tokio::test]
    async fn exact_match_happy_path_passes() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data.jsonl");
        writeln!(
            std::fs::File::create(&data_path).unwrap(),
            r#"{{"id": "case-1", "question": "What is the capital of France?", "answer": "Paris", "content": "Paris"}}"#
        )
        .unwrap();

        let manifest = BenchmarkManifest {
            manifest_version: "1".into(),
            name: "geo".into(),
            version: "1.0.0".into(),
            data_file: data_path,
            flatten: None,
            ingestion: crate::manifest::IngestionConfig::Simple {
                content_field: "content".into(),
                is_array: false,
                metadata_fields: vec![],
            },
            query: crate::manifest::QueryConfig {
                question_field: "question".into(),
                expected_answer_field: "answer".into(),
                retrieval_limit: 5,
            },
            evaluation: EvaluationConfig::ExactMatch {
                case_sensitive: false,
                normalize_whitespace: true,
                trim: true,
            },
            metrics: vec![],
            required_capabilities: vec![],
        };

        let benchmark = ManifestBenchmark::from_manifest(manifest, None).unwrap();
        let cases = benchmark.cases();
        assert_eq!(cases.len(), 1);

        let provider: Arc<dyn Provider> = Arc::new(FixedProvider);
        let scope = ScopeContext::for_case("run1", "fixed", "geo", "case-1");
        let result = benchmark.run_case(provider, &scope, &cases[0]).await.unwrap();

        assert_eq!(result.status, CaseStatus::Pass);
        assert_eq!(result.scores["correctness"], 1.0);
        assert_eq!(result.scores["faithfulness"], 1.0);
    }
}
