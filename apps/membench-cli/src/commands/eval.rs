//! The `eval` subcommand: wires registries, plan builder, executor and
//! durability layer together. Grounded on the teacher's
//! `apps/copilot-cli::commands::benchmark::run_benchmarks` — parse args,
//! run, render results — generalized from a single flat benchmark list to
//! the provider x benchmark matrix plus checkpoint/resume handling.

use crate::demo_provider::InMemoryProvider;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use membench_bench::{BenchmarkManifest, ManifestBenchmark};
use membench_core::{CaseError, EngineConfig, ResultSink, RunCaseResult, Selection};
use membench_durability::{Checkpoint, LoadOutcome, MetricsSummary, ResultsWriter, RunManifest};
use membench_registry::{BenchmarkProvenance, BenchmarkRegistry, ProviderProvenance, ProviderRegistry};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct EvalArgs {
    pub providers: Vec<String>,
    pub benchmark_manifests: Vec<PathBuf>,
    pub concurrency: Option<usize>,
    pub resume: Option<String>,
    pub runs_dir: Option<PathBuf>,
    pub format: String,
}

pub async fn run(args: EvalArgs) -> Result<()> {
    let engine_config = EngineConfig::load().unwrap_or_default();
    let runs_root = args.runs_dir.unwrap_or(engine_config.runs.root_dir.clone());
    let concurrency = args.concurrency.unwrap_or(engine_config.execution.default_concurrency);

    if args.providers.is_empty() {
        bail!("--providers must name at least one provider");
    }
    if args.benchmark_manifests.is_empty() {
        bail!("--benchmarks must name at least one manifest file");
    }

    let providers = ProviderRegistry::new();
    for name in &args.providers {
        providers.register(name, "1.0.0", &serde_json::json!({"kind": "in-memory"}), Arc::new(InMemoryProvider::new()));
    }

    let benchmarks = BenchmarkRegistry::new();
    let mut benchmark_names = Vec::with_capacity(args.benchmark_manifests.len());
    for path in &args.benchmark_manifests {
        let name = register_benchmark(&benchmarks, path)?;
        benchmark_names.push(name);
    }

    let selection = Selection::new(args.providers.clone(), benchmark_names, concurrency);

    let (run_id, mut checkpoint, mut completed_keys, plan) = match &args.resume {
        Some(resume_id) => resume_run(&runs_root, resume_id, &selection, &providers, &benchmarks).await?,
        None => start_run(&runs_root, &selection, &providers, &benchmarks).await?,
    };

    let run_dir = runs_root.join(&run_id);
    let writer = Arc::new(ResultsWriter::spawn(run_dir.clone()).await.context("failed to open results writer")?);
    let provider_provenance: Vec<ProviderProvenance> = selection
        .providers
        .iter()
        .filter_map(|name| providers.get(name))
        .map(|entry| ProviderProvenance::from(&*entry))
        .collect();
    let benchmark_provenance: Vec<BenchmarkProvenance> = selection
        .benchmarks
        .iter()
        .filter_map(|name| benchmarks.get(name))
        .map(|entry| BenchmarkProvenance::from(&*entry))
        .collect();
    writer
        .write_manifest(&RunManifest::capture(
            &run_id,
            plan.timestamp,
            &selection,
            provider_provenance,
            benchmark_provenance,
        ))
        .context("failed to write run manifest")?;

    let sink: Arc<DurableSink> = Arc::new(DurableSink {
        writer: writer.clone(),
        run_dir: run_dir.clone(),
        checkpoint: Mutex::new(checkpoint.clone()),
        collected: Mutex::new(Vec::new()),
    });
    let sink_dyn: Arc<dyn ResultSink> = sink.clone();

    let cancellation = membench_exec::CancellationSignal::new();
    let exec_result = membench_exec::execute_plan(
        &plan,
        &run_id,
        &providers,
        &benchmarks,
        &engine_config.retry,
        concurrency,
        &completed_keys,
        &cancellation,
        &sink_dyn,
    )
    .await;

    checkpoint = sink.checkpoint.lock().clone();
    completed_keys.extend(membench_durability::completed_keys(&checkpoint));

    if let Err(err) = exec_result {
        bail!("execution halted: {err}");
    }

    let results = sink.collected.lock().clone();
    let summary = membench_durability::build_summary(&run_id, &results, plan.skipped_count);
    writer.write_summary(&summary).context("failed to write metrics summary")?;

    drop(sink_dyn);
    drop(sink);
    let writer = Arc::try_unwrap(writer)
        .unwrap_or_else(|_| panic!("results writer still has outstanding references after execution"));
    writer.close().await.context("failed to close results writer")?;

    render(&args.format, &run_id, &plan, &summary);
    Ok(())
}

fn register_benchmark(registry: &BenchmarkRegistry, path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading manifest {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw).with_context(|| format!("parsing manifest {}", path.display()))?;
    let mut manifest: BenchmarkManifest =
        serde_json::from_value(value.clone()).with_context(|| format!("parsing manifest {}", path.display()))?;

    if manifest.data_file.is_relative() {
        if let Some(parent) = path.parent() {
            manifest.data_file = parent.join(&manifest.data_file);
        }
    }

    let name = manifest.name.clone();
    let version = manifest.version.clone();
    let benchmark = ManifestBenchmark::from_manifest(manifest, None)
        .with_context(|| format!("building benchmark from {}", path.display()))?;

    registry.register(&name, &version, &value, Arc::new(benchmark));
    Ok(name)
}

type StartOutcome = (String, Checkpoint, std::collections::HashSet<String>, membench_core::RunPlan);

async fn start_run(
    runs_root: &Path,
    selection: &Selection,
    providers: &ProviderRegistry,
    benchmarks: &BenchmarkRegistry,
) -> Result<StartOutcome> {
    let plan = membench_plan::build_run_plan(selection, providers, benchmarks).await?;
    let total_cases = total_eligible_cases(&plan, benchmarks);
    let run_dir = runs_root.join(&plan.run_id);
    let checkpoint = membench_durability::create(&run_dir, &plan.run_id, selection, total_cases)?;
    Ok((plan.run_id.clone(), checkpoint, std::collections::HashSet::new(), plan))
}

async fn resume_run(
    runs_root: &Path,
    resume_id: &str,
    selection: &Selection,
    providers: &ProviderRegistry,
    benchmarks: &BenchmarkRegistry,
) -> Result<StartOutcome> {
    let run_dir = runs_root.join(resume_id);
    let checkpoint = match membench_durability::load(&run_dir, resume_id)? {
        LoadOutcome::NotFound => {
            let available = list_available_run_ids(runs_root);
            bail!(
                "no checkpoint found for run '{resume_id}'. Available runs (newest first): {}",
                if available.is_empty() { "none".to_string() } else { available.join(", ") }
            );
        }
        LoadOutcome::Invalid(reason) => {
            bail!("checkpoint for run '{resume_id}' is invalid ({reason}); delete {} and start a fresh run, or restore a known-good checkpoint", run_dir.join("checkpoint.json").display());
        }
        LoadOutcome::Loaded(checkpoint) => checkpoint,
    };

    if checkpoint.completed_count >= checkpoint.total_cases && checkpoint.total_cases > 0 {
        bail!("run '{resume_id}' is already complete ({} / {} cases)", checkpoint.completed_count, checkpoint.total_cases);
    }

    let diff = membench_durability::validate_selections(&checkpoint, selection);
    if !diff.is_compatible() {
        bail!(
            "selection does not match the checkpointed run: missing_providers={:?} extra_providers={:?} missing_benchmarks={:?} extra_benchmarks={:?}",
            diff.missing_providers, diff.extra_providers, diff.missing_benchmarks, diff.extra_benchmarks
        );
    }

    let mut plan = membench_plan::build_run_plan(selection, providers, benchmarks).await?;
    plan.run_id = checkpoint.run_id.clone();
    plan.timestamp = checkpoint.created_at;

    let completed = membench_durability::completed_keys(&checkpoint);
    Ok((checkpoint.run_id.clone(), checkpoint, completed, plan))
}

fn total_eligible_cases(plan: &membench_core::RunPlan, benchmarks: &BenchmarkRegistry) -> usize {
    plan.eligible_entries()
        .filter_map(|entry| benchmarks.get(&entry.benchmark_name))
        .map(|entry| entry.benchmark.cases().len())
        .sum()
}

fn list_available_run_ids(runs_root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(runs_root) else {
        return vec![];
    };
    let mut dirs: Vec<(std::time::SystemTime, String)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            let name = entry.file_name().to_string_lossy().to_string();
            Some((modified, name))
        })
        .collect();
    dirs.sort_by(|a, b| b.0.cmp(&a.0));
    dirs.into_iter().map(|(_, name)| name).collect()
}

/// Forwards each completed case to the results log, advances the
/// checkpoint, and keeps an in-memory copy for the post-run summary
/// (spec.md 4.E: "executor updates checkpoint ... results writer appends").
struct DurableSink {
    writer: Arc<ResultsWriter>,
    run_dir: PathBuf,
    checkpoint: Mutex<Checkpoint>,
    collected: Mutex<Vec<RunCaseResult>>,
}

#[async_trait]
impl ResultSink for DurableSink {
    async fn record(&self, result: RunCaseResult) -> Result<(), CaseError> {
        self.writer.record(result.clone()).await?;

        let case_key = membench_exec::case_key(&result.provider_name, &result.benchmark_name, &result.case.case_id);
        {
            let mut checkpoint = self.checkpoint.lock();
            membench_durability::record_completion(&self.run_dir, &mut checkpoint, &case_key, &result.case.status.to_string())
                .map_err(CaseError::from)?;
        }

        self.collected.lock().push(result);
        Ok(())
    }
}

fn render(format: &str, run_id: &str, plan: &membench_core::RunPlan, summary: &MetricsSummary) {
    if format == "json" {
        let payload = serde_json::json!({
            "run_id": run_id,
            "plan": plan,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
        return;
    }

    println!("Run {run_id}");
    println!("  eligible entries: {}  skipped: {}", plan.eligible_count, plan.skipped_count);
    for entry in &plan.entries {
        if !entry.eligible {
            if let Some(reason) = &entry.skip_reason {
                println!("  SKIP {} x {}: {}", entry.provider_name, entry.benchmark_name, reason.message);
            }
        }
    }
    println!(
        "Totals: cases={} passed={} failed={} skipped={} errors={} duration_ms={}",
        summary.totals.cases,
        summary.totals.passed,
        summary.totals.failed,
        summary.totals.skipped,
        summary.totals.errors,
        summary.total_duration_ms
    );
    for combo in &summary.combinations {
        println!(
            "  {} x {}: {}/{} passed ({} ms)",
            combo.provider, combo.benchmark, combo.counts.passed, combo.counts.cases, combo.duration_ms
        );
    }
}
