//! Results writer (spec.md 4.E): `writeManifest` once, `appendResult` after
//! each case, `writeSummary` after all entries, `close` drains the queue.
//!
//! Grounded on the teacher's `copilot-benchmarks::io::BenchmarkIo`
//! file-writing conventions (`write_result`/`write_combined`), adapted from
//! one-shot `File::create` writes to a single dedicated writer task
//! consuming a bounded `tokio::sync::mpsc` channel, so concurrent producers
//! under N>1 never interleave bytes within a `results.jsonl` line
//! (spec.md 9, "append serialization").

use crate::atomic::write_json_atomic;
use crate::error::DurabilityError;
use crate::manifest::RunManifest;
use crate::summary::MetricsSummary;
use async_trait::async_trait;
use membench_core::{CaseError, ResultSink, RunCaseResult};
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const QUEUE_CAPACITY: usize = 256;

enum WriterMessage {
    Result(RunCaseResult),
    Shutdown(oneshot::Sender<Result<(), String>>),
}

/// Owns the `results.jsonl` append queue and the sibling manifest/summary
/// files for one run directory.
pub struct ResultsWriter {
    run_dir: PathBuf,
    tx: mpsc::Sender<WriterMessage>,
    task: Option<JoinHandle<()>>,
}

impl ResultsWriter {
    pub async fn spawn(run_dir: PathBuf) -> Result<Self, DurabilityError> {
        tokio::fs::create_dir_all(&run_dir).await?;
        let results_path = run_dir.join("results.jsonl");
        let mut file = OpenOptions::new().create(true).append(true).open(&results_path).await?;

        let (tx, mut rx) = mpsc::channel::<WriterMessage>(QUEUE_CAPACITY);
        let task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    WriterMessage::Result(result) => {
                        if let Err(err) = append_line(&mut file, &result).await {
                            tracing::error!(error = %err, "failed to append result, writer task exiting");
                            return;
                        }
                    }
                    WriterMessage::Shutdown(ack) => {
                        let flushed = file.flush().await.map_err(|e| e.to_string());
                        let _ = ack.send(flushed);
                        return;
                    }
                }
            }
        });

        Ok(Self { run_dir, tx, task: Some(task) })
    }

    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<(), DurabilityError> {
        write_json_atomic(&self.run_dir.join("run_manifest.json"), manifest)
    }

    pub fn write_summary(&self, summary: &MetricsSummary) -> Result<(), DurabilityError> {
        write_json_atomic(&self.run_dir.join("metrics_summary.json"), summary)
    }

    /// Enqueue one result line. Mirrors `ResultSink::record` but returns the
    /// crate's own error type for callers that aren't going through the
    /// trait object.
    pub async fn append_result(&self, result: RunCaseResult) -> Result<(), DurabilityError> {
        self.tx
            .send(WriterMessage::Result(result))
            .await
            .map_err(|_| DurabilityError::WriterClosed)
    }

    /// Waits for the append queue to drain, then joins the writer task.
    pub async fn close(mut self) -> Result<(), DurabilityError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriterMessage::Shutdown(ack_tx)).await.is_ok() {
            match ack_rx.await {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => return Err(DurabilityError::Io(std::io::Error::other(reason))),
                Err(_) => {}
            }
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        Ok(())
    }
}

async fn append_line(file: &mut tokio::fs::File, result: &RunCaseResult) -> Result<(), DurabilityError> {
    let mut line = serde_json::to_string(result)?;
    line.push('\n');
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl ResultSink for ResultsWriter {
    async fn record(&self, result: RunCaseResult) -> Result<(), CaseError> {
        self.append_result(result).await.map_err(CaseError::from)
    }
}
