pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod factory;
pub mod ingestion;
pub mod manifest;
pub mod retrieval_metrics;

pub use error::BenchError;
pub use evaluation::{AnswerSynthesizer, EvaluationOutcome, EvaluationProtocol, JudgeClient};
pub use factory::{JudgeDependencies, ManifestBenchmark};
pub use manifest::BenchmarkManifest;
