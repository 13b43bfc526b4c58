//! Evaluation protocols (spec.md 4.B).

mod exact_match;
mod llm_as_judge;

pub use exact_match::ExactMatchProtocol;
pub use llm_as_judge::LlmAsJudgeProtocol;

use crate::error::BenchError;
use async_trait::async_trait;
use membench_core::RetrievalItem;

/// The result of scoring one case: `(correctness, faithfulness, reasoning,
/// type_specific?, additional?)` per spec.md 4.B step 4.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    pub correctness: f64,
    pub faithfulness: f64,
    pub reasoning: Option<String>,
    pub type_specific: Option<serde_json::Value>,
    pub additional: Option<serde_json::Value>,
    pub judge_error: bool,
}

#[async_trait]
pub trait EvaluationProtocol: Send + Sync {
    async fn evaluate(
        &self,
        question: &str,
        expected: &serde_json::Value,
        generated: &str,
        retrieved: &[RetrievalItem],
        question_type: Option<&str>,
    ) -> EvaluationOutcome;
}

/// External answer synthesizer, invoked for `llm-as-judge` over the top-K
/// retrieved contexts (spec.md 1, 4.B step 3). An out-of-scope collaborator;
/// the engine only consumes this trait.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(&self, question: &str, contexts: &[String]) -> Result<String, BenchError>;
}

/// External LLM judge client, invoked by `llm-as-judge` (spec.md 1). Returns
/// the raw text response for the protocol to parse.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn judge(&self, prompt: &str) -> Result<String, BenchError>;
}

pub fn top_n_contexts(retrieved: &[RetrievalItem], n: usize) -> Vec<String> {
    retrieved.iter().take(n).map(|item| item.text().to_string()).collect()
}
