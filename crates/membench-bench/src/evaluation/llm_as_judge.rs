use super::{EvaluationOutcome, EvaluationProtocol, JudgeClient};
use async_trait::async_trait;
use membench_core::RetrievalItem;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

pub struct LlmAsJudgeProtocol {
    pub judge_client: Arc<dyn JudgeClient>,
    pub type_instructions: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct JudgeResponse {
    correctness: f64,
    faithfulness: f64,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    type_specific: Option<serde_json::Value>,
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

impl LlmAsJudgeProtocol {
    fn build_prompt(
        &self,
        question: &str,
        expected: &serde_json::Value,
        generated: &str,
        retrieved: &[RetrievalItem],
        question_type: Option<&str>,
    ) -> String {
        let contexts: Vec<&str> = retrieved.iter().map(|item| item.text()).collect();
        let mut prompt = format!(
            "Question: {question}\nExpected answer: {expected}\nGenerated answer: {generated}\nRetrieved context:\n{}\n",
            contexts.join("\n---\n")
        );
        if let Some(qtype) = question_type {
            if let Some(instructions) = self.type_instructions.get(qtype) {
                prompt.push_str(&format!("\nType-specific instructions ({qtype}): {instructions}\n"));
            }
        }
        prompt.push_str("\nRespond with JSON: {\"correctness\": 0-1, \"faithfulness\": 0-1, \"reasoning\": \"...\"}");
        prompt
    }
}

#[async_trait]
impl EvaluationProtocol for LlmAsJudgeProtocol {
    async fn evaluate(
        &self,
        question: &str,
        expected: &serde_json::Value,
        generated: &str,
        retrieved: &[RetrievalItem],
        question_type: Option<&str>,
    ) -> EvaluationOutcome {
        let prompt = self.build_prompt(question, expected, generated, retrieved, question_type);

        let raw = match self.judge_client.judge(&prompt).await {
            Ok(raw) if !raw.trim().is_empty() => raw,
            _ => {
                return EvaluationOutcome {
                    judge_error: true,
                    additional: Some(serde_json::json!({"judge_error": 1})),
                    ..Default::default()
                }
            }
        };

        match serde_json::from_str::<JudgeResponse>(&raw) {
            Ok(parsed) => EvaluationOutcome {
                correctness: clamp01(parsed.correctness),
                faithfulness: clamp01(parsed.faithfulness),
                reasoning: parsed.reasoning,
                type_specific: parsed.type_specific,
                additional: None,
                judge_error: false,
            },
            Err(_) => EvaluationOutcome {
                judge_error: true,
                additional: Some(serde_json::json!({"judge_error": 1})),
                ..Default::default()
            },
        }
    }
}
