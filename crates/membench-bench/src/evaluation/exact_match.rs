use super::{EvaluationOutcome, EvaluationProtocol};
use async_trait::async_trait;
use membench_core::RetrievalItem;
use std::collections::HashSet;

pub struct ExactMatchProtocol {
    pub case_sensitive: bool,
    pub normalize_whitespace: bool,
    pub trim: bool,
}

impl ExactMatchProtocol {
    fn normalize(&self, input: &str) -> String {
        let mut s = input.to_string();
        if !self.case_sensitive {
            s = s.to_lowercase();
        }
        if self.normalize_whitespace {
            s = s.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        if self.trim {
            s = s.trim().to_string();
        }
        s
    }

    fn jaccard(a: &str, b: &str) -> f64 {
        let set_a: HashSet<&str> = a.split_whitespace().collect();
        let set_b: HashSet<&str> = b.split_whitespace().collect();
        if set_a.is_empty() && set_b.is_empty() {
            return 0.0;
        }
        let intersection = set_a.intersection(&set_b).count();
        let union = set_a.union(&set_b).count();
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }

    fn correctness_from_similarity(similarity: f64) -> f64 {
        if similarity >= 0.8 {
            0.7
        } else if similarity >= 0.5 {
            0.5
        } else if similarity > 0.0 {
            similarity * 0.5
        } else {
            0.0
        }
    }
}

#[async_trait]
impl EvaluationProtocol for ExactMatchProtocol {
    async fn evaluate(
        &self,
        _question: &str,
        expected: &serde_json::Value,
        generated: &str,
        retrieved: &[RetrievalItem],
        _question_type: Option<&str>,
    ) -> EvaluationOutcome {
        let expected_str = expected.as_str().unwrap_or_default();
        let expected_n = self.normalize(expected_str);
        let generated_n = self.normalize(generated);

        let is_exact_match = expected_n == generated_n;
        let is_contained = !is_exact_match && !expected_n.is_empty() && generated_n.contains(&expected_n);
        let similarity = Self::jaccard(&expected_n, &generated_n);

        let correctness = if is_exact_match {
            1.0
        } else if is_contained {
            0.9
        } else {
            Self::correctness_from_similarity(similarity)
        };

        let faithfulness = retrieved
            .iter()
            .map(|item| {
                let context_n = self.normalize(item.text());
                if !expected_n.is_empty() && context_n.contains(&expected_n) {
                    1.0
                } else {
                    Self::jaccard(&expected_n, &context_n)
                }
            })
            .fold(0.0_f64, f64::max);

        EvaluationOutcome {
            correctness,
            faithfulness,
            reasoning: None,
            type_specific: None,
            additional: Some(serde_json::json!({
                "similarity": similarity,
                "isExactMatch": is_exact_match,
                "isContained": is_contained,
            })),
            judge_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membench_core::MemoryRecord;

    fn protocol() -> ExactMatchProtocol {
        ExactMatchProtocol {
            case_sensitive: false,
            normalize_whitespace: true,
            trim: true,
        }
    }

    #[tokio::test]
    async fn exact_match_scores_perfectly() {
        let outcome = protocol()
            .evaluate(
                "What is the capital of France?",
                &serde_json::Value::String("Paris".into()),
                "Paris",
                &[RetrievalItem::new(MemoryRecord::new("1", "Paris"), 1.0)],
                None,
            )
            .await;
        assert_eq!(outcome.correctness, 1.0);
        assert_eq!(outcome.faithfulness, 1.0);
        assert!(!outcome.judge_error);
    }

    #[tokio::test]
    async fn unrelated_answer_scores_zero() {
        let outcome = protocol()
            .evaluate(
                "q",
                &serde_json::Value::String("Paris".into()),
                "completely different text with no overlap",
                &[],
                None,
            )
            .await;
        assert_eq!(outcome.correctness, 0.0);
        assert_eq!(outcome.faithfulness, 0.0);
    }

    #[tokio::test]
    async fn contained_answer_scores_point_nine() {
        let outcome = protocol()
            .evaluate(
                "q",
                &serde_json::Value::String("Paris".into()),
                "I believe the answer is Paris, the capital city",
                &[],
                None,
            )
            .await;
        assert_eq!(outcome.correctness, 0.9);
    }
}
