use super::Ingestion;
use crate::error::BenchError;
use crate::manifest::{IngestionConfig, SessionFormat, SessionMode};
use async_trait::async_trait;
use membench_core::{BenchmarkCase, Provider, ScopeContext};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

static EVIDENCE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)D(\d+)").unwrap());

/// Parse evidence strings like `"D2:5"` into session numbers (spec.md 4.B
/// "evidence references parsed as `D\d+` prefixes").
pub fn parse_dialog_refs(evidence: &[String]) -> Vec<usize> {
    let mut numbers: Vec<usize> = evidence
        .iter()
        .filter_map(|s| EVIDENCE_REF.captures(s))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .collect();
    numbers.sort_unstable();
    numbers.dedup();
    numbers
}

struct Session {
    number: usize,
    date: Option<String>,
    turns: Vec<(String, String)>,
}

fn parse_turns(value: Option<&serde_json::Value>) -> Vec<(String, String)> {
    let Some(array) = value.and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    array
        .iter()
        .filter_map(|turn| {
            let obj = turn.as_object()?;
            let speaker = obj
                .get("speaker_a")
                .or_else(|| obj.get("speaker"))
                .and_then(|v| v.as_str())
                .unwrap_or("user")
                .to_string();
            let text = obj.get("text").and_then(|v| v.as_str()).unwrap_or("").to_string();
            Some((speaker, text))
        })
        .collect()
}

pub struct SessionBasedIngestion {
    pub sessions_field: String,
    pub format: SessionFormat,
    pub mode: SessionMode,
    pub session_key_prefix: String,
    pub date_key_suffix: String,
    pub evidence_field: Option<String>,
    pub evidence_parser: Option<String>,
    pub answer_sessions_field: Option<String>,
    pub shared_sample_size: usize,
}

impl SessionBasedIngestion {
    fn load_sessions(&self, case: &BenchmarkCase) -> Vec<Session> {
        match self.format {
            SessionFormat::Array => self.load_array_sessions(case),
            SessionFormat::DynamicKeys => self.load_dynamic_key_sessions(case),
        }
    }

    fn load_array_sessions(&self, case: &BenchmarkCase) -> Vec<Session> {
        let Some(array) = case.input.get(&self.sessions_field).and_then(|v| v.as_array()) else {
            return Vec::new();
        };
        array
            .iter()
            .enumerate()
            .map(|(i, element)| {
                let number = i + 1;
                if let Some(obj) = element.as_object() {
                    Session {
                        number,
                        date: obj.get("date").and_then(|v| v.as_str()).map(str::to_string),
                        turns: parse_turns(obj.get("turns").or(Some(element))),
                    }
                } else {
                    Session {
                        number,
                        date: None,
                        turns: parse_turns(Some(element)),
                    }
                }
            })
            .collect()
    }

    fn load_dynamic_key_sessions(&self, case: &BenchmarkCase) -> Vec<Session> {
        let key_pattern = Regex::new(&format!("^{}(\\d+)$", regex::escape(&self.session_key_prefix))).unwrap();
        let mut sessions: Vec<Session> = case
            .input
            .keys()
            .filter_map(|key| key_pattern.captures(key).map(|caps| (key.clone(), caps)))
            .filter_map(|(key, caps)| {
                let number: usize = caps.get(1)?.as_str().parse().ok()?;
                let content = case.input.get(&key);
                let date_key = format!("{}{}{}", self.session_key_prefix, number, self.date_key_suffix);
                let date = case.input.get(&date_key).and_then(|v| v.as_str()).map(str::to_string);
                let turns = match content.and_then(|v| v.as_object()) {
                    Some(obj) => parse_turns(obj.get("turns").or(content)),
                    None => parse_turns(content),
                };
                Some(Session { number, date, turns })
            })
            .collect();
        sessions.sort_by_key(|s| s.number);
        sessions
    }

    pub(crate) fn answer_session_numbers(&self, case: &BenchmarkCase) -> Vec<usize> {
        if let Some(field) = &self.answer_sessions_field {
            if let Some(array) = case.input.get(field).and_then(|v| v.as_array()) {
                let mut numbers: Vec<usize> = array
                    .iter()
                    .filter_map(|v| match v {
                        serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
                        serde_json::Value::String(s) => EVIDENCE_REF
                            .captures(s)
                            .and_then(|c| c.get(1)?.as_str().parse().ok())
                            .or_else(|| s.parse().ok()),
                        _ => None,
                    })
                    .collect();
                numbers.sort_unstable();
                numbers.dedup();
                return numbers;
            }
        }
        if let Some(field) = &self.evidence_field {
            if self.evidence_parser.as_deref() == Some("dialog_refs") || self.evidence_parser.is_none() {
                if let Some(array) = case.input.get(field).and_then(|v| v.as_array()) {
                    let refs: Vec<String> = array.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
                    return parse_dialog_refs(&refs);
                }
            }
        }
        Vec::new()
    }

    fn select_sessions<'a>(&self, sessions: &'a [Session], answer_numbers: &[usize]) -> Vec<&'a Session> {
        match self.mode {
            SessionMode::Full => sessions.iter().collect(),
            SessionMode::Lazy => {
                if answer_numbers.is_empty() {
                    sessions.iter().take(1).collect()
                } else {
                    sessions
                        .iter()
                        .filter(|s| answer_numbers.contains(&s.number))
                        .collect()
                }
            }
            SessionMode::Shared => {
                let target = std::cmp::max(self.shared_sample_size.saturating_sub(answer_numbers.len()), 5);
                let mut selected_numbers: Vec<usize> = answer_numbers.to_vec();
                let total = sessions.len();
                if total > 0 && target > 0 {
                    let step = std::cmp::max(1, total / target);
                    let mut i = 0;
                    while i < total && selected_numbers.len() < target + answer_numbers.len() {
                        selected_numbers.push(sessions[i].number);
                        i += step;
                    }
                }
                selected_numbers.sort_unstable();
                selected_numbers.dedup();
                sessions
                    .iter()
                    .filter(|s| selected_numbers.contains(&s.number))
                    .collect()
            }
        }
    }

    fn format_session(session: &Session) -> String {
        let mut content = match &session.date {
            Some(date) => format!("=== Session: D{} ({date}) ===\n", session.number),
            None => format!("=== Session: D{} ===\n", session.number),
        };
        for (speaker, text) in &session.turns {
            content.push_str(&format!("{speaker}: {text}\n"));
        }
        content
    }
}

#[async_trait]
impl Ingestion for SessionBasedIngestion {
    async fn ingest(
        &self,
        provider: &Arc<dyn Provider>,
        scope: &ScopeContext,
        case: &BenchmarkCase,
    ) -> (Vec<String>, Result<(), BenchError>) {
        let sessions = self.load_sessions(case);
        let answer_numbers = self.answer_session_numbers(case);
        let selected = self.select_sessions(&sessions, &answer_numbers);

        let mut ids = Vec::with_capacity(selected.len());
        for session in selected {
            let content = Self::format_session(session);
            let mut metadata = HashMap::new();
            metadata.insert("session_id".to_string(), serde_json::json!(format!("D{}", session.number)));
            match provider.add_memory(scope, &content, Some(metadata)).await {
                Ok(record) => ids.push(record.id),
                Err(e) => return (ids, Err(BenchError::provider("add_memory", e.message))),
            }
        }

        let capabilities = provider.get_capabilities().await;
        if let Some(wait_ms) = capabilities.system_flags.convergence_wait_ms {
            tokio::time::sleep(std::time::Duration::from_millis(wait_ms)).await;
        }

        (ids, Ok(()))
    }
}

/// Derive a case's relevant document ids for retrieval-metric scoring, by
/// reusing a session-based ingestion config's evidence/answer-session
/// resolution (spec.md 4.B step 5). Other ingestion strategies have no
/// notion of relevant ids and yield an empty list.
pub fn derive_relevant_ids(config: &IngestionConfig, case: &BenchmarkCase) -> Vec<String> {
    let IngestionConfig::SessionBased {
        evidence_field,
        evidence_parser,
        answer_sessions_field,
        ..
    } = config
    else {
        return Vec::new();
    };

    let extractor = SessionBasedIngestion {
        sessions_field: String::new(),
        format: SessionFormat::Array,
        mode: SessionMode::Full,
        session_key_prefix: String::new(),
        date_key_suffix: String::new(),
        evidence_field: evidence_field.clone(),
        evidence_parser: evidence_parser.clone(),
        answer_sessions_field: answer_sessions_field.clone(),
        shared_sample_size: 0,
    };
    extractor
        .answer_session_numbers(case)
        .into_iter()
        .map(|n| format!("D{n}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dialog_refs_from_evidence() {
        let refs = vec!["D2:5".to_string(), "D2:7".to_string(), "D4:1".to_string()];
        assert_eq!(parse_dialog_refs(&refs), vec![2, 4]);
    }

    fn case_with_dynamic_sessions() -> BenchmarkCase {
        let input = serde_json::from_str(
            r#"{
                "evidence": ["D2:5"],
                "session_1": {"turns": [{"speaker": "user", "text": "hi"}]},
                "session_1_date_time": "2024-01-01",
                "session_2": {"turns": [{"speaker": "user", "text": "my dog is Max"}]},
                "session_2_date_time": "2024-01-02",
                "session_3": {"turns": [{"speaker": "user", "text": "bye"}]},
                "session_3_date_time": "2024-01-03"
            }"#,
        )
        .unwrap();
        BenchmarkCase {
            id: "case-1".into(),
            description: None,
            input,
            expected: serde_json::Value::Null,
            metadata: None,
        }
    }

    #[test]
    fn lazy_mode_selects_only_answer_session() {
        let case = case_with_dynamic_sessions();
        let ingestion = SessionBasedIngestion {
            sessions_field: "sessions".into(),
            format: SessionFormat::DynamicKeys,
            mode: SessionMode::Lazy,
            session_key_prefix: "session_".into(),
            date_key_suffix: "_date_time".into(),
            evidence_field: Some("evidence".into()),
            evidence_parser: Some("dialog_refs".into()),
            answer_sessions_field: None,
            shared_sample_size: 10,
        };
        let sessions = ingestion.load_sessions(&case);
        assert_eq!(sessions.len(), 3);
        let answers = ingestion.answer_session_numbers(&case);
        assert_eq!(answers, vec![2]);
        let selected = ingestion.select_sessions(&sessions, &answers);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].number, 2);
    }

    #[test]
    fn full_mode_selects_all_sessions() {
        let case = case_with_dynamic_sessions();
        let ingestion = SessionBasedIngestion {
            sessions_field: "sessions".into(),
            format: SessionFormat::DynamicKeys,
            mode: SessionMode::Full,
            session_key_prefix: "session_".into(),
            date_key_suffix: "_date_time".into(),
            evidence_field: Some("evidence".into()),
            evidence_parser: Some("dialog_refs".into()),
            answer_sessions_field: None,
            shared_sample_size: 10,
        };
        let sessions = ingestion.load_sessions(&case);
        let answers = ingestion.answer_session_numbers(&case);
        assert_eq!(ingestion.select_sessions(&sessions, &answers).len(), 3);
    }
}
