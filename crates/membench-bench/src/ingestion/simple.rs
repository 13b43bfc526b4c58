use super::Ingestion;
use crate::error::BenchError;
use async_trait::async_trait;
use membench_core::{BenchmarkCase, Provider, ScopeContext};
use std::collections::HashMap;
use std::sync::Arc;

pub struct SimpleIngestion {
    pub content_field: String,
    pub is_array: bool,
    pub metadata_fields: Vec<String>,
}

impl SimpleIngestion {
    fn metadata_for(&self, case: &BenchmarkCase) -> Option<HashMap<String, serde_json::Value>> {
        if self.metadata_fields.is_empty() {
            return None;
        }
        let mut metadata = HashMap::new();
        for field in &self.metadata_fields {
            if let Some(value) = case.input.get(field) {
                metadata.insert(field.clone(), value.clone());
            }
        }
        Some(metadata)
    }
}

#[async_trait]
impl Ingestion for SimpleIngestion {
    async fn ingest(
        &self,
        provider: &Arc<dyn Provider>,
        scope: &ScopeContext,
        case: &BenchmarkCase,
    ) -> (Vec<String>, Result<(), BenchError>) {
        let metadata = self.metadata_for(case);
        let value = match case.input.get(&self.content_field) {
            Some(value) => value,
            None => {
                return (
                    vec![],
                    Err(BenchError::MalformedField {
                        field: self.content_field.clone(),
                        reason: "content field missing from case input".into(),
                    }),
                )
            }
        };

        let contents: Vec<String> = if self.is_array {
            match value.as_array() {
                Some(array) => array.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
                None => {
                    return (
                        vec![],
                        Err(BenchError::MalformedField {
                            field: self.content_field.clone(),
                            reason: "expected an array because is_array=true".into(),
                        }),
                    )
                }
            }
        } else {
            match value.as_str() {
                Some(s) => vec![s.to_string()],
                None => {
                    return (
                        vec![],
                        Err(BenchError::MalformedField {
                            field: self.content_field.clone(),
                            reason: "expected a string".into(),
                        }),
                    )
                }
            }
        };

        let mut ids = Vec::with_capacity(contents.len());
        for content in contents {
            match provider.add_memory(scope, &content, metadata.clone()).await {
                Ok(record) => ids.push(record.id),
                Err(e) => return (ids, Err(BenchError::provider("add_memory", e.message))),
            }
        }
        (ids, Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membench_core::{CaseError, MemoryRecord, ProviderCapabilities, ProviderResult, RetrievalItem};
    use parking_lot::Mutex;

    struct RecordingProvider {
        added: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn add_memory(
            &self,
            _scope: &ScopeContext,
            content: &str,
            _metadata: Option<HashMap<String, serde_json::Value>>,
        ) -> ProviderResult<MemoryRecord> {
            self.added.lock().push(content.to_string());
            Ok(MemoryRecord::new(format!("m{}", self.added.lock().len()), content))
        }

        async fn retrieve_memory(&self, _: &ScopeContext, _: &str, _: usize) -> ProviderResult<Vec<RetrievalItem>> {
            Ok(vec![])
        }

        async fn delete_memory(&self, _: &ScopeContext, _: &str) -> ProviderResult<bool> {
            Ok(true)
        }

        async fn get_capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::default()
        }
    }

    fn _unused(_: CaseError) {}

    #[tokio::test]
    async fn ingests_single_content_field() {
        let provider: Arc<dyn Provider> = Arc::new(RecordingProvider { added: Mutex::new(vec![]) });
        let scope = ScopeContext::for_case("r1", "p", "b", "c1");
        let case = BenchmarkCase {
            id: "c1".into(),
            description: None,
            input: serde_json::from_str(r#"{"content": "Paris"}"#).unwrap(),
            expected: serde_json::Value::Null,
            metadata: None,
        };
        let ingestion = SimpleIngestion {
            content_field: "content".into(),
            is_array: false,
            metadata_fields: vec![],
        };
        let (ids, result) = ingestion.ingest(&provider, &scope, &case).await;
        result.unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn ingests_each_array_element() {
        let provider: Arc<dyn Provider> = Arc::new(RecordingProvider { added: Mutex::new(vec![]) });
        let scope = ScopeContext::for_case("r1", "p", "b", "c1");
        let case = BenchmarkCase {
            id: "c1".into(),
            description: None,
            input: serde_json::from_str(r#"{"content": ["a", "b", "c"]}"#).unwrap(),
            expected: serde_json::Value::Null,
            metadata: None,
        };
        let ingestion = SimpleIngestion {
            content_field: "content".into(),
            is_array: true,
            metadata_fields: vec![],
        };
        let (ids, result) = ingestion.ingest(&provider, &scope, &case).await;
        result.unwrap();
        assert_eq!(ids.len(), 3);
    }
}
