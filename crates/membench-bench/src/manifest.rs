//! Benchmark manifest schema and validation (spec.md 4.B, 6).

use crate::error::BenchError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkManifest {
    pub manifest_version: String,
    pub name: String,
    pub version: String,
    pub data_file: PathBuf,
    #[serde(default)]
    pub flatten: Option<FlattenConfig>,
    pub ingestion: IngestionConfig,
    pub query: QueryConfig,
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
}

impl BenchmarkManifest {
    pub fn parse(raw: &str) -> Result<Self, BenchError> {
        let manifest: Self = serde_json::from_str(raw)
            .map_err(|e| BenchError::InvalidManifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.manifest_version != "1" {
            return Err(BenchError::InvalidManifest(format!(
                "unsupported manifest_version '{}', expected \"1\"",
                self.manifest_version
            )));
        }
        if self.name.is_empty() {
            return Err(BenchError::InvalidManifest("name must not be empty".into()));
        }
        if matches!(self.ingestion, IngestionConfig::AddDeleteVerify {}) {
            return Err(BenchError::UnsupportedIngestionStrategy(
                "add-delete-verify".into(),
            ));
        }
        if matches!(self.evaluation, EvaluationConfig::DeletionCheck {}) {
            return Err(BenchError::UnsupportedEvaluationProtocol(
                "deletion-check".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlattenConfig {
    pub field: String,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub promote_fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    pub question_field: String,
    pub expected_answer_field: String,
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,
}

fn default_retrieval_limit() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case", deny_unknown_fields)]
pub enum IngestionConfig {
    Simple {
        content_field: String,
        #[serde(default)]
        is_array: bool,
        #[serde(default)]
        metadata_fields: Vec<String>,
    },
    SessionBased {
        sessions_field: String,
        #[serde(default)]
        format: SessionFormat,
        #[serde(default)]
        mode: SessionMode,
        #[serde(default = "default_session_key_prefix")]
        session_key_prefix: String,
        #[serde(default = "default_date_key_suffix")]
        date_key_suffix: String,
        #[serde(default)]
        evidence_field: Option<String>,
        #[serde(default)]
        evidence_parser: Option<String>,
        #[serde(default)]
        answer_sessions_field: Option<String>,
        #[serde(default = "default_shared_sample_size")]
        shared_sample_size: usize,
    },
    AddDeleteVerify {},
}

fn default_session_key_prefix() -> String {
    "session_".to_string()
}

fn default_date_key_suffix() -> String {
    "_date_time".to_string()
}

fn default_shared_sample_size() -> usize {
    10
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionFormat {
    #[default]
    Array,
    DynamicKeys,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Lazy,
    Shared,
    Full,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "protocol", rename_all = "kebab-case", deny_unknown_fields)]
pub enum EvaluationConfig {
    #[serde(rename = "exact-match")]
    ExactMatch {
        #[serde(default)]
        case_sensitive: bool,
        #[serde(default = "default_true")]
        normalize_whitespace: bool,
        #[serde(default = "default_true")]
        trim: bool,
    },
    #[serde(rename = "llm-as-judge")]
    LlmAsJudge {
        #[serde(default)]
        type_instructions_file: Option<PathBuf>,
    },
    #[serde(rename = "deletion-check")]
    DeletionCheck {},
}

fn default_true() -> bool {
    true
}
