//! Ingestion strategies (spec.md 4.B).

mod session_based;
mod simple;

pub use session_based::{derive_relevant_ids, SessionBasedIngestion};
pub use simple::SimpleIngestion;

use crate::error::BenchError;
use crate::manifest::IngestionConfig;
use async_trait::async_trait;
use membench_core::{BenchmarkCase, Provider, ScopeContext};
use std::sync::Arc;

/// The policy for turning a case's input into one or more `add_memory`
/// calls. Always returns every id it managed to ingest before the first
/// error alongside the outcome, so a caller can clean up partial writes
/// even when ingestion fails partway through a multi-write case
/// (spec.md 3, 9: cleanup runs "whether the case returns normally,
/// throws, or is classified as permanent failure").
#[async_trait]
pub trait Ingestion: Send + Sync {
    async fn ingest(
        &self,
        provider: &Arc<dyn Provider>,
        scope: &ScopeContext,
        case: &BenchmarkCase,
    ) -> (Vec<String>, Result<(), BenchError>);
}

pub fn build_ingestion(config: &IngestionConfig) -> Result<Box<dyn Ingestion>, BenchError> {
    match config {
        IngestionConfig::Simple {
            content_field,
            is_array,
            metadata_fields,
        } => Ok(Box::new(SimpleIngestion {
            content_field: content_field.clone(),
            is_array: *is_array,
            metadata_fields: metadata_fields.clone(),
        })),
        IngestionConfig::SessionBased {
            sessions_field,
            format,
            mode,
            session_key_prefix,
            date_key_suffix,
            evidence_field,
            evidence_parser,
            answer_sessions_field,
            shared_sample_size,
        } => Ok(Box::new(SessionBasedIngestion {
            sessions_field: sessions_field.clone(),
            format: *format,
            mode: *mode,
            session_key_prefix: session_key_prefix.clone(),
            date_key_suffix: date_key_suffix.clone(),
            evidence_field: evidence_field.clone(),
            evidence_parser: evidence_parser.clone(),
            answer_sessions_field: answer_sessions_field.clone(),
            shared_sample_size: *shared_sample_size,
        })),
        IngestionConfig::AddDeleteVerify {} => {
            Err(BenchError::UnsupportedIngestionStrategy("add-delete-verify".into()))
        }
    }
}
