//! Provider-facing data: memories and retrieval results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single unit of stored memory. Opaque to the core; produced by
/// providers and only ever round-tripped, never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub context: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub timestamp: i64,
}

impl MemoryRecord {
    pub fn new(id: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context: context.into(),
            metadata: HashMap::new(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One retrieval hit: the record plus a relevance score in `[0, 1]` and an
/// optional human-readable match context (e.g. the matched session header).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalItem {
    pub record: MemoryRecord,
    pub score: f64,
    pub match_context: Option<String>,
}

impl RetrievalItem {
    pub fn new(record: MemoryRecord, score: f64) -> Self {
        Self {
            record,
            score: score.clamp(0.0, 1.0),
            match_context: None,
        }
    }

    pub fn with_match_context(mut self, match_context: impl Into<String>) -> Self {
        self.match_context = Some(match_context.into());
        self
    }

    /// The text surface used for answer synthesis and textual evaluation:
    /// the match context when present, otherwise the raw memory content.
    pub fn text(&self) -> &str {
        self.match_context.as_deref().unwrap_or(&self.record.context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_item_clamps_score() {
        let rec = MemoryRecord::new("1", "hello");
        let item = RetrievalItem::new(rec, 1.5);
        assert_eq!(item.score, 1.0);
    }

    #[test]
    fn retrieval_item_text_prefers_match_context() {
        let rec = MemoryRecord::new("1", "raw content");
        let item = RetrievalItem::new(rec, 0.5).with_match_context("=== Session: D2 ===\nhi");
        assert!(item.text().starts_with("=== Session"));
    }
}
