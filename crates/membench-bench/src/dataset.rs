//! Data file loading and case enumeration (spec.md 4.B, 6).

use crate::error::BenchError;
use crate::manifest::{BenchmarkManifest, FlattenConfig};
use membench_core::BenchmarkCase;
use std::path::Path;

/// Load a JSON array or JSONL data file into raw records.
pub fn load_records(path: &Path) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, BenchError> {
    let raw = std::fs::read_to_string(path).map_err(|source| BenchError::DataFileRead {
        path: path.display().to_string(),
        source,
    })?;
    let trimmed = raw.trim_start();

    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(&raw).map_err(|source| BenchError::DataFileParse {
                path: path.display().to_string(),
                source,
            })?;
        values
            .into_iter()
            .map(|v| as_object(v, path))
            .collect::<Result<Vec<_>, _>>()
    } else {
        trimmed
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let value: serde_json::Value =
                    serde_json::from_str(line).map_err(|source| BenchError::DataFileParse {
                        path: path.display().to_string(),
                        source,
                    })?;
                as_object(value, path)
            })
            .collect()
    }
}

fn as_object(
    value: serde_json::Value,
    path: &Path,
) -> Result<serde_json::Map<String, serde_json::Value>, BenchError> {
    value.as_object().cloned().ok_or_else(|| BenchError::MalformedField {
        field: path.display().to_string(),
        reason: "each record must be a JSON object".to_string(),
    })
}

fn record_id(record: &serde_json::Map<String, serde_json::Value>, index: usize) -> String {
    record
        .get("id")
        .or_else(|| record.get("question_id"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("case_{index}"))
}

/// Build `BenchmarkCase`s from raw records, applying `flatten` if configured
/// (spec.md 4.B "case enumeration").
pub fn build_cases(
    records: Vec<serde_json::Map<String, serde_json::Value>>,
    manifest: &BenchmarkManifest,
) -> Vec<BenchmarkCase> {
    let mut cases = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        let parent_id = record_id(&record, index);
        match &manifest.flatten {
            Some(flatten) => cases.extend(flatten_record(&parent_id, &record, flatten, manifest)),
            None => cases.push(to_case(parent_id, record, manifest)),
        }
    }
    cases
}

fn flatten_record(
    parent_id: &str,
    record: &serde_json::Map<String, serde_json::Value>,
    flatten: &FlattenConfig,
    manifest: &BenchmarkManifest,
) -> Vec<BenchmarkCase> {
    let items = match record.get(&flatten.field).and_then(|v| v.as_array()) {
        Some(items) => items.clone(),
        None => return Vec::new(),
    };
    let limit = flatten.max_items.unwrap_or(items.len());

    items
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, item)| {
            let mut child = item.as_object().cloned().unwrap_or_default();
            for field in &flatten.promote_fields {
                if !child.contains_key(field) {
                    if let Some(value) = record.get(field) {
                        child.insert(field.clone(), value.clone());
                    }
                }
            }
            let id = format!("{parent_id}_q{i}");
            to_case(id, child, manifest)
        })
        .collect()
}

fn to_case(
    id: String,
    record: serde_json::Map<String, serde_json::Value>,
    manifest: &BenchmarkManifest,
) -> BenchmarkCase {
    let expected = record
        .get(&manifest.query.expected_answer_field)
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    let description = record
        .get(&manifest.query.question_field)
        .and_then(|v| v.as_str())
        .map(str::to_string);

    BenchmarkCase {
        id,
        description,
        input: record,
        expected,
        metadata: None,
    }
}
