//! Retrieval-metric computation: precision, recall, F1, coverage@K, nDCG@K,
//! MAP (spec.md 4.B).

use membench_core::RetrievalItem;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static SESSION_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"=== Session: (\S+) ===").unwrap());

/// Default retrieval-metric ID extractor: pull the session label out of a
/// `=== Session: <id> ===` header, falling back to the underlying record id.
pub fn extract_id(item: &RetrievalItem) -> String {
    match SESSION_HEADER.captures(item.text()) {
        Some(caps) => caps[1].to_string(),
        None => item.record.id.clone(),
    }
}

fn dedup_preserve_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        if seen.insert(id.clone()) {
            out.push(id.clone());
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct RetrievalMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub coverage_at_k: f64,
    pub ndcg_at_k: f64,
    pub map: f64,
}

/// Compute retrieval metrics over `retrieved` against the case's
/// declared-relevant ids, all over deduplicated retrieved ids (spec.md 4.B).
pub fn compute(retrieved: &[RetrievalItem], relevant_ids: &[String], k: usize) -> RetrievalMetrics {
    if relevant_ids.is_empty() {
        return RetrievalMetrics::default();
    }
    let relevant: HashSet<&str> = relevant_ids.iter().map(String::as_str).collect();
    let retrieved_ids: Vec<String> = retrieved.iter().map(extract_id).collect();
    let dedup_ids = dedup_preserve_order(&retrieved_ids);

    let relevant_retrieved: Vec<&String> = dedup_ids.iter().filter(|id| relevant.contains(id.as_str())).collect();

    let precision = if retrieved.is_empty() {
        0.0
    } else {
        relevant_retrieved.len() as f64 / retrieved.len() as f64
    };
    let recall = relevant_retrieved.len() as f64 / relevant_ids.len() as f64;
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    let top_k: Vec<&String> = dedup_ids.iter().take(k).collect();
    let covered_at_k: HashSet<&str> = top_k
        .iter()
        .filter(|id| relevant.contains(id.as_str()))
        .map(|id| id.as_str())
        .collect();
    let coverage_at_k = covered_at_k.len() as f64 / relevant_ids.len() as f64;

    let dcg: f64 = top_k
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let rel = if relevant.contains(id.as_str()) { 1.0 } else { 0.0 };
            rel / (i as f64 + 2.0).log2()
        })
        .sum();
    let idcg: f64 = (0..std::cmp::min(k, relevant_ids.len()))
        .map(|i| 1.0 / (i as f64 + 2.0).log2())
        .sum();
    let ndcg_at_k = if idcg > 0.0 { dcg / idcg } else { 0.0 };

    let mut hits = 0usize;
    let mut precision_sum = 0.0;
    for (i, id) in dedup_ids.iter().enumerate() {
        if relevant.contains(id.as_str()) {
            hits += 1;
            precision_sum += hits as f64 / (i as f64 + 1.0);
        }
    }
    let map = precision_sum / relevant_ids.len() as f64;

    RetrievalMetrics {
        precision,
        recall,
        f1,
        coverage_at_k,
        ndcg_at_k,
        map,
    }
}
