//! Canonical-JSON SHA-256, used to derive each registry entry's `manifest_hash`.

use sha2::{Digest, Sha256};

/// Recursively sort object keys so two structurally-equal values with
/// differently-ordered maps hash identically.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

/// SHA-256 hex digest of `value`'s canonical-JSON serialization.
pub fn manifest_hash(value: &serde_json::Value) -> String {
    let canonical = canonicalize(value);
    let bytes = serde_json::to_vec(&canonical).expect("canonical value always serializes");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"name": "mem0", "version": "1.0"});
        let b = json!({"version": "1.0", "name": "mem0"});
        assert_eq!(manifest_hash(&a), manifest_hash(&b));
    }

    #[test]
    fn different_content_differs() {
        let a = json!({"name": "mem0"});
        let b = json!({"name": "mem1"});
        assert_ne!(manifest_hash(&a), manifest_hash(&b));
    }
}
