//! Constraint locking: merge explicit and inferred constraints behind a hash.

use crate::orchestration::value_objects::{ConstraintMap, LockedContext, NormalizedQuery};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest.
pub const CONSTRAINT_HASH_LEN: usize = 12;

/// Union of both maps. Explicit constraints win on key collision.
pub fn merge_constraints(explicit: &ConstraintMap, inferred: &ConstraintMap) -> ConstraintMap {
    let mut merged = inferred.clone();
    merged.extend(explicit.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Stable 12-hex-character digest of a constraint map.
///
/// The map is serialized as compact JSON (`,` and `:` with no spaces) with
/// keys sorted at every nesting level, so equal maps always hash equally no
/// matter how they were built. Digests are not comparable with ones taken
/// over `", "`/`": "` separated JSON.
pub fn constraint_hash(constraints: &ConstraintMap) -> String {
    let canonical = Value::Object(
        constraints
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    );
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&canonical).as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..CONSTRAINT_HASH_LEN].to_string()
}

/// Merge, hash and wrap a normalized query into its locked context.
pub fn lock_constraints(normalized: NormalizedQuery) -> LockedContext {
    let merged = merge_constraints(
        &normalized.explicit_constraints,
        &normalized.inferred_constraints,
    );
    let hash = constraint_hash(&merged);
    LockedContext {
        merged_constraints: merged,
        constraint_hash: hash,
        normalized_query: normalized,
    }
}

// serde_json may preserve insertion order, so objects are written by hand
// with sorted keys.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        Value::String(k.clone()),
                        canonical_json(&map[k.as_str()])
                    )
                })
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}
