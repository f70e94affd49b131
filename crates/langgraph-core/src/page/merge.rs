//! Merging of paginated API response fragments.
//!
//! Rules, applied recursively:
//! - object + object: union of keys, shared keys merged
//! - array + array: concatenation (left first)
//! - equal scalars: kept
//! - anything else: `LangGraphError::MergeConflict`

use serde_json::{Map, Value};

use crate::errors::{LangGraphError, LangGraphResult};

/// Merge two continuation fragments into one payload.
pub fn merge_json(left: Value, right: Value) -> LangGraphResult<Value> {
    merge_at("$", left, right)
}

fn merge_at(path: &str, left: Value, right: Value) -> LangGraphResult<Value> {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => merge_objects(path, l, r).map(Value::Object),
        (Value::Array(mut l), Value::Array(r)) => {
            l.extend(r);
            Ok(Value::Array(l))
        }
        (l, r) if l == r => Ok(l),
        (l, r) => Err(LangGraphError::MergeConflict {
            path: path.to_string(),
            left: l.to_string(),
            right: r.to_string(),
        }),
    }
}

fn merge_objects(
    path: &str,
    mut left: Map<String, Value>,
    right: Map<String, Value>,
) -> LangGraphResult<Map<String, Value>> {
    for (key, r) in right {
        let merged = match left.remove(&key) {
            Some(l) => merge_at(&format!("{path}.{key}"), l, r)?,
            None => r,
        };
        left.insert(key, merged);
    }
    Ok(left)
}
