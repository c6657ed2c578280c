//! Deep merge of JSON objects

use serde_json::Value;

/// Merge `source` into `target`.
///
/// Objects present on both sides are merged recursively; any other value
/// from `source` (including arrays and `null`) replaces the target's.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                if let Some(target_value) = target_map.get_mut(key) {
                    if target_value.is_object() && source_value.is_object() {
                        deep_merge(target_value, source_value);
                        continue;
                    }
                }
                target_map.insert(key.clone(), source_value.clone());
            }
        }
        (target, source) => *target = source.clone(),
    }
}
