//! Helpers for the free-form JSON portions of configuration blobs

use serde_json::{Map, Value};

/// Replace every occurrence of `from` with `to` inside string values,
/// recursing through arrays and objects. Keys are left alone.
///
/// Returns true if anything changed.
pub fn replace_in_value(value: &mut Value, from: &str, to: &str) -> bool {
    if from.is_empty() {
        return false;
    }

    match value {
        Value::String(s) => {
            if s.contains(from) {
                *s = s.replace(from, to);
                true
            } else {
                false
            }
        }
        Value::Array(items) => {
            let mut changed = false;
            for item in items.iter_mut() {
                changed |= replace_in_value(item, from, to);
            }
            changed
        }
        Value::Object(map) => replace_in_map(map, from, to),
        _ => false,
    }
}

/// Map variant of [`replace_in_value`]
pub fn replace_in_map(map: &mut Map<String, Value>, from: &str, to: &str) -> bool {
    let mut changed = false;
    for value in map.values_mut() {
        changed |= replace_in_value(value, from, to);
    }
    changed
}
