//! Stable serialization of JSON values.
//!
//! Two logically equal values always produce byte-identical text, whatever
//! order their object keys were inserted in:
//!
//! - scalars (`null`, booleans, numbers, strings) use plain JSON encoding
//! - arrays keep element order: `[a,b,c]`
//! - objects emit `"key":value` pairs sorted by key: `{"a":1,"b":2}`
//!
//! Keys are compared by UTF-16 code units, the order JSON producers in the
//! rest of the portal sort by. It only differs from byte order for keys that
//! mix supplementary-plane characters with U+E000..U+FFFF.

use std::cmp::Ordering;

use serde_json::Value;

use bmo_contracts::error::{BmoError, BmoResult};
pub use bmo_contracts::limits::DEFAULT_MAX_DEPTH;

/// Serialize `value` without a depth limit.
///
/// Used for flat inputs such as event fields and for re-checking stored
/// anchors. `serde_json::Value` cannot be cyclic, so this always terminates.
pub fn stable_serialize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Serialize `value`, failing once nesting exceeds `max_depth`.
///
/// A scalar is depth 0; each enclosing array or object adds one.
pub fn stable_serialize_bounded(value: &Value, max_depth: usize) -> BmoResult<String> {
    if exceeds_depth(value, max_depth) {
        return Err(BmoError::Serialization {
            reason: format!("payload nesting exceeds maximum depth of {max_depth}"),
        });
    }
    Ok(stable_serialize(value))
}

/// True when `value` nests deeper than `budget`. Stops descending as soon as
/// the budget is spent.
fn exceeds_depth(value: &Value, budget: usize) -> bool {
    match value {
        Value::Array(items) => budget == 0 || items.iter().any(|v| exceeds_depth(v, budget - 1)),
        Value::Object(map) => budget == 0 || map.values().any(|v| exceeds_depth(v, budget - 1)),
        _ => false,
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| utf16_cmp(a, b));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
        // `Value`'s Display is its compact JSON encoding.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}
