//! # Structural Equality
//!
//! Equality used by `enum`, `const` and `uniqueItems`: same kind and same
//! contents, arrays compared in order, objects compared as unordered maps,
//! numbers compared by value.

use std::cmp::Ordering;

use serde_json::Value;

use crate::numeric::compare_numbers;

/// Returns true if two values are structurally equal.
pub fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Ordering::Equal,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => false,
    }
}

/// Index pair of the first two structurally-equal elements, if any.
pub fn find_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (i, left) in items.iter().enumerate() {
        for (offset, right) in items[i + 1..].iter().enumerate() {
            if json_equal(left, right) {
                return Some((i, i + 1 + offset));
            }
        }
    }
    None
}
