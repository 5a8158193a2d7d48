//! Ordering of children by a field value.
//!
//! Values rank by type first (missing/null, `false`, `true`, numbers,
//! strings, arrays, objects), then by value within a type. Ties fall back to
//! the child key so every ordering is total and repeatable.

use std::cmp::Ordering;

use serde_json::Value;

use crate::Child;

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(false)) => 1,
        Some(Value::Bool(true)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

/// Compares two optional field values.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    })
}

/// Sorts ascending by `field`, then by key.
pub fn sort_by_field(children: &mut [Child], field: &str) {
    children.sort_by(|a, b| {
        compare_values(a.value.get(field), b.value.get(field)).then_with(|| a.key.cmp(&b.key))
    });
}
