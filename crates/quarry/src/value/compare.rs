use crate::value::Value;
use std::cmp::Ordering;

///
/// Value ordering
///
/// Total order used by engines for multi-key sorting and by comparison
/// evaluation. Numeric variants compare cross-family (`Int(2)` ==
/// `Float(2.0)`); everything else compares within its variant, and values of
/// different variants order by rank.
///
/// Nulls sort first so ascending order puts absent values at the front.
///

/// Variant rank for cross-variant ordering.
const fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Timestamp(_) => 3,
        Value::Text(_) => 4,
        Value::Bytes(_) => 5,
        Value::Id(_) => 6,
        Value::List(_) => 7,
    }
}

#[must_use]
pub fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::Id(x), Value::Id(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => list_cmp(x, y),
        _ => match (a.as_float(), b.as_float()) {
            // cross-family numeric comparison
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

fn list_cmp(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = sort_cmp(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.len().cmp(&b.len())
}
