//! Stable merge sort over the interpreter's mixed-type order.
//!
//! Integer and Float compare by float promotion, strings compare
//! lexicographically, and any numeric orders before any string.

use super::value::Value;

/// `a <= b` under the mixed-type order. The caller guarantees both sides are
/// Integer, Float, or String; anything else is an interpreter invariant
/// violation and aborts.
fn leq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(left), Value::Integer(right)) => left <= right,
        (Value::Integer(left), Value::Float(right)) => *left as f64 <= *right,
        (Value::Float(left), Value::Integer(right)) => *left <= *right as f64,
        (Value::Float(left), Value::Float(right)) => left <= right,
        (Value::Str(left), Value::Str(right)) => left <= right,
        (Value::Integer(_) | Value::Float(_), Value::Str(_)) => true,
        (Value::Str(_), Value::Integer(_) | Value::Float(_)) => false,
        _ => panic!(
            "invalid type comparison: {} and {}",
            a.type_name(),
            b.type_name()
        ),
    }
}

pub fn merge_sort(values: &[Value]) -> Vec<Value> {
    if values.len() <= 1 {
        return values.to_vec();
    }

    let middle = values.len() / 2;
    let left = merge_sort(&values[..middle]);
    let right = merge_sort(&values[middle..]);

    merge(left, right)
}

fn merge(left: Vec<Value>, right: Vec<Value>) -> Vec<Value> {
    let mut result = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => {
                // `<=` keeps the left-hand run first on ties, which is what
                // makes the sort stable.
                if leq(a, b) {
                    result.push(left.next().expect("peeked above"));
                } else {
                    result.push(right.next().expect("peeked above"));
                }
            }
            (Some(_), None) => result.push(left.next().expect("peeked above")),
            (None, Some(_)) => result.push(right.next().expect("peeked above")),
            (None, None) => return result,
        }
    }
}
