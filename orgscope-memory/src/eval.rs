//! Filter evaluation and value ordering over JSON records.

use std::cmp::Ordering;

use orgscope_core::{Condition, Filter, OrderBy, Record, SortOrder, TextMatch};
use serde_json::Value;

/// True when `record` satisfies `filter`. Missing fields read as `null`.
pub fn matches(filter: &Filter, record: &Record) -> bool {
    match filter {
        Filter::All => true,
        Filter::Field { field, condition } => {
            check(condition, record.get(field).unwrap_or(&Value::Null))
        }
        Filter::And(parts) => parts.iter().all(|p| matches(p, record)),
        Filter::Or(parts) => parts.iter().any(|p| matches(p, record)),
        Filter::Not(inner) => !matches(inner, record),
    }
}

fn check(condition: &Condition, value: &Value) -> bool {
    match condition {
        Condition::Equals(expected) => values_equal(value, expected),
        Condition::NotEquals(expected) => !values_equal(value, expected),
        Condition::In(options) => options.iter().any(|o| values_equal(value, o)),
        Condition::NotIn(options) => !options.iter().any(|o| values_equal(value, o)),
        Condition::Lt(bound) => compare(value, bound) == Some(Ordering::Less),
        Condition::Lte(bound) => matches!(
            compare(value, bound),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Condition::Gt(bound) => compare(value, bound) == Some(Ordering::Greater),
        Condition::Gte(bound) => matches!(
            compare(value, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Condition::Contains(m) => text(value, m, |hay, needle| hay.contains(needle)),
        Condition::StartsWith(m) => text(value, m, |hay, needle| hay.starts_with(needle)),
        Condition::EndsWith(m) => text(value, m, |hay, needle| hay.ends_with(needle)),
    }
}

fn text(value: &Value, m: &TextMatch, op: impl Fn(&str, &str) -> bool) -> bool {
    let Value::String(hay) = value else {
        return false;
    };
    if m.insensitive {
        op(&hay.to_lowercase(), &m.needle.to_lowercase())
    } else {
        op(hay, &m.needle)
    }
}

/// Equality with numbers compared by value (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering between two values of the same kind; `None` across kinds.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Stable sort by `order_by`; nulls sort first ascending, last descending.
pub fn sort_records(records: &mut [&Record], order_by: &[OrderBy]) {
    if order_by.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        for key in order_by {
            let x = a.get(&key.field).unwrap_or(&Value::Null);
            let y = b.get(&key.field).unwrap_or(&Value::Null);
            let ord = match (x.is_null(), y.is_null()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => compare(x, y).unwrap_or(Ordering::Equal),
            };
            let ord = match key.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}
