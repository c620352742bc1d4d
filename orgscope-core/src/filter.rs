//! Query filters.
//!
//! A [`Filter`] is a tree of field constraints joined by `AND` / `OR` / `NOT`.
//! It can be built with the typed constructors or parsed from a Prisma-shaped
//! `where` object:
//!
//! ```rust
//! use orgscope_core::Filter;
//! use serde_json::json;
//!
//! let parsed = Filter::from_json(&json!({
//!     "status": { "in": ["success", "halted"] },
//!     "createdAt": { "gte": "2026-10-01T00:00:00.000Z" },
//! }))
//! .unwrap();
//! assert!(parsed.constrains_top_level("status"));
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use crate::tenant::value_kind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("unsupported operator `{operator}` on field `{field}`")]
    UnknownOperator { field: String, operator: String },

    #[error("operator `{operator}` on field `{field}` expects {expected}")]
    InvalidOperand {
        field: String,
        operator: String,
        expected: &'static str,
    },
}

/// Case handling for text operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub needle: String,
    pub insensitive: bool,
}

/// A constraint on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    NotEquals(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    Contains(TextMatch),
    StartsWith(TextMatch),
    EndsWith(TextMatch),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every record.
    #[default]
    All,
    Field {
        field: String,
        condition: Condition,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

const OPERATORS: &[&str] = &[
    "equals",
    "not",
    "in",
    "notIn",
    "lt",
    "lte",
    "gt",
    "gte",
    "contains",
    "startsWith",
    "endsWith",
    "mode",
];

impl Filter {
    pub fn all() -> Self {
        Filter::All
    }

    pub fn field(field: impl Into<String>, condition: Condition) -> Self {
        Filter::Field {
            field: field.into(),
            condition,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Condition::Equals(value.into()))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// Conjunction. `All` is the identity and nested `And`s are flattened.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), f) => {
                a.push(f);
                Filter::And(a)
            }
            (f, Filter::And(mut b)) => {
                b.insert(0, f);
                Filter::And(b)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Disjunction of `filters`. An empty disjunction matches nothing.
    pub fn any_of(filters: impl IntoIterator<Item = Filter>) -> Filter {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn negate(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    /// True when `field` is constrained by a top-level conjunct.
    pub fn constrains_top_level(&self, field: &str) -> bool {
        match self {
            Filter::Field { field: f, .. } => f == field,
            Filter::And(parts) => parts.iter().any(|p| p.constrains_top_level(field)),
            _ => false,
        }
    }

    /// Drop every top-level conjunct on `field`. Constraints nested under
    /// `OR` / `NOT` are left alone.
    pub fn without_top_level(self, field: &str) -> Filter {
        match self {
            Filter::Field { field: ref f, .. } if f == field => Filter::All,
            Filter::And(parts) => parts
                .into_iter()
                .map(|p| p.without_top_level(field))
                .fold(Filter::All, Filter::and),
            other => other,
        }
    }

    /// Parse a Prisma-shaped `where` object.
    pub fn from_json(value: &Value) -> Result<Filter, FilterError> {
        match value {
            Value::Object(map) => parse_object(map),
            Value::Null => Ok(Filter::All),
            other => Err(FilterError::NotAnObject(value_kind(other))),
        }
    }
}

impl TryFrom<Value> for Filter {
    type Error = FilterError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Filter::from_json(&value)
    }
}

fn parse_object(map: &Map<String, Value>) -> Result<Filter, FilterError> {
    let mut out = Filter::All;
    for (key, value) in map {
        let part = match key.as_str() {
            "AND" => parse_list(value, key)?.into_iter().fold(Filter::All, Filter::and),
            "OR" => Filter::Or(parse_list(value, key)?),
            "NOT" => parse_list(value, key)?
                .into_iter()
                .fold(Filter::All, Filter::and)
                .negate(),
            field => parse_field(field, value)?,
        };
        out = out.and(part);
    }
    Ok(out)
}

fn parse_list(value: &Value, combinator: &str) -> Result<Vec<Filter>, FilterError> {
    match value {
        Value::Array(items) => items.iter().map(Filter::from_json).collect(),
        Value::Object(map) => Ok(vec![parse_object(map)?]),
        _ => Err(FilterError::InvalidOperand {
            field: combinator.to_string(),
            operator: combinator.to_string(),
            expected: "an object or an array of objects",
        }),
    }
}

fn parse_field(field: &str, value: &Value) -> Result<Filter, FilterError> {
    let ops = match value {
        Value::Object(ops) => ops,
        scalar => return Ok(Filter::eq(field, scalar.clone())),
    };

    if let Some(unknown) = ops.keys().find(|k| !OPERATORS.contains(&k.as_str())) {
        return Err(FilterError::UnknownOperator {
            field: field.to_string(),
            operator: unknown.clone(),
        });
    }

    let insensitive = match ops.get("mode") {
        None => false,
        Some(Value::String(m)) if m == "insensitive" => true,
        Some(Value::String(m)) if m == "default" => false,
        Some(_) => {
            return Err(FilterError::InvalidOperand {
                field: field.to_string(),
                operator: "mode".into(),
                expected: "\"default\" or \"insensitive\"",
            })
        }
    };

    let mut out = Filter::All;
    for (op, operand) in ops {
        let condition = match op.as_str() {
            "mode" => continue,
            "equals" => Condition::Equals(operand.clone()),
            "not" => match operand {
                Value::Object(_) => {
                    out = out.and(parse_field(field, operand)?.negate());
                    continue;
                }
                scalar => Condition::NotEquals(scalar.clone()),
            },
            "in" => Condition::In(array_operand(field, op, operand)?),
            "notIn" => Condition::NotIn(array_operand(field, op, operand)?),
            "lt" => Condition::Lt(operand.clone()),
            "lte" => Condition::Lte(operand.clone()),
            "gt" => Condition::Gt(operand.clone()),
            "gte" => Condition::Gte(operand.clone()),
            "contains" => Condition::Contains(text_operand(field, op, operand, insensitive)?),
            "startsWith" => Condition::StartsWith(text_operand(field, op, operand, insensitive)?),
            "endsWith" => Condition::EndsWith(text_operand(field, op, operand, insensitive)?),
            other => {
                return Err(FilterError::UnknownOperator {
                    field: field.to_string(),
                    operator: other.to_string(),
                })
            }
        };
        out = out.and(Filter::field(field, condition));
    }
    Ok(out)
}

fn array_operand(field: &str, op: &str, operand: &Value) -> Result<Vec<Value>, FilterError> {
    match operand {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(FilterError::InvalidOperand {
            field: field.to_string(),
            operator: op.to_string(),
            expected: "an array",
        }),
    }
}

fn text_operand(
    field: &str,
    op: &str,
    operand: &Value,
    insensitive: bool,
) -> Result<TextMatch, FilterError> {
    match operand {
        Value::String(needle) => Ok(TextMatch {
            needle: needle.clone(),
            insensitive,
        }),
        _ => Err(FilterError::InvalidOperand {
            field: field.to_string(),
            operator: op.to_string(),
            expected: "a string",
        }),
    }
}
