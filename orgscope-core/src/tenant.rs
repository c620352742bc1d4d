//! The organization identifier: the unit of tenant isolation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ScopeError, ScopeResult};

/// Identifier of one organization (tenant).
///
/// The only constructors are [`OrganizationId::new`], [`OrganizationId::from_value`]
/// and [`make_organization_id`]; all of them reject empty and whitespace-only
/// input, so every value of this type is a usable scope key. Deserialization
/// goes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn new(raw: impl AsRef<str>) -> ScopeResult<Self> {
        let raw = raw.as_ref();
        if raw.is_empty() {
            return Err(ScopeError::invalid_tenant("organization id is empty"));
        }
        if raw.trim().is_empty() {
            return Err(ScopeError::invalid_tenant(
                "organization id is whitespace only",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Build from an untyped value, e.g. a route parameter already decoded as JSON.
    pub fn from_value(value: &Value) -> ScopeResult<Self> {
        match value {
            Value::String(s) => Self::new(s),
            other => Err(ScopeError::invalid_tenant(format!(
                "organization id must be a string, got {}",
                value_kind(other)
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `value` is a string equal to this id.
    pub fn matches(&self, value: &Value) -> bool {
        matches!(value, Value::String(s) if *s == self.0)
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

/// Free-function form of [`OrganizationId::new`].
pub fn make_organization_id(raw: impl AsRef<str>) -> ScopeResult<OrganizationId> {
    OrganizationId::new(raw)
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrganizationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrganizationId {
    type Error = ScopeError;

    fn try_from(raw: String) -> ScopeResult<Self> {
        Self::new(raw)
    }
}

impl TryFrom<&str> for OrganizationId {
    type Error = ScopeError;

    fn try_from(raw: &str) -> ScopeResult<Self> {
        Self::new(raw)
    }
}

impl From<OrganizationId> for String {
    fn from(id: OrganizationId) -> Self {
        id.0
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
