//! Argument types for reader and writer operations.
//!
//! These mirror the ORM call shapes (`where`, `select`, `include`, `orderBy`,
//! `take`, `skip`, `data`) with builder-style setters.

use serde_json::{Map, Value};

use crate::errors::{ScopeError, ScopeResult};
use crate::filter::Filter;
use crate::tenant::value_kind;

/// A stored record: field name to value.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

/// Projection and relation-following for returned records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    /// Fields to return; `None` returns every field.
    pub select: Option<Vec<String>>,
    /// Relations to attach, by relation name.
    pub include: Vec<String>,
    /// Constraint every related row must satisfy to be attached. Set by the
    /// scoped accessors to the bound tenant; backends must apply it to each
    /// followed relation.
    pub include_scope: Option<Filter>,
}

impl Shape {
    pub fn is_full(&self) -> bool {
        self.select.is_none() && self.include.is_empty()
    }
}

/// Arguments for `find_many` / `find_first`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindArgs {
    pub filter: Filter,
    pub shape: Shape,
    pub order_by: Vec<OrderBy>,
    pub take: Option<usize>,
    pub skip: Option<usize>,
}

impl FindArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shape.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.shape.include.push(relation.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            order,
        });
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}

impl From<Filter> for FindArgs {
    fn from(filter: Filter) -> Self {
        Self::new().filter(filter)
    }
}

/// Arguments for `find_unique`.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueArgs {
    pub filter: Filter,
    pub shape: Shape,
}

impl UniqueArgs {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            shape: Shape::default(),
        }
    }

    /// Lookup on the `id` field.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new(Filter::eq("id", id.into()))
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shape.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.shape.include.push(relation.into());
        self
    }
}

/// Arguments for `create`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateArgs {
    pub data: Record,
    pub shape: Shape,
}

impl CreateArgs {
    pub fn new(data: Record) -> Self {
        Self {
            data,
            shape: Shape::default(),
        }
    }

    /// Build from a JSON object. Any other JSON value is rejected.
    pub fn from_json(data: Value) -> ScopeResult<Self> {
        Ok(Self::new(into_record(data)?))
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shape.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.shape.include.push(relation.into());
        self
    }
}

/// Arguments for `update`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateArgs {
    pub filter: Filter,
    pub data: Record,
    pub shape: Shape,
}

impl UpdateArgs {
    pub fn new(filter: Filter, data: Record) -> Self {
        Self {
            filter,
            data,
            shape: Shape::default(),
        }
    }

    pub fn from_json(filter: Filter, data: Value) -> ScopeResult<Self> {
        Ok(Self::new(filter, into_record(data)?))
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shape.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.shape.include.push(relation.into());
        self
    }
}

/// Arguments for `delete`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteArgs {
    pub filter: Filter,
    pub shape: Shape,
}

impl DeleteArgs {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            shape: Shape::default(),
        }
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.shape.include.push(relation.into());
        self
    }
}

fn into_record(value: Value) -> ScopeResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ScopeError::InvalidPayload(value_kind(&other))),
    }
}
