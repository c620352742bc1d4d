use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use orgscope_core::{
    FindArgs, Filter, ModelStore, Record, Shape, StoreBackend, StoreError, StoreResult,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::eval;

/// Cardinality of a relation followed by `include`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    One,
    Many,
}

/// `include` target: rows of `target` whose `foreign_field` equals this
/// row's `local_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub target: String,
    pub local_field: String,
    pub foreign_field: String,
    pub kind: RelationKind,
}

impl Relation {
    pub fn one(
        target: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            kind: RelationKind::One,
        }
    }

    pub fn many(
        target: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::Many,
            ..Self::one(target, local_field, foreign_field)
        }
    }
}

#[derive(Debug, Default)]
struct ModelSchema {
    unique: Vec<Vec<String>>,
    relations: HashMap<String, Relation>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: RwLock<HashMap<String, Vec<Record>>>,
    schema: RwLock<HashMap<String, ModelSchema>>,
    fault: Mutex<Option<String>>,
}

/// In-memory backend for tests and local development.
///
/// Rows live in insertion order per model. Every model name resolves to a
/// store, so an empty backend already binds all tenant models. Locks are
/// always taken tables-then-schema and never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a (possibly compound) unique constraint on `model`.
    pub fn define_unique<I, S>(&self, model: &str, fields: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .schema
            .write()
            .entry(model.to_string())
            .or_default()
            .unique
            .push(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a relation that `include` can follow from `model`.
    pub fn define_relation(&self, model: &str, name: &str, relation: Relation) -> &Self {
        self.inner
            .schema
            .write()
            .entry(model.to_string())
            .or_default()
            .relations
            .insert(name.to_string(), relation);
        self
    }

    /// Insert a fixture row directly, bypassing any scoping. Ids and
    /// timestamps are filled in when absent; constraints still apply.
    pub fn seed(&self, model: &str, record: Record) -> StoreResult<Record> {
        let mut tables = self.inner.tables.write();
        let schema = self.inner.schema.read();
        let rows = tables.entry(model.to_string()).or_default();
        let row = stamp_new(record);
        check_unique(model, schema.get(model), rows, &row, None)?;
        rows.push(row.clone());
        Ok(row)
    }

    /// Snapshot of every row of `model`, regardless of tenant.
    pub fn rows(&self, model: &str) -> Vec<Record> {
        self.inner
            .tables
            .read()
            .get(model)
            .cloned()
            .unwrap_or_default()
    }

    /// Make the next store call fail with [`StoreError::Connectivity`].
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.inner.fault.lock() = Some(message.into());
    }

    pub fn store(&self, model: &str) -> MemoryModelStore {
        MemoryModelStore {
            model: model.to_string(),
            inner: self.inner.clone(),
        }
    }
}

impl StoreBackend for MemoryBackend {
    fn model(&self, name: &str) -> Option<Arc<dyn ModelStore>> {
        Some(Arc::new(self.store(name)))
    }
}

/// One model's table inside a [`MemoryBackend`].
#[derive(Debug, Clone)]
pub struct MemoryModelStore {
    model: String,
    inner: Arc<Inner>,
}

impl MemoryModelStore {
    pub fn model(&self) -> &str {
        &self.model
    }

    fn take_fault(&self) -> StoreResult<()> {
        match self.inner.fault.lock().take() {
            Some(message) => {
                warn!(model = %self.model, %message, "injected backend fault");
                Err(StoreError::Connectivity(message))
            }
            None => Ok(()),
        }
    }

    /// Indices of matching rows after ordering, skip and take.
    fn select(rows: &[Record], args: &FindArgs) -> Vec<usize> {
        let mut hits: Vec<&Record> = rows
            .iter()
            .filter(|row| eval::matches(&args.filter, row))
            .collect();
        eval::sort_records(&mut hits, &args.order_by);

        let skip = args.skip.unwrap_or(0);
        let take = args.take.unwrap_or(usize::MAX);
        hits.into_iter()
            .skip(skip)
            .take(take)
            .filter_map(|hit| rows.iter().position(|row| std::ptr::eq(row, hit)))
            .collect()
    }

    fn first_match(rows: &[Record], filter: &Filter) -> Option<usize> {
        rows.iter().position(|row| eval::matches(filter, row))
    }

    fn shape(
        &self,
        tables: &HashMap<String, Vec<Record>>,
        schema: &HashMap<String, ModelSchema>,
        row: &Record,
        shape: &Shape,
    ) -> StoreResult<Record> {
        if shape.is_full() {
            return Ok(row.clone());
        }

        let mut out = match &shape.select {
            Some(fields) => fields
                .iter()
                .filter_map(|f| row.get(f).map(|v| (f.clone(), v.clone())))
                .collect(),
            None => row.clone(),
        };

        for name in &shape.include {
            let relation = schema
                .get(&self.model)
                .and_then(|s| s.relations.get(name))
                .ok_or_else(|| {
                    StoreError::InvalidQuery(format!(
                        "unknown relation `{name}` on `{}`",
                        self.model
                    ))
                })?;
            out.insert(
                name.clone(),
                follow(tables, relation, row, shape.include_scope.as_ref()),
            );
        }
        Ok(out)
    }
}

/// Related rows for `row`. Rows failing `scope` are treated as absent.
fn follow(
    tables: &HashMap<String, Vec<Record>>,
    relation: &Relation,
    row: &Record,
    scope: Option<&Filter>,
) -> Value {
    let key = row.get(&relation.local_field).unwrap_or(&Value::Null);
    let related = tables
        .get(&relation.target)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter(|r| {
            !key.is_null()
                && eval::values_equal(r.get(&relation.foreign_field).unwrap_or(&Value::Null), key)
                && scope.map_or(true, |f| eval::matches(f, r))
        });

    match relation.kind {
        RelationKind::One => related
            .map(|r| Value::Object(r.clone()))
            .next()
            .unwrap_or(Value::Null),
        RelationKind::Many => Value::Array(related.map(|r| Value::Object(r.clone())).collect()),
    }
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn stamp_new(mut record: Record) -> Record {
    if record.get("id").map_or(true, Value::is_null) {
        record.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    let ts = now();
    record.entry("createdAt").or_insert_with(|| ts.clone());
    record.entry("updatedAt").or_insert(ts);
    record
}

/// Fails when `row` collides with another row on `id` or a declared unique
/// constraint. `skip` is the index of the row being replaced, if any.
fn check_unique(
    model: &str,
    schema: Option<&ModelSchema>,
    rows: &[Record],
    row: &Record,
    skip: Option<usize>,
) -> StoreResult<()> {
    let id_key = vec!["id".to_string()];
    let constraints = std::iter::once(&id_key).chain(schema.into_iter().flat_map(|s| &s.unique));

    for fields in constraints {
        let key: Vec<&Value> = fields
            .iter()
            .map(|f| row.get(f).unwrap_or(&Value::Null))
            .collect();
        if key.iter().any(|v| v.is_null()) {
            continue;
        }
        let clash = rows.iter().enumerate().any(|(i, other)| {
            Some(i) != skip
                && fields.iter().zip(&key).all(|(f, v)| {
                    eval::values_equal(other.get(f).unwrap_or(&Value::Null), v)
                })
        });
        if clash {
            return Err(StoreError::UniqueViolation {
                model: model.to_string(),
                field: fields.join(","),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn find_many(&self, args: FindArgs) -> StoreResult<Vec<Record>> {
        self.take_fault()?;
        let tables = self.inner.tables.read();
        let schema = self.inner.schema.read();
        let rows = tables.get(&self.model).map(Vec::as_slice).unwrap_or(&[]);

        Self::select(rows, &args)
            .into_iter()
            .map(|i| self.shape(&tables, &schema, &rows[i], &args.shape))
            .collect()
    }

    async fn find_first(&self, args: FindArgs) -> StoreResult<Option<Record>> {
        self.take_fault()?;
        let tables = self.inner.tables.read();
        let schema = self.inner.schema.read();
        let rows = tables.get(&self.model).map(Vec::as_slice).unwrap_or(&[]);

        let args = FindArgs {
            take: Some(1),
            ..args
        };
        Self::select(rows, &args)
            .first()
            .map(|&i| self.shape(&tables, &schema, &rows[i], &args.shape))
            .transpose()
    }

    async fn count(&self, filter: Filter) -> StoreResult<u64> {
        self.take_fault()?;
        let tables = self.inner.tables.read();
        let n = tables
            .get(&self.model)
            .map_or(0, |rows| rows.iter().filter(|r| eval::matches(&filter, r)).count());
        Ok(n as u64)
    }

    async fn create(&self, data: Record, shape: Shape) -> StoreResult<Record> {
        self.take_fault()?;
        let mut tables = self.inner.tables.write();
        let schema = self.inner.schema.read();

        let row = stamp_new(data);
        let rows = tables.entry(self.model.clone()).or_default();
        check_unique(&self.model, schema.get(&self.model), rows, &row, None)?;
        rows.push(row.clone());
        debug!(model = %self.model, id = %row["id"], "row inserted");

        self.shape(&tables, &schema, &row, &shape)
    }

    async fn update(&self, filter: Filter, data: Record, shape: Shape) -> StoreResult<Record> {
        self.take_fault()?;
        let mut tables = self.inner.tables.write();
        let schema = self.inner.schema.read();
        let rows = tables
            .get_mut(&self.model)
            .ok_or_else(|| StoreError::not_found(&self.model))?;
        let index =
            Self::first_match(rows, &filter).ok_or_else(|| StoreError::not_found(&self.model))?;

        let mut row = rows[index].clone();
        let touched = data.contains_key("updatedAt");
        row.extend(data);
        if !touched {
            row.insert("updatedAt".into(), now());
        }
        check_unique(&self.model, schema.get(&self.model), rows, &row, Some(index))?;
        rows[index] = row.clone();

        self.shape(&tables, &schema, &row, &shape)
    }

    async fn delete(&self, filter: Filter, shape: Shape) -> StoreResult<Record> {
        self.take_fault()?;
        let mut tables = self.inner.tables.write();
        let schema = self.inner.schema.read();
        let rows = tables
            .get_mut(&self.model)
            .ok_or_else(|| StoreError::not_found(&self.model))?;
        let index =
            Self::first_match(rows, &filter).ok_or_else(|| StoreError::not_found(&self.model))?;

        // Shape before removal so `include` still sees the row's relations.
        let shaped = self.shape(&tables, &schema, &tables[&self.model][index], &shape)?;
        if let Some(rows) = tables.get_mut(&self.model) {
            rows.remove(index);
        }
        Ok(shaped)
    }
}
