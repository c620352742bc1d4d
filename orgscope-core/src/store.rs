use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::ErrorKind;
use crate::filter::Filter;
use crate::query::{FindArgs, Record, Shape};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Faults raised by a backend store. The isolation layer passes these
/// through unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no `{model}` record matches the given filter")]
    NotFound { model: String },

    #[error("unique constraint failed on `{model}.{field}`")]
    UniqueViolation { model: String, field: String },

    #[error("backend unavailable: {0}")]
    Connectivity(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(model: impl Into<String>) -> Self {
        Self::NotFound {
            model: model.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::UniqueViolation { .. } => ErrorKind::Conflict,
            StoreError::Connectivity(_) => ErrorKind::Unavailable,
            StoreError::InvalidQuery(_) => ErrorKind::BadRequest,
            StoreError::Other(_) => ErrorKind::GeneralError,
        }
    }
}

/// Operations a backend binding exposes for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreMethod {
    FindMany,
    FindFirst,
    Count,
    Create,
    Update,
    Delete,
}

impl StoreMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreMethod::FindMany => "findMany",
            StoreMethod::FindFirst => "findFirst",
            StoreMethod::Count => "count",
            StoreMethod::Create => "create",
            StoreMethod::Update => "update",
            StoreMethod::Delete => "delete",
        }
    }
}

/// Backend binding for one model: the capability set the isolation layer
/// needs, and nothing more.
///
/// - `find_many`  → filtered, ordered, paginated list
/// - `find_first` → first match under `order_by` (or natural order)
/// - `count`      → number of matches
/// - `create`     → insert one record
/// - `update`     → merge `data` into the first match; `NotFound` when none
/// - `delete`     → remove the first match; `NotFound` when none
///
/// Implementations receive filters that already carry the tenant constraint
/// and must apply them as given.
#[async_trait]
pub trait ModelStore: Send + Sync {
    async fn find_many(&self, args: FindArgs) -> StoreResult<Vec<Record>>;

    async fn find_first(&self, args: FindArgs) -> StoreResult<Option<Record>>;

    async fn count(&self, filter: Filter) -> StoreResult<u64>;

    async fn create(&self, data: Record, shape: Shape) -> StoreResult<Record>;

    async fn update(&self, filter: Filter, data: Record, shape: Shape) -> StoreResult<Record>;

    async fn delete(&self, filter: Filter, shape: Shape) -> StoreResult<Record>;
}

/// A backend handle that binds model names to their stores.
pub trait StoreBackend: Send + Sync {
    fn model(&self, name: &str) -> Option<Arc<dyn ModelStore>>;
}

impl<B: StoreBackend + ?Sized> StoreBackend for Arc<B> {
    fn model(&self, name: &str) -> Option<Arc<dyn ModelStore>> {
        (**self).model(name)
    }
}
