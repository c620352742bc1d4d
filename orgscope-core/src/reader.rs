use std::sync::Arc;

use tracing::instrument;

use crate::errors::ScopeResult;
use crate::filter::Filter;
use crate::query::{FindArgs, Record, UniqueArgs};
use crate::registry::TenantModel;
use crate::scope::ModelScope;
use crate::tenant::OrganizationId;

/// Read operations on one model, confined to the bound organization.
///
/// Every result is a subset of the bound organization's records regardless
/// of what the caller's filter says. Backend faults pass through unchanged.
#[derive(Clone)]
pub struct ScopedReader {
    scope: Arc<ModelScope>,
}

impl ScopedReader {
    pub(crate) fn new(scope: Arc<ModelScope>) -> Self {
        Self { scope }
    }

    pub fn model(&self) -> TenantModel {
        self.scope.model
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.scope.organization_id
    }

    #[instrument(name = "find_many", skip_all, fields(organization_id = %self.scope.organization_id, model = %self.scope.model))]
    pub async fn find_many(&self, args: FindArgs) -> ScopeResult<Vec<Record>> {
        let args = self.scope.scope_find(args);
        Ok(self.scope.store.find_many(args).await?)
    }

    #[instrument(name = "find_first", skip_all, fields(organization_id = %self.scope.organization_id, model = %self.scope.model))]
    pub async fn find_first(&self, args: FindArgs) -> ScopeResult<Option<Record>> {
        let args = self.scope.scope_find(args);
        Ok(self.scope.store.find_first(args).await?)
    }

    /// Lookup by a unique key. Runs as a scoped first-match rather than a
    /// bare key lookup, so an id owned by another organization resolves to
    /// `None` and uniqueness is not re-checked.
    #[instrument(name = "find_unique", skip_all, fields(organization_id = %self.scope.organization_id, model = %self.scope.model))]
    pub async fn find_unique(&self, args: UniqueArgs) -> ScopeResult<Option<Record>> {
        let args = FindArgs {
            filter: args.filter,
            shape: args.shape,
            ..FindArgs::default()
        };
        let mut args = self.scope.scope_find(args);
        args.take = Some(1);
        Ok(self.scope.store.find_first(args).await?)
    }

    #[instrument(name = "count", skip_all, fields(organization_id = %self.scope.organization_id, model = %self.scope.model))]
    pub async fn count(&self, filter: Filter) -> ScopeResult<u64> {
        let filter = self.scope.scope_read(filter);
        Ok(self.scope.store.count(filter).await?)
    }
}
