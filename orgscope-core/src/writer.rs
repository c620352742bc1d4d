use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::ScopeResult;
use crate::query::{CreateArgs, DeleteArgs, Record, UpdateArgs};
use crate::registry::TenantModel;
use crate::scope::ModelScope;
use crate::tenant::OrganizationId;

/// Write operations on one model, confined to the bound organization.
#[derive(Clone)]
pub struct ScopedWriter {
    scope: Arc<ModelScope>,
}

impl ScopedWriter {
    pub(crate) fn new(scope: Arc<ModelScope>) -> Self {
        Self { scope }
    }

    pub fn model(&self) -> TenantModel {
        self.scope.model
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.scope.organization_id
    }

    /// Insert a record owned by the bound organization.
    ///
    /// Fails with `TenantMismatch` before touching the backend when `data`
    /// names another organization.
    #[instrument(name = "create", skip_all, fields(organization_id = %self.scope.organization_id, model = %self.scope.model))]
    pub async fn create(&self, args: CreateArgs) -> ScopeResult<Record> {
        let data = self.scope.admit_create(args.data)?;
        let shape = self.scope.scope_shape(args.shape);
        let created = self.scope.store.create(data, shape).await?;
        debug!("record created");
        Ok(created)
    }

    /// Update the first record matching `filter AND tenant`.
    ///
    /// A record owned by another organization never matches, so the backend
    /// reports not-found and the record is left untouched.
    #[instrument(name = "update", skip_all, fields(organization_id = %self.scope.organization_id, model = %self.scope.model))]
    pub async fn update(&self, args: UpdateArgs) -> ScopeResult<Record> {
        let data = self.scope.admit_update(args.data)?;
        let filter = self.scope.scope_write(args.filter);
        let shape = self.scope.scope_shape(args.shape);
        Ok(self.scope.store.update(filter, data, shape).await?)
    }

    /// Delete the first record matching `filter AND tenant`.
    #[instrument(name = "delete", skip_all, fields(organization_id = %self.scope.organization_id, model = %self.scope.model))]
    pub async fn delete(&self, args: DeleteArgs) -> ScopeResult<Record> {
        let filter = self.scope.scope_write(args.filter);
        let shape = self.scope.scope_shape(args.shape);
        Ok(self.scope.store.delete(filter, shape).await?)
    }
}
