//! Tenant constraint injection shared by readers and writers.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ScopeSettings, UpdateTenantPolicy};
use crate::errors::{ScopeError, ScopeResult};
use crate::filter::Filter;
use crate::query::{FindArgs, Record, Shape};
use crate::registry::TenantModel;
use crate::store::{ModelStore, StoreMethod};
use crate::tenant::OrganizationId;

/// Log target for cross-tenant faults, kept apart from ordinary diagnostics.
pub const SECURITY_TARGET: &str = "orgscope::security";

/// One model's binding, fixed to one organization.
pub(crate) struct ModelScope {
    pub(crate) model: TenantModel,
    pub(crate) organization_id: OrganizationId,
    pub(crate) store: Arc<dyn ModelStore>,
    pub(crate) settings: Arc<ScopeSettings>,
}

impl ModelScope {
    fn tenant_field(&self) -> &str {
        &self.settings.tenant_field
    }

    fn tenant_filter(&self) -> Filter {
        Filter::eq(self.tenant_field(), self.organization_id.to_value())
    }

    /// Reads: the bound id replaces any top-level tenant constraint from the
    /// caller, then is AND-ed onto the rest.
    pub(crate) fn scope_read(&self, filter: Filter) -> Filter {
        let filter = if filter.constrains_top_level(self.tenant_field()) {
            debug!(
                field = self.tenant_field(),
                "caller filter names the tenant field; bound organization wins"
            );
            filter.without_top_level(self.tenant_field())
        } else {
            filter
        };
        filter.and(self.tenant_filter())
    }

    /// Updates and deletes: the caller's constraints are kept intact and the
    /// tenant constraint is AND-ed on, so the result can only narrow.
    pub(crate) fn scope_write(&self, filter: Filter) -> Filter {
        filter.and(self.tenant_filter())
    }

    /// Related rows reached through `include` are held to the same tenant.
    pub(crate) fn scope_shape(&self, mut shape: Shape) -> Shape {
        shape.include_scope = (!shape.include.is_empty()).then(|| self.tenant_filter());
        shape
    }

    pub(crate) fn scope_find(&self, mut args: FindArgs) -> FindArgs {
        args.filter = self.scope_read(args.filter);
        args.shape = self.scope_shape(args.shape);
        args.take = match (args.take, self.settings.max_take) {
            (Some(take), Some(max)) => Some(take.min(max)),
            (None, Some(max)) => Some(max),
            (take, None) => take,
        };
        args
    }

    /// Create payloads may omit the tenant field or repeat the bound id;
    /// anything else is a cross-tenant write.
    pub(crate) fn admit_create(&self, mut data: Record) -> ScopeResult<Record> {
        match data.get(self.tenant_field()) {
            None | Some(Value::Null) => {}
            Some(v) if self.organization_id.matches(v) => {}
            Some(v) => return Err(self.mismatch(StoreMethod::Create, v)),
        }
        data.insert(
            self.tenant_field().to_string(),
            self.organization_id.to_value(),
        );
        Ok(data)
    }

    /// Update payloads never carry the tenant field to the backend.
    pub(crate) fn admit_update(&self, mut data: Record) -> ScopeResult<Record> {
        let Some(supplied) = data.remove(self.tenant_field()) else {
            return Ok(data);
        };
        if supplied.is_null() || self.organization_id.matches(&supplied) {
            return Ok(data);
        }
        match self.settings.update_policy {
            UpdateTenantPolicy::Reject => Err(self.mismatch(StoreMethod::Update, &supplied)),
            UpdateTenantPolicy::Strip => {
                warn!(
                    target: SECURITY_TARGET,
                    organization_id = %self.organization_id,
                    model = %self.model,
                    supplied = %render(&supplied),
                    "cross-tenant value stripped from update payload"
                );
                Ok(data)
            }
        }
    }

    fn mismatch(&self, method: StoreMethod, supplied: &Value) -> ScopeError {
        let supplied = render(supplied);
        warn!(
            target: SECURITY_TARGET,
            organization_id = %self.organization_id,
            model = %self.model,
            method = method.as_str(),
            supplied = %supplied,
            "cross-tenant write attempt rejected"
        );
        ScopeError::TenantMismatch {
            model: self.model.name(),
            bound: self.organization_id.clone(),
            supplied,
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
