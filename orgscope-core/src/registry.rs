use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{ScopeError, ScopeResult};
use crate::store::{ModelStore, StoreBackend};

/// Every model that carries an owning-organization attribute.
///
/// This is the single canonical list; accessors expose exactly these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenantModel {
    Workspace,
    ExecutionLog,
    ApiKey,
    AuditLog,
    OrganizationMember,
}

impl TenantModel {
    pub const ALL: [TenantModel; 5] = [
        TenantModel::Workspace,
        TenantModel::ExecutionLog,
        TenantModel::ApiKey,
        TenantModel::AuditLog,
        TenantModel::OrganizationMember,
    ];

    /// Model name as known to the backend store.
    pub fn name(&self) -> &'static str {
        match self {
            TenantModel::Workspace => "workspace",
            TenantModel::ExecutionLog => "executionLog",
            TenantModel::ApiKey => "apiKey",
            TenantModel::AuditLog => "auditLog",
            TenantModel::OrganizationMember => "organizationMember",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for TenantModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved store bindings for the tenant-scoped models.
///
/// Can be filled by hand (tests, custom wiring) or resolved in one go from a
/// backend with [`ModelRegistry::from_backend`]. It is itself a
/// [`StoreBackend`], so either form can be handed to the accessor factory.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    stores: HashMap<TenantModel, Arc<dyn ModelStore>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }

    /// Bind every tenant model, failing on the first one the backend lacks.
    pub fn from_backend(backend: &dyn StoreBackend) -> ScopeResult<Self> {
        let mut registry = Self::new();
        for model in TenantModel::ALL {
            let store = backend
                .model(model.name())
                .ok_or_else(|| ScopeError::UnboundModel(model.name().to_string()))?;
            registry.register(model, store);
        }
        Ok(registry)
    }

    pub fn register(&mut self, model: TenantModel, store: Arc<dyn ModelStore>) {
        self.stores.insert(model, store);
    }

    pub fn get(&self, model: TenantModel) -> Option<&Arc<dyn ModelStore>> {
        self.stores.get(&model)
    }

    pub fn contains(&self, model: TenantModel) -> bool {
        self.stores.contains_key(&model)
    }
}

impl StoreBackend for ModelRegistry {
    fn model(&self, name: &str) -> Option<Arc<dyn ModelStore>> {
        TenantModel::from_name(name).and_then(|m| self.stores.get(&m).cloned())
    }
}
