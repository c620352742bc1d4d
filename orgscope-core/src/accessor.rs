use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigSnapshot, ScopeSettings};
use crate::errors::{ScopeError, ScopeResult};
use crate::filter::Filter;
use crate::query::{CreateArgs, DeleteArgs, FindArgs, Record, UniqueArgs, UpdateArgs};
use crate::reader::ScopedReader;
use crate::registry::{ModelRegistry, TenantModel};
use crate::scope::ModelScope;
use crate::store::StoreBackend;
use crate::tenant::OrganizationId;
use crate::writer::ScopedWriter;

/// Reader and writer for one model, bound to one organization.
#[derive(Clone)]
pub struct ModelAccessor {
    reader: ScopedReader,
    writer: ScopedWriter,
}

impl ModelAccessor {
    fn new(scope: ModelScope) -> Self {
        let scope = Arc::new(scope);
        Self {
            reader: ScopedReader::new(scope.clone()),
            writer: ScopedWriter::new(scope),
        }
    }

    /// Read-only capability, for code that must not write.
    pub fn reader(&self) -> &ScopedReader {
        &self.reader
    }

    pub fn writer(&self) -> &ScopedWriter {
        &self.writer
    }

    pub fn model(&self) -> TenantModel {
        self.reader.model()
    }

    pub async fn find_many(&self, args: FindArgs) -> ScopeResult<Vec<Record>> {
        self.reader.find_many(args).await
    }

    pub async fn find_first(&self, args: FindArgs) -> ScopeResult<Option<Record>> {
        self.reader.find_first(args).await
    }

    pub async fn find_unique(&self, args: UniqueArgs) -> ScopeResult<Option<Record>> {
        self.reader.find_unique(args).await
    }

    pub async fn count(&self, filter: Filter) -> ScopeResult<u64> {
        self.reader.count(filter).await
    }

    pub async fn create(&self, args: CreateArgs) -> ScopeResult<Record> {
        self.writer.create(args).await
    }

    pub async fn update(&self, args: UpdateArgs) -> ScopeResult<Record> {
        self.writer.update(args).await
    }

    pub async fn delete(&self, args: DeleteArgs) -> ScopeResult<Record> {
        self.writer.delete(args).await
    }
}

impl fmt::Debug for ModelAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAccessor")
            .field("model", &self.reader.model())
            .field("organization_id", self.reader.organization_id())
            .finish()
    }
}

/// The per-request accessor: one [`ModelAccessor`] per tenant-scoped model,
/// all bound to the same organization.
///
/// Built fresh for each authorized request and dropped with it. It holds no
/// mutable state, so it can be cloned into concurrent tasks of that request.
#[derive(Clone)]
pub struct ScopedDb {
    organization_id: OrganizationId,
    workspace: ModelAccessor,
    execution_log: ModelAccessor,
    api_key: ModelAccessor,
    audit_log: ModelAccessor,
    organization_member: ModelAccessor,
}

impl ScopedDb {
    fn bind(
        registry: &ModelRegistry,
        organization_id: OrganizationId,
        settings: Arc<ScopeSettings>,
    ) -> ScopeResult<Self> {
        let accessor = |model: TenantModel| -> ScopeResult<ModelAccessor> {
            let store = registry
                .get(model)
                .cloned()
                .ok_or_else(|| ScopeError::UnboundModel(model.name().to_string()))?;
            Ok(ModelAccessor::new(ModelScope {
                model,
                organization_id: organization_id.clone(),
                store,
                settings: settings.clone(),
            }))
        };

        Ok(Self {
            workspace: accessor(TenantModel::Workspace)?,
            execution_log: accessor(TenantModel::ExecutionLog)?,
            api_key: accessor(TenantModel::ApiKey)?,
            audit_log: accessor(TenantModel::AuditLog)?,
            organization_member: accessor(TenantModel::OrganizationMember)?,
            organization_id,
        })
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn workspace(&self) -> &ModelAccessor {
        &self.workspace
    }

    pub fn execution_log(&self) -> &ModelAccessor {
        &self.execution_log
    }

    pub fn api_key(&self) -> &ModelAccessor {
        &self.api_key
    }

    pub fn audit_log(&self) -> &ModelAccessor {
        &self.audit_log
    }

    pub fn organization_member(&self) -> &ModelAccessor {
        &self.organization_member
    }

    /// Accessor by model, for code that iterates over [`TenantModel::ALL`].
    pub fn model(&self, model: TenantModel) -> &ModelAccessor {
        match model {
            TenantModel::Workspace => &self.workspace,
            TenantModel::ExecutionLog => &self.execution_log,
            TenantModel::ApiKey => &self.api_key,
            TenantModel::AuditLog => &self.audit_log,
            TenantModel::OrganizationMember => &self.organization_member,
        }
    }
}

impl fmt::Debug for ScopedDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedDb")
            .field("organization_id", &self.organization_id)
            .finish_non_exhaustive()
    }
}

/// Builds [`ScopedDb`]s over one backend.
///
/// Store bindings are resolved once at construction, so a backend missing a
/// tenant model fails at startup rather than mid-request. Cheap to clone.
#[derive(Clone)]
pub struct AccessorFactory {
    registry: Arc<ModelRegistry>,
    settings: Arc<ScopeSettings>,
}

impl AccessorFactory {
    pub fn new(backend: &dyn StoreBackend) -> ScopeResult<Self> {
        Self::with_settings(backend, ScopeSettings::default())
    }

    pub fn with_settings(backend: &dyn StoreBackend, settings: ScopeSettings) -> ScopeResult<Self> {
        Ok(Self {
            registry: Arc::new(ModelRegistry::from_backend(backend)?),
            settings: Arc::new(settings),
        })
    }

    pub fn from_config(backend: &dyn StoreBackend, config: &ConfigSnapshot) -> ScopeResult<Self> {
        Self::with_settings(backend, ScopeSettings::from_snapshot(config)?)
    }

    pub fn settings(&self) -> &ScopeSettings {
        &self.settings
    }

    /// The accessor for an already validated organization id.
    pub fn for_organization(&self, organization_id: OrganizationId) -> ScopeResult<ScopedDb> {
        debug!(organization_id = %organization_id, "binding scoped accessor");
        ScopedDb::bind(&self.registry, organization_id, self.settings.clone())
    }

    /// Validate `raw` and bind an accessor to it.
    pub fn for_raw(&self, raw: &str) -> ScopeResult<ScopedDb> {
        self.for_organization(OrganizationId::new(raw)?)
    }
}

impl fmt::Debug for AccessorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorFactory")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// One-shot form of [`AccessorFactory::for_organization`] with default settings.
pub fn create_accessor(
    backend: &dyn StoreBackend,
    organization_id: OrganizationId,
) -> ScopeResult<ScopedDb> {
    AccessorFactory::new(backend)?.for_organization(organization_id)
}
