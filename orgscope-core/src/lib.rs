//! orgscope-core: tenant-isolated data access.
//!
//! Every read and write to a tenant-scoped model goes through a [`ScopedDb`]
//! bound to one [`OrganizationId`]. Reads get the tenant constraint injected,
//! creates get the tenant id stamped (or are rejected if they name another
//! tenant), and updates/deletes AND the tenant constraint onto the caller's
//! filter.
//!
//! ```rust,ignore
//! let factory = AccessorFactory::new(&backend)?;
//! let db = factory.for_raw("org_a")?;
//! let workspaces = db.workspace().find_many(FindArgs::new()).await?;
//! ```

pub mod accessor;
pub mod config;
pub mod errors;
pub mod filter;
pub mod query;
pub mod reader;
pub mod registry;
mod scope;
pub mod store;
pub mod tenant;
pub mod writer;

pub use accessor::{create_accessor, AccessorFactory, ModelAccessor, ScopedDb};
pub use config::{ConfigSnapshot, ScopeConfig, ScopeSettings, UpdateTenantPolicy};
pub use errors::{ClientError, ErrorKind, ScopeError, ScopeResult};
pub use filter::{Condition, Filter, FilterError, TextMatch};
pub use query::{
    CreateArgs, DeleteArgs, FindArgs, OrderBy, Record, Shape, SortOrder, UniqueArgs, UpdateArgs,
};
pub use reader::ScopedReader;
pub use registry::{ModelRegistry, TenantModel};
pub use scope::SECURITY_TARGET;
pub use store::{ModelStore, StoreBackend, StoreError, StoreMethod, StoreResult};
pub use tenant::{make_organization_id, OrganizationId};
pub use writer::ScopedWriter;
