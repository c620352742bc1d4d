//! orgscope-memory: an in-memory [`StoreBackend`](orgscope_core::StoreBackend).
//!
//! Evaluates the full filter language, ordering, pagination, `select` and
//! `include` over JSON rows, with unique constraints and one-shot fault
//! injection. Used by the isolation test suites and for local development.
//!
//! ```rust
//! use orgscope_core::{AccessorFactory, CreateArgs, FindArgs};
//! use orgscope_memory::MemoryBackend;
//! use serde_json::json;
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let backend = MemoryBackend::new();
//! let db = AccessorFactory::new(&backend).unwrap().for_raw("org_a").unwrap();
//!
//! db.workspace()
//!     .create(CreateArgs::from_json(json!({ "name": "proj" })).unwrap())
//!     .await
//!     .unwrap();
//! let rows = db.workspace().find_many(FindArgs::new()).await.unwrap();
//! assert_eq!(rows[0]["organizationId"], "org_a");
//! # });
//! # }
//! ```

pub mod eval;
pub mod storage;

pub use storage::{MemoryBackend, MemoryModelStore, Relation, RelationKind};
