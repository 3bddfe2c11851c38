//! Colonnade - multi-tenant JSON document persistence over a wide-column store
//!
//! Colonnade stores each document as a JSON payload in a per-tenant table,
//! keyed by document id, and offers create/read/update/delete, atomic
//! batches and cursor-paged full scans on top.
//!
//! # Quick Start
//!
//! ```ignore
//! use colonnade::{AdapterConfig, Colonnade, Document, MemoryCluster};
//! use std::sync::Arc;
//!
//! let adapter = Colonnade::new(AdapterConfig::default(), Arc::new(MemoryCluster::new()))?;
//! let docs = adapter.documents::<Document>();
//!
//! let mut lamp = Document::new("product").with_name("Lamp");
//! let id = docs.create("shop", &mut lamp)?;
//! let stored = docs.read("shop", &id.unwrap_or_default());
//! ```
//!
//! # Architecture
//!
//! - `colonnade-core`: errors, settings, the `Persisted` trait, naming, pager
//! - `colonnade-storage`: the `Connector` / `Session` boundary and `MemoryCluster`
//! - `colonnade-engine`: connection management, tables, codec, document stores
//!
//! Drivers for a real cluster plug in by implementing `Connector` and `Session`.

pub use colonnade_core::{
    stamp, AdapterConfig, ConnectionConfig, ContactPoint, Document, Error, Pager, Persisted,
    Result, SslConfig, StoreFile, TableNaming, TlsMaterial, CONFIG_FILE_NAME, DEFAULT_LIMIT,
};
pub use colonnade_engine::{
    codec, Colonnade, ConnectionManager, DocumentStore, FieldFilter, TableLifecycle,
    TableRegistry, Tenant, TenantDocuments, TenantEvents, TenantListener,
};
pub use colonnade_storage::{
    Batch, BoundStatement, Connector, CqlValue, MemoryCluster, PagingState, PreparedStatement,
    Query, ResultSet, Row, SchemaChange, Session, TableRef,
};
