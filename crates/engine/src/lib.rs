//! Document engine for colonnade
//!
//! This crate sits between callers and the storage boundary:
//! - ConnectionManager: one lazily connected session plus a statement cache
//! - TableRegistry: per-tenant table create/exists/delete
//! - codec: documents to and from the `json` / `json_updates` columns
//! - DocumentStore: tenant-scoped CRUD, batches and paged scans
//! - lifecycle: tenant events provisioning and dropping tables
//! - Colonnade: the handle that wires these together
//!
//! The engine is the only component that knows about:
//! - The two-column row layout
//! - Which fields an update may write
//! - When a tenant's table may be created implicitly

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod codec;
pub mod connection;
pub mod lifecycle;
pub mod registry;
pub mod schema;
pub mod store;

pub use adapter::Colonnade;
pub use codec::FieldFilter;
pub use connection::ConnectionManager;
pub use lifecycle::{TableLifecycle, Tenant, TenantEvents, TenantListener};
pub use registry::TableRegistry;
pub use store::{DocumentStore, TenantDocuments};
