//! Tenant lifecycle hooks
//!
//! The tenant-management side announces tenants coming and going through
//! [`TenantEvents`]. [`TableLifecycle`] is the listener that keeps tables in
//! step: a table per tenant, except for tenants that share a table with
//! others.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use crate::registry::TableRegistry;

/// A tenant as announced by tenant management
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    /// Tenant id
    pub identifier: String,
    /// True if the tenant keeps its documents in a shared table
    pub shares_table: bool,
}

impl Tenant {
    /// Tenant with its own table
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            shares_table: false,
        }
    }

    /// Tenant living in a shared table
    pub fn shared(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            shares_table: true,
        }
    }
}

/// Reacts to tenants being created and deleted
pub trait TenantListener: Send + Sync {
    /// A tenant was created
    fn on_tenant_created(&self, tenant: &Tenant);
    /// A tenant was deleted
    fn on_tenant_deleted(&self, tenant: &Tenant);
}

/// Creates and drops tenant tables as tenants come and go
#[derive(Debug, Clone)]
pub struct TableLifecycle {
    registry: Arc<TableRegistry>,
}

impl TableLifecycle {
    /// Listener over a registry
    pub fn new(registry: Arc<TableRegistry>) -> Self {
        Self { registry }
    }
}

impl TenantListener for TableLifecycle {
    fn on_tenant_created(&self, tenant: &Tenant) {
        if tenant.shares_table {
            debug!(target: "colonnade::schema", tenant = %tenant.identifier, "Tenant shares a table, nothing to create");
            return;
        }
        if self.registry.create(&tenant.identifier) {
            info!(target: "colonnade::schema", tenant = %tenant.identifier, "Provisioned table for new tenant");
        }
    }

    fn on_tenant_deleted(&self, tenant: &Tenant) {
        if tenant.shares_table {
            debug!(target: "colonnade::schema", tenant = %tenant.identifier, "Tenant shares a table, nothing to drop");
            return;
        }
        if self.registry.delete(&tenant.identifier) {
            info!(target: "colonnade::schema", tenant = %tenant.identifier, "Dropped table of deleted tenant");
        }
    }
}

/// Listener list; events go to listeners in registration order.
#[derive(Default)]
pub struct TenantEvents {
    listeners: RwLock<Vec<Arc<dyn TenantListener>>>,
}

impl TenantEvents {
    /// No listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener
    pub fn register(&self, listener: Arc<dyn TenantListener>) {
        self.listeners.write().push(listener);
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// True if nobody is listening
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Announce a new tenant
    pub fn tenant_created(&self, tenant: &Tenant) {
        for listener in self.snapshot() {
            listener.on_tenant_created(tenant);
        }
    }

    /// Announce a deleted tenant
    pub fn tenant_deleted(&self, tenant: &Tenant) {
        for listener in self.snapshot() {
            listener.on_tenant_deleted(tenant);
        }
    }

    // listeners may register others while handling an event
    fn snapshot(&self) -> Vec<Arc<dyn TenantListener>> {
        self.listeners.read().clone()
    }
}

impl std::fmt::Debug for TenantEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantEvents")
            .field("listeners", &self.len())
            .finish()
    }
}
