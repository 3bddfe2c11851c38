//! Tenant table registry
//!
//! Maps tenants to their tables and creates, probes and drops those tables.
//!
//! ## Failure Discipline
//!
//! `exists`, `create` and `delete` never return errors. They connect lazily
//! and report `false` when the store cannot be reached; `create` and
//! `delete` log the cause.
//!
//! ## Implicit Provisioning
//!
//! With `auto_create_tables` on, write paths call [`TableRegistry::ensure`]
//! before writing. Tables seen to exist are remembered so the schema catalog
//! is consulted once per tenant. A table dropped through [`TableRegistry::delete`]
//! is tombstoned: `ensure` will not bring it back until `create` is called.

use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, error};

use colonnade_core::{Error, Result, TableNaming};
use colonnade_storage::TableRef;

use crate::connection::ConnectionManager;
use crate::schema;

/// Create/exists/delete for per-tenant tables
#[derive(Debug)]
pub struct TableRegistry {
    connections: Arc<ConnectionManager>,
    known: DashSet<String>,
    dropped: DashSet<String>,
}

impl TableRegistry {
    /// Registry over a shared connection manager
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self {
            connections,
            known: DashSet::new(),
            dropped: DashSet::new(),
        }
    }

    /// The connection manager this registry uses
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Table name for a tenant; pure, needs no connection
    pub fn table_for(&self, tenant: &str) -> Option<String> {
        self.connections.naming().table_for(tenant)
    }

    /// True for tenant ids `create` accepts
    pub fn is_valid_tenant(tenant: &str) -> bool {
        TableNaming::is_valid_tenant(tenant)
    }

    /// True if the tenant's table is in the schema catalog.
    ///
    /// Returns `false` for a blank tenant and on any error.
    pub fn exists(&self, tenant: &str) -> bool {
        let Some(table) = self.connections.table_ref(tenant) else {
            return false;
        };
        match self.table_exists(&table) {
            Ok(exists) => {
                if exists {
                    self.known.insert(table.table);
                }
                exists
            }
            Err(e) => {
                debug!(
                    target: "colonnade::schema",
                    tenant,
                    error = %e,
                    "Table existence check failed"
                );
                false
            }
        }
    }

    /// Create the tenant's table (and the keyspace if missing).
    ///
    /// # Returns
    ///
    /// * `true` - the table was created
    /// * `false` - blank or invalid tenant, table already present, or a
    ///   backend error (logged)
    pub fn create(&self, tenant: &str) -> bool {
        if !Self::is_valid_tenant(tenant) {
            debug!(target: "colonnade::schema", tenant, "Refusing to create table for invalid tenant");
            return false;
        }
        let Some(table) = self.connections.table_ref(tenant) else {
            return false;
        };
        if self.exists(tenant) {
            return false;
        }
        let result = self.connections.session().and_then(|session| {
            schema::provision(session.as_ref(), self.connections.config(), &table)
        });
        match result {
            Ok(()) => {
                self.dropped.remove(&table.table);
                self.known.insert(table.table);
                true
            }
            Err(e) => {
                error!(target: "colonnade::schema", tenant, table = %table, error = %e, "Failed to create table");
                false
            }
        }
    }

    /// Drop the tenant's table.
    ///
    /// # Returns
    ///
    /// * `true` - the table was dropped
    /// * `false` - blank tenant, no such table, or a backend error (logged)
    pub fn delete(&self, tenant: &str) -> bool {
        let Some(table) = self.connections.table_ref(tenant) else {
            return false;
        };
        if !self.exists(tenant) {
            return false;
        }
        let result = self
            .connections
            .session()
            .and_then(|session| schema::drop_table(session.as_ref(), &table));
        match result {
            Ok(()) => {
                self.known.remove(&table.table);
                self.dropped.insert(table.table);
                true
            }
            Err(e) => {
                error!(target: "colonnade::schema", tenant, table = %table, error = %e, "Failed to drop table");
                false
            }
        }
    }

    /// Make sure a write to `table` can land.
    ///
    /// No-op unless `auto_create_tables` is set. Tables dropped through
    /// [`TableRegistry::delete`] are left alone, so the write fails against
    /// the missing table.
    ///
    /// # Errors
    ///
    /// `Error::Backend` for a table name that is blank or contains
    /// whitespace; such a table is never provisioned.
    pub fn ensure(&self, table: &TableRef) -> Result<()> {
        if table.table.trim().is_empty() || table.table.chars().any(char::is_whitespace) {
            return Err(Error::backend(format!("refusing to provision table '{}'", table)));
        }
        if !self.connections.config().auto_create_tables
            || self.known.contains(&table.table)
            || self.dropped.contains(&table.table)
        {
            return Ok(());
        }
        if !self.table_exists(table)? {
            let session = self.connections.session()?;
            schema::provision(session.as_ref(), self.connections.config(), table)?;
        }
        self.known.insert(table.table.clone());
        Ok(())
    }

    fn table_exists(&self, table: &TableRef) -> Result<bool> {
        let session = self.connections.session()?;
        session.table_exists(&table.keyspace, &table.table)
    }
}
