//! Shared session and prepared-statement cache
//!
//! One `ConnectionManager` owns one session for the whole adapter. Nothing is
//! dialled until the first call that needs the store.
//!
//! ## Connect
//!
//! `session()` is double-checked: the fast path is a read lock on the cached
//! session; only on a miss does a caller take the connect mutex, check again,
//! and dial. Concurrent first callers therefore connect exactly once.
//!
//! After connecting, the root tenant's table is provisioned if missing.
//!
//! ## Statement Cache
//!
//! Prepared statements are cached by their CQL text. A miss prepares and
//! inserts; two racing misses may both prepare, and the first insert wins.
//!
//! ## Shutdown
//!
//! `shutdown()` closes the session once and clears the cache. The next call
//! to `session()` reconnects.

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use colonnade_core::{AdapterConfig, Error, Result, TableNaming};
use colonnade_storage::{Connector, PreparedStatement, Query, Session, TableRef};

use crate::schema;

/// Lazily connected session plus statement cache
pub struct ConnectionManager {
    config: AdapterConfig,
    naming: TableNaming,
    connector: Arc<dyn Connector>,
    session: RwLock<Option<Arc<dyn Session>>>,
    connect_lock: Mutex<()>,
    statements: DashMap<String, PreparedStatement>,
}

impl ConnectionManager {
    /// Create a manager. Does not connect.
    pub fn new(config: AdapterConfig, connector: Arc<dyn Connector>) -> Self {
        let naming = TableNaming::from_config(&config);
        Self {
            config,
            naming,
            connector,
            session: RwLock::new(None),
            connect_lock: Mutex::new(()),
            statements: DashMap::new(),
        }
    }

    /// Adapter settings
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Tenant → table naming built from the settings
    pub fn naming(&self) -> &TableNaming {
        &self.naming
    }

    /// Keyspace-qualified table for a tenant.
    ///
    /// `None` for a tenant documents may not be stored under (blank, or
    /// containing whitespace or underscores), so callers treat it as a no-op.
    pub fn table_ref(&self, tenant: &str) -> Option<TableRef> {
        if !self.naming.accepts(tenant) {
            return None;
        }
        self.naming
            .table_for(tenant)
            .map(|table| TableRef::new(self.config.keyspace.as_str(), table))
    }

    /// True once a session is open
    pub fn is_connected(&self) -> bool {
        self.session.read().is_some()
    }

    /// The shared session, connecting on first use.
    ///
    /// # Errors
    ///
    /// `Error::Connection` if the store cannot be reached.
    pub fn session(&self) -> Result<Arc<dyn Session>> {
        if let Some(session) = self.session.read().as_ref() {
            return Ok(Arc::clone(session));
        }

        let _connecting = self.connect_lock.lock();
        if let Some(session) = self.session.read().as_ref() {
            return Ok(Arc::clone(session));
        }

        let connection = self.config.connection_config();
        let session = self.connector.connect(&connection).map_err(|e| {
            error!(
                target: "colonnade::session",
                hosts = %self.config.hosts,
                port = self.config.port,
                error = %e,
                "Failed to connect to the backing store"
            );
            match e {
                Error::Connection(_) => e,
                other => Error::connection(other.to_string()),
            }
        })?;
        info!(
            target: "colonnade::session",
            hosts = %self.config.hosts,
            port = self.config.port,
            keyspace = %self.config.keyspace,
            tls = connection.tls.is_some(),
            "Connected to the backing store"
        );

        self.provision_root(session.as_ref());
        *self.session.write() = Some(Arc::clone(&session));
        Ok(session)
    }

    fn provision_root(&self, session: &dyn Session) {
        let Some(root) = self.table_ref(self.naming.root_tenant()) else {
            return;
        };
        let result = session
            .table_exists(&root.keyspace, &root.table)
            .and_then(|exists| {
                if exists {
                    Ok(())
                } else {
                    schema::provision(session, &self.config, &root)
                }
            });
        if let Err(e) = result {
            warn!(
                target: "colonnade::session",
                table = %root,
                error = %e,
                "Could not provision the root tenant's table"
            );
        }
    }

    /// Prepared form of `query`, from the cache when possible.
    pub fn prepare(&self, query: &Query) -> Result<PreparedStatement> {
        let cql = query.cql();
        if let Some(prepared) = self.statements.get(&cql) {
            return Ok(prepared.clone());
        }
        let prepared = self.session()?.prepare(query)?;
        debug!(target: "colonnade::session", cql = %cql, "Prepared statement");
        Ok(self.statements.entry(cql).or_insert(prepared).clone())
    }

    /// Number of cached statements
    pub fn cached_statements(&self) -> usize {
        self.statements.len()
    }

    /// Close the session and clear the statement cache.
    ///
    /// Safe to call repeatedly; only the first call after a connect closes
    /// anything.
    pub fn shutdown(&self) {
        let _connecting = self.connect_lock.lock();
        let session = self.session.write().take();
        self.statements.clear();
        if let Some(session) = session {
            session.close();
            info!(target: "colonnade::session", "Closed session");
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("hosts", &self.config.hosts)
            .field("keyspace", &self.config.keyspace)
            .field("connected", &self.is_connected())
            .field("cached_statements", &self.statements.len())
            .finish()
    }
}
