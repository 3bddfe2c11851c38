//! Colonnade: the adapter handle
//!
//! Owns the connection manager, the table registry and the tenant event
//! dispatcher, and hands out document stores over them. Cloning a
//! [`DocumentStore`] or calling [`Colonnade::documents`] again is cheap; all
//! stores share one session and one statement cache.

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use colonnade_core::{AdapterConfig, Persisted, Result, CONFIG_FILE_NAME};
use colonnade_storage::Connector;

use crate::connection::ConnectionManager;
use crate::lifecycle::{TableLifecycle, TenantEvents};
use crate::registry::TableRegistry;
use crate::store::DocumentStore;

/// Multi-tenant document adapter
#[derive(Debug)]
pub struct Colonnade {
    connections: Arc<ConnectionManager>,
    registry: Arc<TableRegistry>,
    events: TenantEvents,
}

impl Colonnade {
    /// Build an adapter from explicit settings.
    ///
    /// Validates the settings but does not connect. A [`TableLifecycle`]
    /// listener is registered so tenant events create and drop tables.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` for unusable settings.
    pub fn new(config: AdapterConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        let connections = Arc::new(ConnectionManager::new(config, connector));
        let registry = Arc::new(TableRegistry::new(Arc::clone(&connections)));
        let events = TenantEvents::new();
        events.register(Arc::new(TableLifecycle::new(Arc::clone(&registry))));
        Ok(Self {
            connections,
            registry,
            events,
        })
    }

    /// Build an adapter from `colonnade.toml` in `dir`.
    ///
    /// Writes a default file first if there is none.
    ///
    /// # Example
    ///
    /// ```text
    /// let adapter = Colonnade::open("/etc/colonnade", Arc::new(cluster))?;
    /// ```
    pub fn open<D: AsRef<Path>>(dir: D, connector: Arc<dyn Connector>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        AdapterConfig::write_default_if_missing(&config_path)?;
        let config = AdapterConfig::from_file(&config_path)?;
        info!(
            target: "colonnade::session",
            path = ?config_path,
            keyspace = %config.keyspace,
            "Loaded adapter configuration"
        );
        Self::new(config, connector)
    }

    /// Document store for type `P`
    pub fn documents<P: Persisted>(&self) -> DocumentStore<P> {
        DocumentStore::new(Arc::clone(&self.registry))
    }

    /// Tenant table registry
    pub fn registry(&self) -> &Arc<TableRegistry> {
        &self.registry
    }

    /// Shared session and statement cache
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Tenant event dispatcher
    pub fn events(&self) -> &TenantEvents {
        &self.events
    }

    /// Adapter settings
    pub fn config(&self) -> &AdapterConfig {
        self.connections.config()
    }

    /// Close the shared session. The next operation reconnects.
    pub fn shutdown(&self) {
        self.connections.shutdown();
    }
}
