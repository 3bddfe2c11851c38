//! Adapter configuration via `colonnade.toml`
//!
//! Everything the adapter needs from its environment lives here: where the
//! backing store is, how to authenticate, the replication factor for new
//! keyspaces, tenant naming, and whether write failures are raised.
//!
//! Connection settings are resolved into a [`ConnectionConfig`] before they
//! reach a connector, so drivers never see the raw file format.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "colonnade.toml";

/// TLS settings for the store connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslConfig {
    /// Enable TLS
    #[serde(default)]
    pub enabled: bool,
    /// Comma-separated protocol list (e.g. "TLSv1.2,TLSv1.3")
    #[serde(default = "default_protocols")]
    pub protocols: String,
    /// Client identity keystore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keystore_path: Option<PathBuf>,
    /// Keystore password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keystore_password: Option<String>,
    /// Trust material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truststore_path: Option<PathBuf>,
    /// Truststore password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truststore_password: Option<String>,
}

fn default_protocols() -> String {
    "TLSv1.3".to_string()
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            protocols: default_protocols(),
            keystore_path: None,
            keystore_password: None,
            truststore_path: None,
            truststore_password: None,
        }
    }
}

/// Adapter configuration loaded from `colonnade.toml`.
///
/// # Example
///
/// ```toml
/// hosts = "10.0.0.1,10.0.0.2"
/// port = 9042
/// keyspace = "colonnade"
/// replication_factor = 3
/// exception_on_write_errors = true
///
/// [ssl]
/// enabled = true
/// truststore_path = "/etc/colonnade/trust.p12"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Comma-separated contact points
    #[serde(default = "default_hosts")]
    pub hosts: String,
    /// Native protocol port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Keyspace that holds every tenant table
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
    /// Username
    #[serde(default)]
    pub user: String,
    /// Password
    #[serde(default)]
    pub password: String,
    /// Replication factor for a newly created keyspace
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,
    /// Raise `Error::WriteFailed` from write operations instead of swallowing
    #[serde(default)]
    pub exception_on_write_errors: bool,
    /// Create a tenant's table on its first write
    #[serde(default = "default_true")]
    pub auto_create_tables: bool,
    /// Identifier of the root (system) tenant
    #[serde(default = "default_root_tenant")]
    pub root_tenant: String,
    /// Prefix prepended to non-root tenant identifiers
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,
    /// TLS settings
    #[serde(default)]
    pub ssl: SslConfig,
}

fn default_hosts() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9042
}

fn default_keyspace() -> String {
    "colonnade".to_string()
}

fn default_replication_factor() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_root_tenant() -> String {
    "colonnade".to_string()
}

fn default_namespace_prefix() -> String {
    "colonnade".to_string()
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            port: default_port(),
            keyspace: default_keyspace(),
            user: String::new(),
            password: String::new(),
            replication_factor: default_replication_factor(),
            exception_on_write_errors: false,
            auto_create_tables: true,
            root_tenant: default_root_tenant(),
            namespace_prefix: default_namespace_prefix(),
            ssl: SslConfig::default(),
        }
    }
}

impl AdapterConfig {
    /// Check settings that would otherwise fail late inside a driver.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty host list, keyspace or prefix,
    /// a zero port, or a zero replication factor.
    pub fn validate(&self) -> Result<()> {
        if self.contact_points().is_empty() {
            return Err(Error::invalid_config("hosts must name at least one host"));
        }
        if self.port == 0 {
            return Err(Error::invalid_config("port must be non-zero"));
        }
        if self.keyspace.trim().is_empty() {
            return Err(Error::invalid_config("keyspace must not be blank"));
        }
        if self.namespace_prefix.trim().is_empty() || self.root_tenant.trim().is_empty() {
            return Err(Error::invalid_config(
                "root_tenant and namespace_prefix must not be blank",
            ));
        }
        if self.replication_factor == 0 {
            return Err(Error::invalid_config("replication_factor must be at least 1"));
        }
        Ok(())
    }

    /// Host list split on commas, trimmed, paired with the port.
    pub fn contact_points(&self) -> Vec<ContactPoint> {
        self.hosts
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|host| ContactPoint {
                host: host.to_string(),
                port: self.port,
            })
            .collect()
    }

    /// Resolve TLS material.
    ///
    /// A keystore implies client identity plus whatever truststore is set; a
    /// truststore alone gives trust material only; neither falls back to the
    /// platform's default trust roots.
    pub fn tls_material(&self) -> Option<TlsMaterial> {
        if !self.ssl.enabled {
            return None;
        }
        let protocols: Vec<String> = self
            .ssl
            .protocols
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();

        let trust = self.ssl.truststore_path.clone().map(|path| StoreFile {
            path,
            password: self.ssl.truststore_password.clone().unwrap_or_default(),
        });

        let material = match (&self.ssl.keystore_path, trust) {
            (Some(keystore), trust) => TlsMaterial::Identity {
                identity: StoreFile {
                    path: keystore.clone(),
                    password: self.ssl.keystore_password.clone().unwrap_or_default(),
                },
                trust,
                protocols,
            },
            (None, Some(trust)) => TlsMaterial::Trust { trust, protocols },
            (None, None) => TlsMaterial::SystemDefault,
        };
        Some(material)
    }

    /// Everything a connector needs to dial the store.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            contact_points: self.contact_points(),
            keyspace: self.keyspace.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            tls: self.tls_material(),
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Colonnade adapter configuration
#
# Contact points (comma separated) and native protocol port
hosts = "localhost"
port = 9042

# Keyspace holding all tenant tables, and its replication factor on creation
keyspace = "colonnade"
replication_factor = 1

# Credentials
user = ""
password = ""

# Raise errors from create/update/delete (and batch forms) instead of
# logging and carrying on (default: false)
exception_on_write_errors = false

# Create a tenant's table on its first write (default: true)
auto_create_tables = true

# Root tenant and the prefix used to name other tenants' tables
root_tenant = "colonnade"
namespace_prefix = "colonnade"

# [ssl]
# enabled = true
# protocols = "TLSv1.3"
# keystore_path = "/etc/colonnade/client.p12"
# keystore_password = ""
# truststore_path = "/etc/colonnade/trust.p12"
# truststore_password = ""
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AdapterConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// A single host:port the connector may dial.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactPoint {
    /// Host name or address
    pub host: String,
    /// Port
    pub port: u16,
}

/// Key or trust store file plus its password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFile {
    /// Path on disk
    pub path: PathBuf,
    /// Password protecting the store
    pub password: String,
}

/// Resolved TLS material handed to a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMaterial {
    /// Platform default trust roots, no client identity
    SystemDefault,
    /// Explicit trust material
    Trust {
        /// Truststore
        trust: StoreFile,
        /// Allowed protocols
        protocols: Vec<String>,
    },
    /// Client identity, optionally with explicit trust material
    Identity {
        /// Keystore
        identity: StoreFile,
        /// Truststore, if configured
        trust: Option<StoreFile>,
        /// Allowed protocols
        protocols: Vec<String>,
    },
}

/// Connection parameters resolved from [`AdapterConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Hosts to dial
    pub contact_points: Vec<ContactPoint>,
    /// Keyspace the session works in
    pub keyspace: String,
    /// Username
    pub user: String,
    /// Password
    pub password: String,
    /// TLS material, `None` when TLS is off
    pub tls: Option<TlsMaterial>,
}
