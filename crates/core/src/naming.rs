//! Tenant → table naming
//!
//! Every tenant gets its own table, named by a pure function of the tenant
//! identifier:
//!
//! 1. the root tenant, and identifiers that already carry the namespace
//!    prefix (`prefix-` or its normalized form `prefix_`), are kept as is
//! 2. anything else becomes `prefix-tenant`
//! 3. dashes are replaced with underscores
//!
//! `shop` and `colonnade-shop` name the same tenant. Within identifiers
//! accepted by [`TableNaming::is_valid_tenant`] (no underscores, no
//! whitespace) the mapping is otherwise injective, and applying it to its
//! own output is a no-op.

use crate::config::AdapterConfig;

/// Table naming rule for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNaming {
    root_tenant: String,
    prefix: String,
}

impl TableNaming {
    /// Naming rule for the given root tenant and namespace prefix
    pub fn new(root_tenant: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            root_tenant: root_tenant.into(),
            prefix: prefix.into(),
        }
    }

    /// Naming rule taken from the adapter configuration
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(config.root_tenant.clone(), config.namespace_prefix.clone())
    }

    /// The root tenant's identifier
    pub fn root_tenant(&self) -> &str {
        &self.root_tenant
    }

    /// True if `tenant` is the root tenant
    pub fn is_root(&self, tenant: &str) -> bool {
        tenant == self.root_tenant || tenant == normalize(&self.root_tenant)
    }

    /// True for identifiers the adapter will provision a table for.
    pub fn is_valid_tenant(tenant: &str) -> bool {
        !tenant.trim().is_empty() && !tenant.chars().any(|c| c.is_whitespace() || c == '_')
    }

    /// True if documents may be stored under `tenant`: the root tenant, or
    /// any identifier passing [`TableNaming::is_valid_tenant`].
    ///
    /// Underscores are refused because `a-b` and `a_b` would share a table.
    pub fn accepts(&self, tenant: &str) -> bool {
        tenant == self.root_tenant || Self::is_valid_tenant(tenant)
    }

    /// Table name for a tenant, `None` for a blank identifier.
    ///
    /// # Example
    ///
    /// ```rust
    /// use colonnade_core::TableNaming;
    ///
    /// let naming = TableNaming::new("colonnade", "colonnade");
    /// assert_eq!(naming.table_for("my-shop").as_deref(), Some("colonnade_my_shop"));
    /// assert_eq!(naming.table_for("colonnade").as_deref(), Some("colonnade"));
    /// assert_eq!(naming.table_for(" "), None);
    /// ```
    pub fn table_for(&self, tenant: &str) -> Option<String> {
        if tenant.trim().is_empty() {
            return None;
        }
        if self.is_root(tenant) || self.is_prefixed(tenant) {
            Some(normalize(tenant))
        } else {
            Some(normalize(&format!("{}-{}", self.prefix, tenant)))
        }
    }

    fn is_prefixed(&self, tenant: &str) -> bool {
        tenant
            .strip_prefix(self.prefix.as_str())
            .map_or(false, |rest| rest.starts_with('-') || rest.starts_with('_'))
    }
}

fn normalize(name: &str) -> String {
    name.replace('-', "_")
}
