//! In-process wide-column store
//!
//! `MemoryCluster` implements [`Connector`] and [`Session`] entirely in
//! memory. It behaves like a small partitioned store:
//!
//! - keyspaces hold tables; every table has a text primary key and text columns
//! - `INSERT` and `UPDATE` are upserts, `DELETE` of a missing row is a no-op
//! - preparing a statement against a missing table fails
//! - scans run in token order and page with opaque tokens
//! - batches are validated up front, then applied under the write locks of
//!   every table they touch, so they land all-or-nothing
//!
//! Cluster state outlives sessions: closing a session and connecting again
//! sees the same data.
//!
//! # Fault Injection
//!
//! `set_available(false)` makes `connect` and every call on an open session
//! fail with `Error::Connection`, which is how tests drive the adapter's
//! degraded and fail-fast paths.
//!
//! # Example
//!
//! ```ignore
//! let cluster = MemoryCluster::new();
//! let session = cluster.connect(&AdapterConfig::default().connection_config())?;
//! session.execute_schema(&SchemaChange::CreateKeyspace { name: "ks".into(), replication_factor: 1 })?;
//! ```

mod paging;
mod table;

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use colonnade_core::{ConnectionConfig, Error, Result};

use crate::result::{ResultSet, Row};
use crate::session::{Connector, Session};
use crate::statement::{
    Batch, BoundStatement, PreparedStatement, Query, SchemaChange, TableRef,
};
use table::Table;

#[derive(Default)]
struct ClusterState {
    /// keyspace -> replication factor
    keyspaces: DashMap<String, u32>,
    tables: DashMap<TableRef, Arc<Table>>,
    credentials: RwLock<Option<(String, String)>>,
    unavailable: AtomicBool,
    next_statement_id: AtomicU64,
    connects: AtomicU64,
    prepares: AtomicU64,
    requests: AtomicU64,
}

impl ClusterState {
    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Acquire) {
            Err(Error::connection("All host(s) tried for query failed"))
        } else {
            Ok(())
        }
    }

    fn table(&self, table: &TableRef) -> Result<Arc<Table>> {
        if !self.keyspaces.contains_key(&table.keyspace) {
            return Err(Error::NoSuchKeyspace(table.keyspace.clone()));
        }
        self.tables
            .get(table)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::NoSuchTable {
                keyspace: table.keyspace.clone(),
                table: table.table.clone(),
            })
    }
}

/// In-memory cluster; cheap to clone, clones share state.
#[derive(Clone, Default)]
pub struct MemoryCluster {
    state: Arc<ClusterState>,
}

impl MemoryCluster {
    /// Empty cluster accepting any credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Require these credentials on connect
    pub fn with_credentials(self, user: impl Into<String>, password: impl Into<String>) -> Self {
        *self.state.credentials.write() = Some((user.into(), password.into()));
        self
    }

    /// Take the cluster down (`false`) or bring it back (`true`)
    pub fn set_available(&self, available: bool) {
        self.state.unavailable.store(!available, Ordering::Release);
    }

    /// True unless taken down with `set_available(false)`
    pub fn is_available(&self) -> bool {
        !self.state.unavailable.load(Ordering::Acquire)
    }

    /// Successful connects so far
    pub fn connect_count(&self) -> u64 {
        self.state.connects.load(Ordering::Relaxed)
    }

    /// Statements prepared so far
    pub fn prepare_count(&self) -> u64 {
        self.state.prepares.load(Ordering::Relaxed)
    }

    /// Requests (executes, batches, schema changes) received so far
    pub fn request_count(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }

    /// Replication factor of a keyspace, if it exists
    pub fn keyspace_replication(&self, keyspace: &str) -> Option<u32> {
        self.state.keyspaces.get(keyspace).map(|rf| *rf)
    }

    /// Table names in a keyspace, sorted
    pub fn table_names(&self, keyspace: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .tables
            .iter()
            .filter(|entry| entry.key().keyspace == keyspace)
            .map(|entry| entry.key().table.clone())
            .collect();
        names.sort();
        names
    }

    /// Rows in a table (0 if it does not exist)
    pub fn row_count(&self, table: &TableRef) -> usize {
        self.state
            .tables
            .get(table)
            .map(|t| t.len())
            .unwrap_or(0)
    }

    /// Every column of a row, key first
    pub fn raw_row(&self, table: &TableRef, key: &str) -> Option<Row> {
        self.state.tables.get(table).and_then(|t| t.full_row(key))
    }
}

impl Connector for MemoryCluster {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Session>> {
        self.state.check_available()?;
        if config.contact_points.is_empty() {
            return Err(Error::connection("no contact points configured"));
        }
        if let Some((user, password)) = self.state.credentials.read().as_ref() {
            if *user != config.user || *password != config.password {
                return Err(Error::connection(format!(
                    "authentication failed for user '{}'",
                    config.user
                )));
            }
        }
        self.state.connects.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(MemorySession {
            state: Arc::clone(&self.state),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Session on a [`MemoryCluster`]
pub struct MemorySession {
    state: Arc<ClusterState>,
    closed: AtomicBool,
}

impl MemorySession {
    fn guard(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::connection("session is closed"));
        }
        self.state.check_available()
    }

    fn execute_select(&self, statement: &BoundStatement, table: &Table) -> Result<ResultSet> {
        let Query::Select {
            table: table_ref,
            columns,
            ..
        } = statement.query()
        else {
            return Err(Error::backend("not a SELECT"));
        };

        if let Some(key) = table.row_key(statement)? {
            let rows = table.select_one(&key, columns).into_iter().collect();
            return Ok(ResultSet::new(rows, None));
        }

        let after = statement
            .paging_state()
            .map(|state| paging::decode(table_ref, state))
            .transpose()?;
        let (rows, last) = table.scan(after.as_ref(), statement.page_size(), columns);
        let next = last.map(|position| paging::encode(table_ref, &position));
        Ok(ResultSet::new(rows, next))
    }
}

impl Session for MemorySession {
    fn prepare(&self, query: &Query) -> Result<PreparedStatement> {
        self.guard()?;
        let table = self.state.table(query.table())?;
        table.check_columns(query)?;
        self.state.prepares.fetch_add(1, Ordering::Relaxed);
        let id = self.state.next_statement_id.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(target: "colonnade::memory", id, cql = %query, "Prepared statement");
        Ok(PreparedStatement::new(id, query.clone()))
    }

    fn execute(&self, statement: &BoundStatement) -> Result<ResultSet> {
        self.guard()?;
        self.state.requests.fetch_add(1, Ordering::Relaxed);
        let table = self.state.table(statement.query().table())?;

        if !statement.query().is_write() {
            return self.execute_select(statement, &table);
        }

        let key = table
            .row_key(statement)?
            .ok_or_else(|| Error::backend("write without a row key"))?;
        let mut rows = table.rows.write();
        table.apply(&mut rows, statement.query(), &key, statement.values());
        Ok(ResultSet::empty())
    }

    fn execute_batch(&self, batch: &Batch) -> Result<()> {
        self.guard()?;
        self.state.requests.fetch_add(1, Ordering::Relaxed);
        if batch.is_empty() {
            return Ok(());
        }

        // Validate everything before touching any row
        let mut tables: BTreeMap<TableRef, Arc<Table>> = BTreeMap::new();
        let mut keys = Vec::with_capacity(batch.len());
        for statement in batch.statements() {
            if !statement.query().is_write() {
                return Err(Error::backend("SELECT statements are not allowed in a batch"));
            }
            let table_ref = statement.query().table();
            let table = match tables.get(table_ref) {
                Some(t) => Arc::clone(t),
                None => {
                    let t = self.state.table(table_ref)?;
                    tables.insert(table_ref.clone(), Arc::clone(&t));
                    t
                }
            };
            let key = table
                .row_key(statement)?
                .ok_or_else(|| Error::backend("write without a row key"))?;
            keys.push(key);
        }

        // Lock tables in a fixed order, then apply
        let mut guards: BTreeMap<&TableRef, _> = tables
            .iter()
            .map(|(table_ref, table)| (table_ref, table.rows.write()))
            .collect();
        for (statement, key) in batch.statements().iter().zip(&keys) {
            let table_ref = statement.query().table();
            if let (Some(table), Some(rows)) = (tables.get(table_ref), guards.get_mut(table_ref)) {
                table.apply(rows, statement.query(), key, statement.values());
            }
        }
        Ok(())
    }

    fn execute_schema(&self, change: &SchemaChange) -> Result<()> {
        self.guard()?;
        self.state.requests.fetch_add(1, Ordering::Relaxed);
        match change {
            SchemaChange::CreateKeyspace {
                name,
                replication_factor,
            } => {
                self.state
                    .keyspaces
                    .entry(name.clone())
                    .or_insert(*replication_factor);
            }
            SchemaChange::CreateTable {
                table,
                key_column,
                columns,
            } => {
                if !self.state.keyspaces.contains_key(&table.keyspace) {
                    return Err(Error::NoSuchKeyspace(table.keyspace.clone()));
                }
                self.state
                    .tables
                    .entry(table.clone())
                    .or_insert_with(|| Arc::new(Table::new(key_column.clone(), columns.clone())));
            }
            SchemaChange::DropTable { table } => {
                if !self.state.keyspaces.contains_key(&table.keyspace) {
                    return Err(Error::NoSuchKeyspace(table.keyspace.clone()));
                }
                self.state.tables.remove(table);
            }
        }
        trace!(target: "colonnade::memory", cql = %change.cql(), "Applied schema change");
        Ok(())
    }

    fn keyspace_exists(&self, keyspace: &str) -> Result<bool> {
        self.guard()?;
        Ok(self.state.keyspaces.contains_key(keyspace))
    }

    fn table_exists(&self, keyspace: &str, table: &str) -> Result<bool> {
        self.guard()?;
        Ok(self
            .state
            .tables
            .contains_key(&TableRef::new(keyspace, table)))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
