//! Backing store session traits
//!
//! The adapter never talks to a database driver directly. A [`Connector`]
//! dials the store and hands back a [`Session`]; everything else goes
//! through the session.
//!
//! # Thread Safety
//!
//! Sessions are shared by every caller in the process and must be
//! `Send + Sync`. `execute` may be called from many threads at once.
//!
//! # Timeouts
//!
//! Request timeouts belong to the driver. A timed-out request surfaces as an
//! ordinary `Error::Connection` or `Error::Backend`.

use std::sync::Arc;

use colonnade_core::{ConnectionConfig, Result};

use crate::result::ResultSet;
use crate::statement::{Batch, BoundStatement, PreparedStatement, Query, SchemaChange};

/// Live connection to the backing store.
pub trait Session: Send + Sync {
    /// Prepare a statement.
    ///
    /// Fails if the statement references a table that does not exist.
    fn prepare(&self, query: &Query) -> Result<PreparedStatement>;

    /// Execute one statement.
    fn execute(&self, statement: &BoundStatement) -> Result<ResultSet>;

    /// Apply write statements all-or-nothing.
    ///
    /// The batch gives atomicity only; concurrent readers may still observe
    /// the rows before or after, never a partial batch.
    fn execute_batch(&self, batch: &Batch) -> Result<()>;

    /// Apply a schema change.
    fn execute_schema(&self, change: &SchemaChange) -> Result<()>;

    /// True if the keyspace is in the schema catalog.
    fn keyspace_exists(&self, keyspace: &str) -> Result<bool>;

    /// True if the table is in the schema catalog.
    fn table_exists(&self, keyspace: &str, table: &str) -> Result<bool>;

    /// Release the connection. Further calls fail with `Error::Connection`.
    fn close(&self);
}

/// Factory for sessions.
pub trait Connector: Send + Sync {
    /// Dial the store.
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Session>>;
}
