//! Tenant table layout and the statements that provision it
//!
//! Every tenant table has the same shape:
//!
//! ```text
//! id           text PRIMARY KEY
//! json         text     -- document as created, or as last fully rewritten
//! json_updates text     -- non-locked fields written by later updates
//! ```

use tracing::info;

use colonnade_core::{AdapterConfig, Result};
use colonnade_storage::{Query, SchemaChange, Session, TableRef};

/// Primary key column
pub const KEY_COLUMN: &str = "id";
/// Base payload column
pub const JSON_COLUMN: &str = "json";
/// Delta payload column
pub const UPDATES_COLUMN: &str = "json_updates";

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}

/// Create the keyspace if missing, then the table if missing.
pub(crate) fn provision(session: &dyn Session, config: &AdapterConfig, table: &TableRef) -> Result<()> {
    if !session.keyspace_exists(&table.keyspace)? {
        session.execute_schema(&SchemaChange::CreateKeyspace {
            name: table.keyspace.clone(),
            replication_factor: config.replication_factor,
        })?;
        info!(
            target: "colonnade::schema",
            keyspace = %table.keyspace,
            replication_factor = config.replication_factor,
            "Created keyspace"
        );
    }
    session.execute_schema(&SchemaChange::CreateTable {
        table: table.clone(),
        key_column: KEY_COLUMN.to_string(),
        columns: columns(&[JSON_COLUMN, UPDATES_COLUMN]),
    })?;
    info!(target: "colonnade::schema", table = %table, "Created table");
    Ok(())
}

/// Drop a table if it exists.
pub(crate) fn drop_table(session: &dyn Session, table: &TableRef) -> Result<()> {
    session.execute_schema(&SchemaChange::DropTable {
        table: table.clone(),
    })?;
    info!(target: "colonnade::schema", table = %table, "Dropped table");
    Ok(())
}

// ============================================================================
// Data statements
// ============================================================================

/// `INSERT INTO t (id, json, json_updates) VALUES (?, ?, ?)`
pub(crate) fn insert_row(table: &TableRef) -> Query {
    Query::Insert {
        table: table.clone(),
        columns: columns(&[KEY_COLUMN, JSON_COLUMN, UPDATES_COLUMN]),
    }
}

/// `UPDATE t SET json_updates = ? WHERE id = ?`
pub(crate) fn update_delta(table: &TableRef) -> Query {
    Query::Update {
        table: table.clone(),
        set: columns(&[UPDATES_COLUMN]),
        key_column: KEY_COLUMN.to_string(),
    }
}

/// `UPDATE t SET json = ?, json_updates = ? WHERE id = ?`
pub(crate) fn rewrite_row(table: &TableRef) -> Query {
    Query::Update {
        table: table.clone(),
        set: columns(&[JSON_COLUMN, UPDATES_COLUMN]),
        key_column: KEY_COLUMN.to_string(),
    }
}

/// `SELECT json, json_updates FROM t WHERE id = ?`
pub(crate) fn select_row(table: &TableRef) -> Query {
    Query::Select {
        table: table.clone(),
        columns: columns(&[JSON_COLUMN, UPDATES_COLUMN]),
        key_column: Some(KEY_COLUMN.to_string()),
    }
}

/// `SELECT id, json, json_updates FROM t`
pub(crate) fn scan_rows(table: &TableRef) -> Query {
    Query::Select {
        table: table.clone(),
        columns: columns(&[KEY_COLUMN, JSON_COLUMN, UPDATES_COLUMN]),
        key_column: None,
    }
}

/// `DELETE FROM t WHERE id = ?`
pub(crate) fn delete_row(table: &TableRef) -> Query {
    Query::Delete {
        table: table.clone(),
        key_column: KEY_COLUMN.to_string(),
    }
}
