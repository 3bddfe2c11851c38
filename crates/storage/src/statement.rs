//! Typed statements for the backing store
//!
//! Statements are built as values rather than strings. Each renders to
//! canonical CQL via [`Query::cql`], which is what drivers prepare and what
//! the statement cache keys on.
//!
//! Bind order:
//! - `Insert`: one value per column, in column order
//! - `Update`: one value per `SET` column, then the row key
//! - `Select`: the row key, if the select is keyed
//! - `Delete`: the row key

use std::fmt;
use std::sync::Arc;

use crate::result::PagingState;

/// Nullable text value bound to a statement
pub type CqlValue = Option<String>;

/// Keyspace-qualified table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    /// Keyspace
    pub keyspace: String,
    /// Table within the keyspace
    pub table: String,
}

impl TableRef {
    /// Reference `keyspace.table`
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.keyspace, self.table)
    }
}

/// Data statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `INSERT INTO t (c1, c2, ..) VALUES (?, ?, ..)`, an upsert
    Insert {
        /// Target table
        table: TableRef,
        /// Columns written, key column included
        columns: Vec<String>,
    },
    /// `UPDATE t SET c1 = ?, .. WHERE key = ?`; creates the row if absent
    Update {
        /// Target table
        table: TableRef,
        /// Columns written
        set: Vec<String>,
        /// Primary key column
        key_column: String,
    },
    /// `SELECT c1, .. FROM t [WHERE key = ?]`
    Select {
        /// Source table
        table: TableRef,
        /// Columns returned
        columns: Vec<String>,
        /// Primary key column for a point lookup; `None` scans the table
        key_column: Option<String>,
    },
    /// `DELETE FROM t WHERE key = ?`
    Delete {
        /// Target table
        table: TableRef,
        /// Primary key column
        key_column: String,
    },
}

impl Query {
    /// Table the statement touches
    pub fn table(&self) -> &TableRef {
        match self {
            Query::Insert { table, .. }
            | Query::Update { table, .. }
            | Query::Select { table, .. }
            | Query::Delete { table, .. } => table,
        }
    }

    /// Number of values the statement expects
    pub fn bind_count(&self) -> usize {
        match self {
            Query::Insert { columns, .. } => columns.len(),
            Query::Update { set, .. } => set.len() + 1,
            Query::Select { key_column, .. } => usize::from(key_column.is_some()),
            Query::Delete { .. } => 1,
        }
    }

    /// True for statements that modify data
    pub fn is_write(&self) -> bool {
        !matches!(self, Query::Select { .. })
    }

    /// Canonical CQL text
    pub fn cql(&self) -> String {
        match self {
            Query::Insert { table, columns } => {
                let marks = vec!["?"; columns.len()].join(", ");
                format!(
                    "INSERT INTO {} ({}) VALUES ({});",
                    table,
                    columns.join(", "),
                    marks
                )
            }
            Query::Update {
                table,
                set,
                key_column,
            } => {
                let assignments: Vec<String> = set.iter().map(|c| format!("{} = ?", c)).collect();
                format!(
                    "UPDATE {} SET {} WHERE {} = ?;",
                    table,
                    assignments.join(", "),
                    key_column
                )
            }
            Query::Select {
                table,
                columns,
                key_column,
            } => match key_column {
                Some(key) => format!(
                    "SELECT {} FROM {} WHERE {} = ?;",
                    columns.join(", "),
                    table,
                    key
                ),
                None => format!("SELECT {} FROM {};", columns.join(", "), table),
            },
            Query::Delete { table, key_column } => {
                format!("DELETE FROM {} WHERE {} = ?;", table, key_column)
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cql())
    }
}

/// Schema statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChange {
    /// `CREATE KEYSPACE IF NOT EXISTS`
    CreateKeyspace {
        /// Keyspace name
        name: String,
        /// SimpleStrategy replication factor
        replication_factor: u32,
    },
    /// `CREATE TABLE IF NOT EXISTS` with a text primary key and text columns
    CreateTable {
        /// Table to create
        table: TableRef,
        /// Primary key column
        key_column: String,
        /// Non-key columns
        columns: Vec<String>,
    },
    /// `DROP TABLE IF EXISTS`
    DropTable {
        /// Table to drop
        table: TableRef,
    },
}

impl SchemaChange {
    /// Canonical CQL text
    pub fn cql(&self) -> String {
        match self {
            SchemaChange::CreateKeyspace {
                name,
                replication_factor,
            } => format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = \
                 {{'class': 'SimpleStrategy', 'replication_factor': {}}};",
                name, replication_factor
            ),
            SchemaChange::CreateTable {
                table,
                key_column,
                columns,
            } => {
                let mut defs = vec![format!("{} text PRIMARY KEY", key_column)];
                defs.extend(columns.iter().map(|c| format!("{} text", c)));
                format!("CREATE TABLE IF NOT EXISTS {} ({});", table, defs.join(", "))
            }
            SchemaChange::DropTable { table } => format!("DROP TABLE IF EXISTS {};", table),
        }
    }
}

/// A statement the backend has prepared.
///
/// Cheap to clone; the statement body is shared.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    inner: Arc<PreparedInner>,
}

#[derive(Debug)]
struct PreparedInner {
    id: u64,
    query: Query,
    cql: String,
}

impl PreparedStatement {
    /// Wrap a query the backend accepted under the given statement id
    pub fn new(id: u64, query: Query) -> Self {
        let cql = query.cql();
        Self {
            inner: Arc::new(PreparedInner { id, query, cql }),
        }
    }

    /// Backend-assigned statement id
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The prepared query
    pub fn query(&self) -> &Query {
        &self.inner.query
    }

    /// CQL text
    pub fn cql(&self) -> &str {
        &self.inner.cql
    }

    /// Bind values, producing an executable statement
    pub fn bind(&self, values: Vec<CqlValue>) -> BoundStatement {
        BoundStatement {
            prepared: self.clone(),
            values,
            page_size: None,
            paging_state: None,
        }
    }
}

/// A prepared statement with its values.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    prepared: PreparedStatement,
    values: Vec<CqlValue>,
    page_size: Option<usize>,
    paging_state: Option<PagingState>,
}

impl BoundStatement {
    /// Limit rows returned per request (scans only)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Resume a scan from a state returned by an earlier page
    pub fn with_paging_state(mut self, state: PagingState) -> Self {
        self.paging_state = Some(state);
        self
    }

    /// The underlying prepared statement
    pub fn prepared(&self) -> &PreparedStatement {
        &self.prepared
    }

    /// The statement's query
    pub fn query(&self) -> &Query {
        self.prepared.query()
    }

    /// Bound values
    pub fn values(&self) -> &[CqlValue] {
        &self.values
    }

    /// Requested page size
    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    /// Requested resume point
    pub fn paging_state(&self) -> Option<&PagingState> {
        self.paging_state.as_ref()
    }
}

/// Write statements applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    statements: Vec<BoundStatement>,
}

impl Batch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement
    pub fn add(&mut self, statement: BoundStatement) {
        self.statements.push(statement);
    }

    /// Statements in order
    pub fn statements(&self) -> &[BoundStatement] {
        &self.statements
    }

    /// Number of statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// True if there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
