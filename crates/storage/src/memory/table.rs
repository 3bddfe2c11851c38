//! In-memory table
//!
//! Rows are kept in a `BTreeMap` ordered by `(xxh3(key), key)`, which plays
//! the role of a partitioner token: scan order is stable but unrelated to
//! key order. Only non-null, non-key columns are stored.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use xxhash_rust::xxh3::xxh3_64;

use colonnade_core::{Error, Result};

use crate::result::Row;
use crate::statement::{BoundStatement, CqlValue, Query};

/// Position of a row in scan order
pub(crate) type ScanKey = (u64, String);

/// Non-null, non-key column values of one row
pub(crate) type StoredRow = HashMap<String, String>;

/// Rows of one table, in scan order
pub(crate) type Rows = BTreeMap<ScanKey, StoredRow>;

/// Scan position of a row key
pub(crate) fn scan_key(key: &str) -> ScanKey {
    (xxh3_64(key.as_bytes()), key.to_string())
}

#[derive(Debug)]
pub(crate) struct Table {
    key_column: String,
    columns: Vec<String>,
    pub(crate) rows: RwLock<Rows>,
}

impl Table {
    pub(crate) fn new(key_column: String, columns: Vec<String>) -> Self {
        Self {
            key_column,
            columns,
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn has_column(&self, column: &str) -> bool {
        column == self.key_column || self.columns.iter().any(|c| c == column)
    }

    /// Check that every column a query names exists.
    pub(crate) fn check_columns(&self, query: &Query) -> Result<()> {
        let (named, key): (&[String], Option<&String>) = match query {
            Query::Insert { columns, .. } => (columns.as_slice(), None),
            Query::Update {
                set, key_column, ..
            } => (set.as_slice(), Some(key_column)),
            Query::Select {
                columns,
                key_column,
                ..
            } => (columns.as_slice(), key_column.as_ref()),
            Query::Delete { key_column, .. } => (&[], Some(key_column)),
        };
        if let Some(key) = key {
            if *key != self.key_column {
                return Err(Error::backend(format!(
                    "{} is not the primary key of {}",
                    key,
                    query.table()
                )));
            }
        }
        if let Query::Insert { columns, .. } = query {
            if !columns.iter().any(|c| *c == self.key_column) {
                return Err(Error::backend(format!(
                    "missing primary key column {} in INSERT",
                    self.key_column
                )));
            }
        }
        match named.iter().find(|c| !self.has_column(c)) {
            Some(unknown) => Err(Error::backend(format!(
                "undefined column name {} in table {}",
                unknown,
                query.table()
            ))),
            None => Ok(()),
        }
    }

    /// Validate a bound statement and return the row key it addresses, if any.
    pub(crate) fn row_key(&self, statement: &BoundStatement) -> Result<Option<String>> {
        let query = statement.query();
        let values = statement.values();
        if values.len() != query.bind_count() {
            return Err(Error::backend(format!(
                "expected {} bound values, got {}",
                query.bind_count(),
                values.len()
            )));
        }
        let key = match query {
            Query::Insert { columns, .. } => {
                let position = columns
                    .iter()
                    .position(|c| *c == self.key_column)
                    .ok_or_else(|| Error::backend("missing primary key column in INSERT"))?;
                Some(values[position].clone())
            }
            Query::Update { .. } | Query::Delete { .. } => values.last().cloned(),
            Query::Select { key_column, .. } => key_column.as_ref().map(|_| values[0].clone()),
        };
        match key {
            Some(Some(k)) => Ok(Some(k)),
            Some(None) => Err(Error::backend("invalid null value for primary key")),
            None => Ok(None),
        }
    }

    /// Apply a validated write to `rows`.
    ///
    /// `rows` is this table's row map, already write-locked by the caller.
    pub(crate) fn apply(&self, rows: &mut Rows, query: &Query, key: &str, values: &[CqlValue]) {
        match query {
            Query::Insert { columns, .. } => {
                let row = rows.entry(scan_key(key)).or_default();
                for (column, value) in columns.iter().zip(values) {
                    if *column != self.key_column {
                        set_column(row, column, value);
                    }
                }
            }
            Query::Update { set, .. } => {
                let row = rows.entry(scan_key(key)).or_default();
                for (column, value) in set.iter().zip(values) {
                    set_column(row, column, value);
                }
            }
            Query::Delete { .. } => {
                rows.remove(&scan_key(key));
            }
            Query::Select { .. } => {}
        }
    }

    /// Point lookup
    pub(crate) fn select_one(&self, key: &str, columns: &[String]) -> Option<Row> {
        let rows = self.rows.read();
        rows.get(&scan_key(key))
            .map(|stored| self.project(key, stored, columns))
    }

    /// Scan in token order starting after `after`, returning at most `limit`
    /// rows plus the position of the last row when more remain.
    pub(crate) fn scan(
        &self,
        after: Option<&ScanKey>,
        limit: Option<usize>,
        columns: &[String],
    ) -> (Vec<Row>, Option<ScanKey>) {
        let rows = self.rows.read();
        let lower = match after {
            Some(position) => Bound::Excluded(position.clone()),
            None => Bound::Unbounded,
        };
        let mut iter = rows.range((lower, Bound::Unbounded));
        let limit = limit.unwrap_or(usize::MAX);

        let mut page = Vec::new();
        let mut last = None;
        for (position, stored) in iter.by_ref().take(limit) {
            page.push(self.project(&position.1, stored, columns));
            last = Some(position.clone());
        }
        let more = iter.next().is_some();
        (page, if more { last } else { None })
    }

    /// All columns of a row, key first, for inspection
    pub(crate) fn full_row(&self, key: &str) -> Option<Row> {
        let mut columns = vec![self.key_column.clone()];
        columns.extend(self.columns.iter().cloned());
        self.select_one(key, &columns)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.read().len()
    }

    fn project(&self, key: &str, stored: &StoredRow, columns: &[String]) -> Row {
        columns.iter().fold(Row::new(), |row, column| {
            let value = if *column == self.key_column {
                Some(key.to_string())
            } else {
                stored.get(column).cloned()
            };
            row.with(column.clone(), value)
        })
    }
}

fn set_column(row: &mut StoredRow, column: &str, value: &CqlValue) {
    match value {
        Some(v) => {
            row.insert(column.to_string(), v.clone());
        }
        None => {
            row.remove(column);
        }
    }
}
