//! Rows, result sets and paging state

use std::fmt;

/// Opaque continuation token for a paged scan.
///
/// Only the backend that issued a token can interpret it. Callers carry it
/// between requests as a string and hand it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PagingState(String);

impl PagingState {
    /// Wrap a token previously obtained from [`PagingState::into_token`]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token as an owned string, for storing between requests
    pub fn into_token(self) -> String {
        self.0
    }
}

impl fmt::Display for PagingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One returned row: column names with nullable text values, in the order
/// the statement asked for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Option<String>)>,
}

impl Row {
    /// Empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a column
    pub fn with(mut self, column: impl Into<String>, value: Option<String>) -> Self {
        self.columns.push((column.into(), value));
        self
    }

    /// Value of a column; `None` if absent or null
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// Rows returned by one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rows: Vec<Row>,
    paging_state: Option<PagingState>,
}

impl ResultSet {
    /// Result with no rows (writes)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result holding `rows`; `paging_state` is set when more rows remain
    pub fn new(rows: Vec<Row>, paging_state: Option<PagingState>) -> Self {
        Self { rows, paging_state }
    }

    /// First row, if any
    pub fn one(self) -> Option<Row> {
        self.rows.into_iter().next()
    }

    /// Rows in this page
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume into rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Resume point for the next page; `None` when the scan is exhausted
    pub fn paging_state(&self) -> Option<&PagingState> {
        self.paging_state.as_ref()
    }

    /// Split into rows and resume point
    pub fn into_parts(self) -> (Vec<Row>, Option<PagingState>) {
        (self.rows, self.paging_state)
    }
}
