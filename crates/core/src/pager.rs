//! Cursor state for full-table page scans
//!
//! `last_key` carries the backing store's own continuation token between
//! calls. The adapter stores and replays it but never looks inside; the only
//! value it interprets is [`Pager::END`].

use serde::{Deserialize, Serialize};

/// Default rows per page
pub const DEFAULT_LIMIT: usize = 30;

/// Paging state for `read_page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    /// Pages fetched so far
    pub page: u64,
    /// Maximum rows per page
    pub limit: usize,
    /// Running total of rows returned
    pub count: u64,
    /// Opaque cursor, or [`Pager::END`] once the scan is exhausted
    pub last_key: Option<String>,
}

impl Pager {
    /// Cursor value marking an exhausted scan
    pub const END: &'static str = "end";

    /// Pager starting at the beginning of the table
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }

    /// Pager with a custom page size (0 is treated as 1)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            page: 0,
            limit: limit.max(1),
            count: 0,
            last_key: None,
        }
    }

    /// True once the scan has returned its last page
    pub fn is_exhausted(&self) -> bool {
        self.last_key.as_deref() == Some(Self::END)
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new()
    }
}
