//! Error types for colonnade
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors fall into four classes:
//! - connectivity (`Connection`, `Backend`): the session could not be
//!   established or a statement failed on the backing store
//! - schema (`NoSuchKeyspace`, `NoSuchTable`): the tenant's table is missing;
//!   callers treat these exactly like connectivity errors
//! - payload (`Serialization`, `InvalidPagingState`)
//! - configuration (`InvalidConfig`, `Io`)
//!
//! `WriteFailed` wraps any of the above when fail-fast write mode is enabled.

use std::io;
use thiserror::Error;

/// Result type alias for colonnade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for colonnade
#[derive(Debug, Error)]
pub enum Error {
    /// Session could not be established or was closed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement failed on the backing store
    #[error("Backend error: {0}")]
    Backend(String),

    /// Keyspace does not exist
    #[error("Keyspace not found: {0}")]
    NoSuchKeyspace(String),

    /// Table does not exist in the keyspace
    #[error("Table not found: {keyspace}.{table}")]
    NoSuchTable {
        /// Keyspace that was searched
        keyspace: String,
        /// Missing table
        table: String,
    },

    /// Paging token was not issued by the backend for this scan
    #[error("Invalid paging state: {0}")]
    InvalidPagingState(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is malformed or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A write operation failed while fail-fast mode was enabled
    #[error("DAO write operation failed: {operation}")]
    WriteFailed {
        /// Name of the failed operation (e.g. "create", "update_all")
        operation: &'static str,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Error::Serialization(msg.into())
    }

    /// Create a configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Wrap an error as a failed write
    pub fn write_failed(operation: &'static str, source: Error) -> Self {
        Error::WriteFailed {
            operation,
            source: Box::new(source),
        }
    }

    /// True for errors raised by talking to the backing store
    /// (including a missing keyspace or table).
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Error::Connection(_)
                | Error::Backend(_)
                | Error::NoSuchKeyspace(_)
                | Error::NoSuchTable { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
