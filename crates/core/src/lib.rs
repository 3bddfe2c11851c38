//! Core types for colonnade
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error type hierarchy
//! - AdapterConfig: `colonnade.toml` settings and resolved connection parameters
//! - Persisted / Document: what the adapter stores and which fields are locked
//! - Pager: cursor state for full-table page scans
//! - TableNaming: tenant → table name mapping
//! - stamp: ids and timestamps

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;
pub mod naming;
pub mod pager;
pub mod stamp;

pub use config::{
    AdapterConfig, ConnectionConfig, ContactPoint, SslConfig, StoreFile, TlsMaterial,
    CONFIG_FILE_NAME,
};
pub use document::{Document, Persisted};
pub use error::{Error, Result};
pub use naming::TableNaming;
pub use pager::{Pager, DEFAULT_LIMIT};
