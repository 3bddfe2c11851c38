//! Storage layer for colonnade
//!
//! This crate is the boundary between the adapter and the wide-column store:
//! - Session / Connector: the traits every backend implements
//! - Query / SchemaChange: typed statements rendering canonical CQL
//! - PreparedStatement / BoundStatement / Batch: what sessions execute
//! - ResultSet / Row / PagingState: what sessions return
//! - MemoryCluster: in-process backend used by tests and embedded setups
//!
//! Nothing above this crate builds CQL strings by hand.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod result;
pub mod session;
pub mod statement;

pub use memory::{MemoryCluster, MemorySession};
pub use result::{PagingState, ResultSet, Row};
pub use session::{Connector, Session};
pub use statement::{
    Batch, BoundStatement, CqlValue, PreparedStatement, Query, SchemaChange, TableRef,
};
