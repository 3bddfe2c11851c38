//! Document Store Comprehensive Test Suite
//!
//! End-to-end coverage of the adapter against the in-memory cluster.
//!
//! ## Modules
//!
//! - `crud`: single-document create/read/update/delete
//! - `batch`: create_all / read_all / update_all / delete_all
//! - `paging`: cursor-paged full scans
//! - `tenants`: table naming, registry and lifecycle events
//! - `failures`: degraded and fail-fast behavior when the store is down
//! - `concurrency`: shared session under parallel callers
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test document_store_comprehensive
//! cargo test --test document_store_comprehensive paging::
//! ```

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod crud;
mod paging;
mod tenants;
