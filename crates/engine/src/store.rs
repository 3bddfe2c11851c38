//! DocumentStore: tenant-scoped document access
//!
//! ## Design: STATELESS FACADE
//!
//! `DocumentStore` holds only the shared registry (and through it the shared
//! connection manager). Any number of stores, for any document types, can
//! sit on the same adapter.
//!
//! ## Tenant Scoping
//!
//! Every operation takes a tenant id, which picks the table. A blank tenant
//! makes the call a no-op. [`DocumentStore::tenant`] and
//! [`DocumentStore::root`] bind the tenant once.
//!
//! ## Failure Semantics
//!
//! Backend errors are logged under `colonnade::dao` and swallowed:
//! - reads return `None`, an empty map or an empty page
//! - writes return `Ok`, unless `exception_on_write_errors` is set, in which
//!   case they return `Error::WriteFailed` wrapping the cause
//!
//! A stored payload that does not parse is logged and skipped; it never
//! fails the other rows of a batch or a page.
//!
//! ## Updates
//!
//! `update` writes only the non-locked fields, into `json_updates`, without
//! reading the row. `update_all` reads the current rows, merges and rewrites
//! `json` in one batch, clearing `json_updates`.

use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn};

use colonnade_core::{stamp, Error, Pager, Persisted, Result};
use colonnade_storage::{Batch, PagingState, PreparedStatement, Query, Session, TableRef};

use crate::codec::{self, FieldFilter};
use crate::connection::ConnectionManager;
use crate::registry::TableRegistry;
use crate::schema::{self, JSON_COLUMN, KEY_COLUMN, UPDATES_COLUMN};

/// Create/read/update/delete and paged scans for one document type.
///
/// # Example
///
/// ```ignore
/// let docs: DocumentStore<Document> = adapter.documents();
/// let mut lamp = Document::new("product").with_name("Lamp");
/// let id = docs.create("shop", &mut lamp)?;
/// let stored = docs.read("shop", id.as_deref().unwrap_or_default());
/// ```
pub struct DocumentStore<P> {
    registry: Arc<TableRegistry>,
    _doc: PhantomData<fn() -> P>,
}

impl<P> Clone for DocumentStore<P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            _doc: PhantomData,
        }
    }
}

impl<P: Persisted> DocumentStore<P> {
    /// Store over a shared registry
    pub fn new(registry: Arc<TableRegistry>) -> Self {
        Self {
            registry,
            _doc: PhantomData,
        }
    }

    /// The registry this store provisions tables through
    pub fn registry(&self) -> &Arc<TableRegistry> {
        &self.registry
    }

    fn connections(&self) -> &ConnectionManager {
        self.registry.connections()
    }

    fn table(&self, tenant: &str) -> Option<TableRef> {
        self.connections().table_ref(tenant)
    }

    /// Operations bound to one tenant
    pub fn tenant(&self, tenant: impl Into<String>) -> TenantDocuments<'_, P> {
        TenantDocuments {
            store: self,
            tenant: tenant.into(),
        }
    }

    /// Operations bound to the root tenant
    pub fn root(&self) -> TenantDocuments<'_, P> {
        self.tenant(self.connections().naming().root_tenant())
    }

    // ========================================================================
    // Write plumbing
    // ========================================================================

    /// Run a write against `table`, provisioning it first if allowed, and
    /// apply the fail-fast setting to any error.
    fn write<F>(&self, operation: &'static str, tenant: &str, table: &TableRef, f: F) -> Result<()>
    where
        F: FnOnce(&dyn Session) -> Result<()>,
    {
        let result = self
            .registry
            .ensure(table)
            .and_then(|_| self.connections().session())
            .and_then(|session| f(session.as_ref()));

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(
                    target: "colonnade::dao",
                    operation,
                    tenant,
                    table = %table,
                    error = %e,
                    "Write failed"
                );
                if self.connections().config().exception_on_write_errors {
                    Err(Error::write_failed(operation, e))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn prepare(&self, query: &Query) -> Result<PreparedStatement> {
        self.connections().prepare(query)
    }

    /// Fill in id and timestamp if missing, and stamp the tenant.
    fn stamp_new(doc: &mut P, tenant: &str) {
        if doc.key().is_none() {
            doc.set_id(stamp::new_id());
        }
        if doc.timestamp().is_none() {
            doc.set_timestamp(stamp::now_millis());
        }
        doc.set_appid(tenant.to_string());
    }

    // ========================================================================
    // Single-document operations
    // ========================================================================

    /// Insert a document, replacing any row with the same id.
    ///
    /// Assigns an id when the document has none and a creation timestamp
    /// when it has none, and stamps the tenant into `appid`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(id))` - the document's id (written, or failure swallowed)
    /// * `Ok(None)` - blank tenant, nothing done
    /// * `Err(WriteFailed)` - write failed in fail-fast mode
    pub fn create(&self, tenant: &str, doc: &mut P) -> Result<Option<String>> {
        let Some(table) = self.table(tenant) else {
            return Ok(None);
        };
        Self::stamp_new(doc, tenant);
        let id = doc.key().map(str::to_string).unwrap_or_default();
        debug!(target: "colonnade::dao", tenant, id = %id, "create");

        self.write("create", tenant, &table, |session| {
            let json = codec::encode(doc, FieldFilter::All)?;
            let insert = self.prepare(&schema::insert_row(&table))?;
            session.execute(&insert.bind(vec![Some(id.clone()), Some(json), None]))?;
            Ok(())
        })?;
        Ok(Some(id))
    }

    /// Fetch a document by id.
    ///
    /// `None` for a blank tenant or id, a missing row, an unparseable payload
    /// or a backend error.
    pub fn read(&self, tenant: &str, id: &str) -> Option<P> {
        let table = self.table(tenant)?;
        if id.trim().is_empty() {
            return None;
        }
        debug!(target: "colonnade::dao", tenant, id, "read");

        let result = self
            .connections()
            .session()
            .and_then(|session| {
                let select = self.prepare(&schema::select_row(&table))?;
                self.lookup(session.as_ref(), &select, id)
            });
        match result {
            Ok(doc) => doc,
            Err(e) => {
                error!(target: "colonnade::dao", tenant, id, error = %e, "Read failed");
                None
            }
        }
    }

    /// One keyed lookup. Backend errors are returned; a bad payload is
    /// logged and reads as missing.
    fn lookup(&self, session: &dyn Session, select: &PreparedStatement, id: &str) -> Result<Option<P>> {
        let row = session
            .execute(&select.bind(vec![Some(id.to_string())]))?
            .one();
        let Some(row) = row else {
            return Ok(None);
        };
        match codec::decode(row.get(JSON_COLUMN), row.get(UPDATES_COLUMN)) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(target: "colonnade::dao", id, error = %e, "Skipping unreadable row");
                Ok(None)
            }
        }
    }

    /// Write the non-locked fields of `doc` as the row's delta.
    ///
    /// Stamps `updated` with the current time, never earlier than the
    /// document's previous `updated` or its `timestamp`. Locked fields are
    /// not written, so values set at creation survive.
    ///
    /// The floor comes from `doc` as passed in, not from the stored row. A
    /// document built without `updated`, or by a writer whose clock runs
    /// behind, can stamp a value earlier than the one already stored.
    pub fn update(&self, tenant: &str, doc: &mut P) -> Result<()> {
        let Some(table) = self.table(tenant) else {
            return Ok(());
        };
        let Some(id) = doc.key().map(str::to_string) else {
            return Ok(());
        };
        doc.set_updated(stamp::next_updated(doc.updated(), doc.timestamp()));
        debug!(target: "colonnade::dao", tenant, id = %id, "update");

        self.write("update", tenant, &table, |session| {
            let delta = codec::encode(doc, FieldFilter::SkipLocked)?;
            let update = self.prepare(&schema::update_delta(&table))?;
            session.execute(&update.bind(vec![Some(delta), Some(id.clone())]))?;
            Ok(())
        })
    }

    /// Remove a document's row. Deleting a missing id is not an error.
    pub fn delete(&self, tenant: &str, doc: &P) -> Result<()> {
        let Some(table) = self.table(tenant) else {
            return Ok(());
        };
        let Some(id) = doc.key() else {
            return Ok(());
        };
        debug!(target: "colonnade::dao", tenant, id, "delete");

        self.write("delete", tenant, &table, |session| {
            let delete = self.prepare(&schema::delete_row(&table))?;
            session.execute(&delete.bind(vec![Some(id.to_string())]))?;
            Ok(())
        })
    }

    // ========================================================================
    // Batch operations
    // ========================================================================

    /// Insert many documents in one atomic batch.
    ///
    /// Each document gets the same defaulting as [`DocumentStore::create`].
    pub fn create_all(&self, tenant: &str, docs: &mut [P]) -> Result<()> {
        let Some(table) = self.table(tenant) else {
            return Ok(());
        };
        if docs.is_empty() {
            return Ok(());
        }
        for doc in docs.iter_mut() {
            Self::stamp_new(doc, tenant);
        }
        debug!(target: "colonnade::dao", tenant, count = docs.len(), "create_all");

        self.write("create_all", tenant, &table, |session| {
            let insert = self.prepare(&schema::insert_row(&table))?;
            let mut batch = Batch::new();
            for doc in docs.iter() {
                let id = doc.key().map(str::to_string);
                let json = codec::encode(doc, FieldFilter::All)?;
                batch.add(insert.bind(vec![id, Some(json), None]));
            }
            session.execute_batch(&batch)
        })
    }

    /// Fetch many documents at once.
    ///
    /// Lookups run in parallel, one per distinct non-blank id. The result
    /// holds only the ids found, in the order first given. Failed lookups
    /// are logged and omitted.
    pub fn read_all<S>(&self, tenant: &str, ids: &[S]) -> IndexMap<String, P>
    where
        S: AsRef<str> + Sync,
    {
        let Some(table) = self.table(tenant) else {
            return IndexMap::new();
        };
        let ids = distinct_ids(ids);
        if ids.is_empty() {
            return IndexMap::new();
        }
        debug!(target: "colonnade::dao", tenant, count = ids.len(), "read_all");

        let prepared = self
            .connections()
            .session()
            .and_then(|session| Ok((self.prepare(&schema::select_row(&table))?, session)));
        let (select, session) = match prepared {
            Ok(pair) => pair,
            Err(e) => {
                error!(target: "colonnade::dao", tenant, error = %e, "Batch read failed");
                return IndexMap::new();
            }
        };

        self.fan_out(session.as_ref(), &select, &ids)
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(Some(doc)) => Some((id.to_string(), doc)),
                Ok(None) => None,
                Err(e) => {
                    error!(target: "colonnade::dao", tenant, id, error = %e, "Lookup failed");
                    None
                }
            })
            .collect()
    }

    /// One lookup per id on the rayon pool; results come back in input order.
    fn fan_out<'a>(
        &self,
        session: &dyn Session,
        select: &PreparedStatement,
        ids: &[&'a str],
    ) -> Vec<(&'a str, Result<Option<P>>)> {
        ids.par_iter()
            .map(|id| (*id, self.lookup(session, select, id)))
            .collect()
    }

    /// Rewrite existing documents with the non-locked fields of `docs`, in
    /// one atomic batch.
    ///
    /// Documents with no stored row are skipped, not created. Each rewritten
    /// row gets the merged document in `json` and no delta.
    pub fn update_all(&self, tenant: &str, docs: &mut [P]) -> Result<()> {
        let Some(table) = self.table(tenant) else {
            return Ok(());
        };
        if docs.is_empty() {
            return Ok(());
        }
        debug!(target: "colonnade::dao", tenant, count = docs.len(), "update_all");

        self.write("update_all", tenant, &table, |session| {
            let keys: Vec<String> = docs
                .iter()
                .filter_map(|d| d.key().map(str::to_string))
                .collect();
            let select = self.prepare(&schema::select_row(&table))?;
            let mut existing: IndexMap<String, P> = IndexMap::new();
            for (id, result) in self.fan_out(session, &select, &distinct_ids(&keys)) {
                if let Some(doc) = result? {
                    existing.insert(id.to_string(), doc);
                }
            }

            let rewrite = self.prepare(&schema::rewrite_row(&table))?;
            let mut batch = Batch::new();
            for doc in docs.iter_mut() {
                let Some(current) = doc.key().and_then(|id| existing.get(id)) else {
                    continue;
                };
                let updated = stamp::next_updated(current.updated(), current.timestamp());
                let mut merged = codec::merge(current, doc)?;
                merged.set_updated(updated);
                merged.set_appid(tenant.to_string());
                doc.set_updated(updated);

                let id = merged.key().map(str::to_string);
                let json = codec::encode(&merged, FieldFilter::All)?;
                batch.add(rewrite.bind(vec![Some(json), None, id]));
            }
            if batch.is_empty() {
                return Ok(());
            }
            session.execute_batch(&batch)
        })
    }

    /// Remove many documents in one atomic batch.
    pub fn delete_all(&self, tenant: &str, docs: &mut [P]) -> Result<()> {
        let Some(table) = self.table(tenant) else {
            return Ok(());
        };
        if docs.is_empty() {
            return Ok(());
        }
        debug!(target: "colonnade::dao", tenant, count = docs.len(), "delete_all");

        self.write("delete_all", tenant, &table, |session| {
            let delete = self.prepare(&schema::delete_row(&table))?;
            let mut batch = Batch::new();
            for doc in docs.iter_mut() {
                doc.set_appid(tenant.to_string());
                if let Some(id) = doc.key() {
                    batch.add(delete.bind(vec![Some(id.to_string())]));
                }
            }
            if batch.is_empty() {
                return Ok(());
            }
            session.execute_batch(&batch)
        })
    }

    // ========================================================================
    // Paged scan
    // ========================================================================

    /// Next page of a full scan of the tenant's table.
    ///
    /// Fetches at most `pager.limit` rows, resuming from `pager.last_key`.
    /// On success the pager's `page` and `count` advance and `last_key`
    /// holds the store's continuation token, or [`Pager::END`] after the
    /// last page. Once the pager is at the end, returns an empty page
    /// without touching the store.
    ///
    /// Rows come back in the store's scan order.
    pub fn read_page(&self, tenant: &str, pager: &mut Pager) -> Vec<P> {
        let Some(table) = self.table(tenant) else {
            return Vec::new();
        };
        if pager.is_exhausted() {
            return Vec::new();
        }
        debug!(
            target: "colonnade::dao",
            tenant,
            page = pager.page,
            limit = pager.limit,
            "read_page"
        );

        let result = self.connections().session().and_then(|session| {
            let scan = self.prepare(&schema::scan_rows(&table))?;
            let mut bound = scan.bind(Vec::new()).with_page_size(pager.limit.max(1));
            if let Some(token) = pager.last_key.as_deref().filter(|t| !t.trim().is_empty()) {
                bound = bound.with_paging_state(PagingState::from_token(token));
            }
            session.execute(&bound)
        });
        let (rows, next) = match result {
            Ok(rs) => rs.into_parts(),
            Err(e) => {
                error!(target: "colonnade::dao", tenant, page = pager.page, error = %e, "Page read failed");
                return Vec::new();
            }
        };

        let docs: Vec<P> = rows
            .iter()
            .filter_map(|row| match codec::decode(row.get(JSON_COLUMN), row.get(UPDATES_COLUMN)) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(
                        target: "colonnade::dao",
                        tenant,
                        id = row.get(KEY_COLUMN).unwrap_or_default(),
                        error = %e,
                        "Skipping unreadable row"
                    );
                    None
                }
            })
            .collect();

        pager.page += 1;
        pager.count += docs.len() as u64;
        pager.last_key = Some(
            next.map(PagingState::into_token)
                .unwrap_or_else(|| Pager::END.to_string()),
        );
        docs
    }
}

/// Distinct non-blank ids, first occurrence order
fn distinct_ids<S: AsRef<str>>(ids: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.as_ref())
        .filter(|id| !id.trim().is_empty() && seen.insert(*id))
        .collect()
}

// ============================================================================
// TenantDocuments
// ============================================================================

/// A [`DocumentStore`] with the tenant fixed.
pub struct TenantDocuments<'a, P> {
    store: &'a DocumentStore<P>,
    tenant: String,
}

impl<'a, P: Persisted> TenantDocuments<'a, P> {
    /// The bound tenant
    pub fn tenant_id(&self) -> &str {
        &self.tenant
    }

    /// See [`DocumentStore::create`]
    pub fn create(&self, doc: &mut P) -> Result<Option<String>> {
        self.store.create(&self.tenant, doc)
    }

    /// See [`DocumentStore::read`]
    pub fn read(&self, id: &str) -> Option<P> {
        self.store.read(&self.tenant, id)
    }

    /// See [`DocumentStore::update`]
    pub fn update(&self, doc: &mut P) -> Result<()> {
        self.store.update(&self.tenant, doc)
    }

    /// See [`DocumentStore::delete`]
    pub fn delete(&self, doc: &P) -> Result<()> {
        self.store.delete(&self.tenant, doc)
    }

    /// See [`DocumentStore::create_all`]
    pub fn create_all(&self, docs: &mut [P]) -> Result<()> {
        self.store.create_all(&self.tenant, docs)
    }

    /// See [`DocumentStore::read_all`]
    pub fn read_all<S: AsRef<str> + Sync>(&self, ids: &[S]) -> IndexMap<String, P> {
        self.store.read_all(&self.tenant, ids)
    }

    /// See [`DocumentStore::update_all`]
    pub fn update_all(&self, docs: &mut [P]) -> Result<()> {
        self.store.update_all(&self.tenant, docs)
    }

    /// See [`DocumentStore::delete_all`]
    pub fn delete_all(&self, docs: &mut [P]) -> Result<()> {
        self.store.delete_all(&self.tenant, docs)
    }

    /// See [`DocumentStore::read_page`]
    pub fn read_page(&self, pager: &mut Pager) -> Vec<P> {
        self.store.read_page(&self.tenant, pager)
    }
}
