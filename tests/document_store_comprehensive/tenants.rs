//! Table naming, registry and lifecycle events

use std::sync::Arc;

use colonnade::TableNaming;
use journal::Journal;
use proptest::prelude::*;

use crate::common::*;

// ============================================================================
// Naming
// ============================================================================

#[test]
fn naming_rules() {
    let t = TestAdapter::new();
    let registry = t.adapter.registry();
    assert_eq!(registry.table_for("shop").as_deref(), Some("colonnade_shop"));
    assert_eq!(registry.table_for("my-shop").as_deref(), Some("colonnade_my_shop"));
    assert_eq!(registry.table_for("colonnade").as_deref(), Some("colonnade"));
    assert_eq!(registry.table_for("colonnade-shop").as_deref(), Some("colonnade_shop"));
    assert_eq!(registry.table_for(""), None);
    assert_eq!(registry.table_for("   "), None);
}

#[test]
fn naming_follows_config() {
    let t = TestAdapter::with_config(AdapterConfig {
        root_tenant: "para".into(),
        namespace_prefix: "app".into(),
        ..AdapterConfig::default()
    });
    let registry = t.adapter.registry();
    assert_eq!(registry.table_for("para").as_deref(), Some("para"));
    assert_eq!(registry.table_for("blog").as_deref(), Some("app_blog"));
    assert_eq!(registry.table_for("app-blog").as_deref(), Some("app_blog"));
}

#[test]
fn naming_needs_no_connection() {
    let t = TestAdapter::new();
    t.cluster.set_available(false);
    assert!(t.adapter.registry().table_for("shop").is_some());
    assert_eq!(t.cluster.connect_count(), 0);
}

proptest! {
    #[test]
    fn naming_is_idempotent(tenant in "[a-z0-9][a-z0-9-]{0,20}") {
        prop_assume!(!tenant.starts_with("colonnade"));
        let naming = TableNaming::new("colonnade", "colonnade");
        let once = naming.table_for(&tenant).unwrap();
        let prefixed = format!("colonnade-{}", tenant);
        prop_assert_eq!(naming.table_for(&prefixed), Some(once.clone()));
        prop_assert!(!once.contains('-'));
    }

    #[test]
    fn accepted_tenants_map_to_distinct_tables(
        a in "[a-z0-9][a-z0-9-]{0,12}",
        b in "[a-z0-9][a-z0-9-]{0,12}",
    ) {
        let naming = TableNaming::new("colonnade", "colonnade");
        let strip = |t: &str| t.strip_prefix("colonnade-").unwrap_or(t).to_string();
        prop_assume!(strip(&a) != strip(&b));
        prop_assume!(a != "colonnade" && b != "colonnade");
        prop_assert_ne!(naming.table_for(&a), naming.table_for(&b));
    }
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn create_exists_delete_cycle() {
    let t = TestAdapter::new();
    let registry = t.adapter.registry();
    assert!(!registry.exists("shop"));
    assert!(registry.create("shop"));
    assert!(registry.exists("shop"));
    assert!(!registry.create("shop"), "creating an existing table is a no-op");
    assert!(registry.delete("shop"));
    assert!(!registry.exists("shop"));
    assert!(!registry.delete("shop"), "deleting a missing table is a no-op");
}

#[test]
fn create_refuses_whitespace() {
    let t = TestAdapter::new();
    let registry = t.adapter.registry();
    for bad in ["my shop", " shop", "shop\n", "\t", ""] {
        assert!(!registry.create(bad), "{:?}", bad);
    }
}

#[test]
fn documents_refuse_whitespace_tenants() {
    let t = TestAdapter::fail_fast();
    let store = t.docs();
    let mut d = doc("d1");
    assert_eq!(store.create("my shop", &mut d).unwrap(), None);
    store.create_all("my shop", &mut docs("d", 2)).unwrap();
    store.update("my shop", &mut d).unwrap();

    assert!(store.read("my shop", "d1").is_none());
    assert!(!t.adapter.registry().exists("my shop"));
    assert!(t.cluster.table_names("colonnade").is_empty());
    assert_eq!(t.cluster.connect_count(), 0);
}

#[test]
fn dash_and_underscore_tenants_do_not_share_rows() {
    let t = TestAdapter::new();
    let store = t.docs();
    let mut d = doc("s1").with_name("tenant a-b data");
    store.create("a-b", &mut d).unwrap();

    assert!(store.read("a-b", "s1").is_some());
    assert!(store.read("a_b", "s1").is_none());
    assert!(store.read_all("a_b", &["s1"]).is_empty());
    assert!(store.read_page("a_b", &mut Pager::new()).is_empty());

    let mut intruder = doc("s1").with_name("overwritten");
    assert_eq!(store.create("a_b", &mut intruder).unwrap(), None);
    store.delete("a_b", &d).unwrap();
    assert_eq!(
        store.read("a-b", "s1").unwrap().name.as_deref(),
        Some("tenant a-b data")
    );
}

#[test]
fn keyspace_created_with_configured_replication() {
    let t = TestAdapter::with_config(AdapterConfig {
        keyspace: "docs".into(),
        replication_factor: 3,
        ..AdapterConfig::default()
    });
    assert!(t.adapter.registry().create("shop"));
    assert_eq!(t.cluster.keyspace_replication("docs"), Some(3));
}

#[test]
fn first_write_provisions_table() {
    let t = TestAdapter::new();
    assert!(!t.adapter.registry().exists("fresh"));
    t.docs().create("fresh", &mut doc("d1")).unwrap();
    assert!(t.adapter.registry().exists("fresh"));
}

#[test]
fn explicit_tables_mode_requires_create() {
    let t = TestAdapter::explicit_tables();
    let store = t.docs();
    store.create("shop", &mut doc("d1")).unwrap();
    assert!(!t.adapter.registry().exists("shop"));
    assert!(store.read("shop", "d1").is_none());

    assert!(t.adapter.registry().create("shop"));
    store.create("shop", &mut doc("d1")).unwrap();
    assert!(store.read("shop", "d1").is_some());
}

#[test]
fn dropped_table_loses_its_documents() {
    let t = TestAdapter::new();
    let store = t.docs();
    store.create("shop", &mut doc("d1")).unwrap();
    assert!(t.adapter.registry().delete("shop"));

    store.create("shop", &mut doc("d2")).unwrap();
    assert!(!t.adapter.registry().exists("shop"));

    assert!(t.adapter.registry().create("shop"));
    assert!(store.read("shop", "d1").is_none());
    store.create("shop", &mut doc("d2")).unwrap();
    assert!(store.read("shop", "d2").is_some());
}

// ============================================================================
// Lifecycle events
// ============================================================================

#[test]
fn tenant_events_drive_tables() {
    let t = TestAdapter::new();
    let events = t.adapter.events();
    events.tenant_created(&Tenant::new("blog"));
    assert!(t.adapter.registry().exists("blog"));
    events.tenant_deleted(&Tenant::new("blog"));
    assert!(!t.adapter.registry().exists("blog"));
}

#[test]
fn shared_tenants_get_no_table() {
    let t = TestAdapter::new();
    t.adapter.events().tenant_created(&Tenant::shared("guest"));
    assert!(!t.adapter.registry().exists("guest"));
}

#[test]
fn custom_listeners_run_after_table_provisioning() {
    let t = TestAdapter::new();
    let journal = Arc::new(Journal::new(t.adapter.registry().clone()));
    t.adapter.events().register(journal.clone());

    t.adapter.events().tenant_created(&Tenant::new("blog"));
    t.adapter.events().tenant_deleted(&Tenant::new("blog"));
    assert_eq!(
        journal.entries(),
        vec![("created:blog".to_string(), true), ("deleted:blog".to_string(), false)]
    );
}

mod journal {
    use std::sync::{Arc, Mutex};

    use colonnade::{TableRegistry, Tenant, TenantListener};

    /// Records each event and whether the tenant's table existed when it arrived.
    pub struct Journal {
        registry: Arc<TableRegistry>,
        entries: Mutex<Vec<(String, bool)>>,
    }

    impl Journal {
        pub fn new(registry: Arc<TableRegistry>) -> Self {
            Self {
                registry,
                entries: Mutex::new(Vec::new()),
            }
        }

        pub fn entries(&self) -> Vec<(String, bool)> {
            self.entries.lock().unwrap().clone()
        }
    }

    impl TenantListener for Journal {
        fn on_tenant_created(&self, tenant: &Tenant) {
            let exists = self.registry.exists(&tenant.identifier);
            self.entries
                .lock()
                .unwrap()
                .push((format!("created:{}", tenant.identifier), exists));
        }

        fn on_tenant_deleted(&self, tenant: &Tenant) {
            let exists = self.registry.exists(&tenant.identifier);
            self.entries
                .lock()
                .unwrap()
                .push((format!("deleted:{}", tenant.identifier), exists));
        }
    }
}
