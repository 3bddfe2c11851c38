//! Cursor-paged full scans

use std::collections::HashSet;

use crate::common::*;

const TENANT: &str = "shop";

fn seeded(n: usize) -> TestAdapter {
    let t = TestAdapter::new();
    if n > 0 {
        t.docs().create_all(TENANT, &mut docs("d", n)).unwrap();
    } else {
        assert!(t.adapter.registry().create(TENANT));
    }
    t
}

#[test]
fn every_document_exactly_once() {
    for (n, limit) in [(0, 5), (1, 5), (5, 5), (7, 3), (30, 30), (31, 30), (100, 7)] {
        let t = seeded(n);
        let (all, pager, calls) = drain_pages(&t.docs(), TENANT, limit);

        let ids: HashSet<String> = all.iter().filter_map(|d| d.id.clone()).collect();
        assert_eq!(all.len(), n, "n={} limit={}", n, limit);
        assert_eq!(ids.len(), n, "duplicates with n={} limit={}", n, limit);
        assert_eq!(pager.count, n as u64);
        // non-empty pages plus the final empty call
        assert!(calls <= ((n + limit - 1) / limit).max(1) + 1, "n={} limit={} calls={}", n, limit, calls);
        assert!(pager.is_exhausted());
    }
}

#[test]
fn pages_respect_the_limit() {
    let t = seeded(10);
    let store = t.docs();
    let mut pager = Pager::with_limit(4);
    let sizes: Vec<usize> = (0..4).map(|_| store.read_page(TENANT, &mut pager).len()).collect();
    assert_eq!(sizes, [4, 4, 2, 0]);
    assert_eq!(pager.page, 3);
}

#[test]
fn default_pager_limit() {
    let t = seeded(45);
    let mut pager = Pager::new();
    assert_eq!(pager.limit, colonnade::DEFAULT_LIMIT);
    assert_eq!(t.docs().read_page(TENANT, &mut pager).len(), 30);
    assert_eq!(t.docs().read_page(TENANT, &mut pager).len(), 15);
}

#[test]
fn exhausted_pager_does_not_query() {
    let t = seeded(3);
    let store = t.docs();
    let mut pager = Pager::with_limit(10);
    assert_eq!(store.read_page(TENANT, &mut pager).len(), 3);
    assert_eq!(pager.last_key.as_deref(), Some(Pager::END));

    let requests = t.cluster.request_count();
    let snapshot = pager.clone();
    for _ in 0..3 {
        assert!(store.read_page(TENANT, &mut pager).is_empty());
    }
    assert_eq!(t.cluster.request_count(), requests);
    assert_eq!(pager, snapshot);
}

#[test]
fn cursor_is_opaque_and_replayable() {
    let t = seeded(9);
    let store = t.docs();
    let mut pager = Pager::with_limit(4);
    store.read_page(TENANT, &mut pager);
    let cursor = pager.last_key.clone().unwrap();
    assert_ne!(cursor, Pager::END);

    // a fresh pager carrying the same cursor resumes at the same place
    let mut a = Pager::with_limit(4);
    a.last_key = Some(cursor.clone());
    let mut b = Pager::with_limit(4);
    b.last_key = Some(cursor);
    assert_eq!(store.read_page(TENANT, &mut a), store.read_page(TENANT, &mut b));
}

#[test]
fn pager_state_serializes() {
    let t = seeded(6);
    let store = t.docs();
    let mut pager = Pager::with_limit(4);
    let first = store.read_page(TENANT, &mut pager);

    let saved = serde_json::to_string(&pager).unwrap();
    let mut restored: Pager = serde_json::from_str(&saved).unwrap();
    let second = store.read_page(TENANT, &mut restored);

    assert_eq!(first.len() + second.len(), 6);
    assert_eq!(restored.count, 6);
}

#[test]
fn garbage_cursor_reads_as_empty_page() {
    let t = seeded(3);
    let mut pager = Pager::with_limit(2);
    pager.last_key = Some("definitely-not-a-token".into());
    assert!(t.docs().read_page(TENANT, &mut pager).is_empty());
    assert_eq!(pager.count, 0);
    assert_eq!(pager.page, 0);
}

#[test]
fn cursor_from_another_tenant_is_rejected() {
    let t = TestAdapter::new();
    let store = t.docs();
    store.create_all("a", &mut docs("a", 5)).unwrap();
    store.create_all("b", &mut docs("b", 5)).unwrap();

    let mut pager = Pager::with_limit(2);
    store.read_page("a", &mut pager);
    assert!(store.read_page("b", &mut pager).is_empty());
}

#[test]
fn page_includes_pending_deltas() {
    let t = seeded(1);
    let store = t.docs();
    let mut d = store.read(TENANT, "d0").unwrap();
    d.set_property("seen", true);
    store.update(TENANT, &mut d).unwrap();

    let page = store.read_page(TENANT, &mut Pager::new());
    assert_eq!(page[0].property("seen"), Some(&json!(true)));
}

#[test]
fn tenants_are_isolated() {
    let t = TestAdapter::new();
    let store = t.docs();
    store.create_all("a", &mut docs("a", 4)).unwrap();
    store.create_all("b", &mut docs("b", 2)).unwrap();

    let (a, _, _) = drain_pages(&store, "a", 3);
    let (b, _, _) = drain_pages(&store, "b", 3);
    assert!(a.iter().all(|d| d.appid.as_deref() == Some("a")));
    assert_eq!(a.len(), 4);
    assert_eq!(b.len(), 2);
}
