//! Single-document operations

use crate::common::*;

const TENANT: &str = "shop";

// ============================================================================
// create / read
// ============================================================================

#[test]
fn create_generates_id_and_round_trips() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let original = anonymous("lamp");
    let mut doc = original.clone();

    let id = docs.create(TENANT, &mut doc).unwrap().unwrap();
    assert!(!id.trim().is_empty());

    let stored = docs.read(TENANT, &id).unwrap();
    assert_eq!(stored.id.as_deref(), Some(id.as_str()));
    assert!(stored.timestamp.is_some());
    assert_eq!(stored.appid.as_deref(), Some(TENANT));
    assert_eq!(stored.name, original.name);
    assert_eq!(stored.doc_type, original.doc_type);
    assert_eq!(stored.properties, original.properties);
}

#[test]
fn generated_ids_are_unique() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut ids = std::collections::HashSet::new();
    for i in 0..50 {
        let mut doc = anonymous(&format!("n{}", i));
        assert!(ids.insert(docs.create(TENANT, &mut doc).unwrap().unwrap()));
    }
    assert_eq!(t.row_count(TENANT), 50);
}

#[test]
fn create_is_an_upsert() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut first = doc("d1");
    docs.create(TENANT, &mut first).unwrap();
    let mut second = doc("d1").with_name("replacement");
    docs.create(TENANT, &mut second).unwrap();

    assert_eq!(t.row_count(TENANT), 1);
    assert_eq!(docs.read(TENANT, "d1").unwrap().name.as_deref(), Some("replacement"));
}

#[test]
fn create_replaces_pending_delta() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut d = doc("d1");
    docs.create(TENANT, &mut d).unwrap();
    d.name = Some("edited".into());
    docs.update(TENANT, &mut d).unwrap();

    let mut fresh = doc("d1").with_name("fresh");
    docs.create(TENANT, &mut fresh).unwrap();
    assert_eq!(docs.read(TENANT, "d1").unwrap().name.as_deref(), Some("fresh"));
}

#[test]
fn read_missing_or_blank_is_none() {
    let t = TestAdapter::new();
    let docs = t.docs();
    assert!(docs.read(TENANT, "nope").is_none());
    assert!(docs.read(TENANT, "").is_none());
    assert!(docs.read("", "nope").is_none());
}

#[test]
fn read_of_unprovisioned_tenant_is_none() {
    let t = TestAdapter::new();
    assert!(t.docs().read("never-written", "x").is_none());
}

// ============================================================================
// update
// ============================================================================

#[test]
fn update_keeps_timestamp_and_advances_updated() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut d = doc("d1");
    docs.create(TENANT, &mut d).unwrap();
    let created = d.timestamp.unwrap();

    let mut previous = i64::MIN;
    for round in 0..5 {
        d.set_property("round", round);
        docs.update(TENANT, &mut d).unwrap();
        let stored = docs.read(TENANT, "d1").unwrap();
        assert_eq!(stored.timestamp, Some(created));
        let updated = stored.updated.unwrap();
        assert!(updated >= previous);
        assert!(updated >= created);
        assert_eq!(stored.property("round"), Some(&json!(round)));
        previous = updated;
    }
}

#[test]
fn updated_never_goes_backwards() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut d = doc("d1");
    docs.create(TENANT, &mut d).unwrap();

    let future = a_day_from_now();
    d.set_updated(future);
    docs.update(TENANT, &mut d).unwrap();
    assert_eq!(docs.read(TENANT, "d1").unwrap().updated, Some(future));
}

#[test]
fn updated_floor_comes_from_the_callers_copy() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut d = doc("d1");
    docs.create(TENANT, &mut d).unwrap();

    let future = a_day_from_now();
    d.set_updated(future);
    docs.update(TENANT, &mut d).unwrap();

    // a copy that never saw the stored `updated` floors on its own timestamp
    let mut partial = doc("d1");
    partial.timestamp = d.timestamp;
    docs.update(TENANT, &mut partial).unwrap();
    let stored = docs.read(TENANT, "d1").unwrap().updated.unwrap();
    assert!(stored < future);
    assert_eq!(Some(stored), partial.updated);
}

fn a_day_from_now() -> i64 {
    colonnade::stamp::now_millis() + 86_400_000
}

#[test]
fn update_never_overwrites_locked_fields() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut d = doc("d1");
    d.parentid = Some("parent-a".into());
    d.creatorid = Some("alice".into());
    docs.create(TENANT, &mut d).unwrap();
    let original = docs.read(TENANT, "d1").unwrap();

    let mut tampered = d.clone();
    tampered.doc_type = Some("admin".into());
    tampered.parentid = Some("parent-b".into());
    tampered.creatorid = Some("mallory".into());
    tampered.appid = Some("other-tenant".into());
    tampered.timestamp = Some(0);
    tampered.name = Some("renamed".into());
    docs.update(TENANT, &mut tampered).unwrap();

    let stored = docs.read(TENANT, "d1").unwrap();
    assert_eq!(stored.name.as_deref(), Some("renamed"));
    assert_eq!(stored.id, original.id);
    assert_eq!(stored.doc_type, original.doc_type);
    assert_eq!(stored.parentid, original.parentid);
    assert_eq!(stored.creatorid, original.creatorid);
    assert_eq!(stored.appid, original.appid);
    assert_eq!(stored.timestamp, original.timestamp);
}

#[test]
fn later_delta_wins() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut d = doc("d1");
    docs.create(TENANT, &mut d).unwrap();

    let mut a = d.clone();
    a.set_property("color", "red");
    let mut b = d.clone();
    b.set_property("size", "xl");
    docs.update(TENANT, &mut a).unwrap();
    docs.update(TENANT, &mut b).unwrap();

    let stored = docs.read(TENANT, "d1").unwrap();
    assert_eq!(stored.property("size"), Some(&json!("xl")));
    assert_eq!(stored.property("color"), None);
}

#[test]
fn update_without_id_does_nothing() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut d = anonymous("x");
    docs.update(TENANT, &mut d).unwrap();
    assert!(d.id.is_none());
    assert_eq!(t.cluster.request_count(), 0);
}

// ============================================================================
// delete
// ============================================================================

#[test]
fn delete_then_read_is_none() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let mut d = doc("d1");
    docs.create(TENANT, &mut d).unwrap();
    docs.delete(TENANT, &d).unwrap();
    assert!(docs.read(TENANT, "d1").is_none());
    assert_eq!(t.row_count(TENANT), 0);
}

#[test]
fn delete_is_idempotent() {
    let t = TestAdapter::fail_fast();
    let docs = t.docs();
    docs.delete(TENANT, &doc("ghost")).unwrap();
    docs.delete(TENANT, &doc("ghost")).unwrap();
    docs.delete(TENANT, &anonymous("no id")).unwrap();
}

// ============================================================================
// root tenant handles
// ============================================================================

#[test]
fn root_handle_uses_root_table() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let root = docs.root();
    let mut d = doc("r1");
    root.create(&mut d).unwrap();

    assert_eq!(root.tenant_id(), "colonnade");
    assert_eq!(t.row_count("colonnade"), 1);
    assert!(root.read("r1").is_some());
    root.delete(&d).unwrap();
    assert!(root.read("r1").is_none());
}

#[test]
fn tenant_handle_matches_explicit_calls() {
    let t = TestAdapter::new();
    let docs = t.docs();
    let shop = docs.tenant(TENANT);
    let mut d = doc("d1");
    shop.create(&mut d).unwrap();
    assert_eq!(shop.read("d1"), docs.read(TENANT, "d1"));
    d.name = Some("changed".into());
    shop.update(&mut d).unwrap();
    assert_eq!(docs.read(TENANT, "d1").unwrap().name.as_deref(), Some("changed"));
}
