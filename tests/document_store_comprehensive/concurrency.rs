//! One adapter, many threads

use std::collections::HashSet;
use std::sync::Barrier;
use std::thread;

use crate::common::*;

const THREADS: usize = 8;

#[test]
fn first_use_connects_once() {
    let t = TestAdapter::new();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for i in 0..THREADS {
            let t = &t;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                t.docs().create("shop", &mut doc(&format!("d{}", i))).unwrap();
            });
        }
    });

    assert_eq!(t.cluster.connect_count(), 1);
    assert_eq!(t.row_count("shop"), THREADS);
}

#[test]
fn concurrent_first_writes_to_new_tenants() {
    let t = TestAdapter::new();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for i in 0..THREADS {
            let t = &t;
            let barrier = &barrier;
            s.spawn(move || {
                let tenant = format!("tenant-{}", i % 3);
                barrier.wait();
                t.docs()
                    .create_all(&tenant, &mut docs(&format!("t{}-", i), 5))
                    .unwrap();
            });
        }
    });

    for i in 0..3 {
        let tenant = format!("tenant-{}", i);
        assert!(t.adapter.registry().exists(&tenant));
        let expected = (0..THREADS).filter(|n| n % 3 == i).count() * 5;
        assert_eq!(t.row_count(&tenant), expected);
    }
}

#[test]
fn parallel_creates_and_reads() {
    let t = TestAdapter::new();
    let store = t.docs();
    let ids: Vec<Vec<String>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = store.clone();
                s.spawn(move || {
                    (0..25)
                        .map(|i| {
                            let mut d = anonymous(&format!("n{}", i));
                            let id = store.create("shop", &mut d).unwrap().unwrap();
                            assert!(store.read("shop", &id).is_some());
                            id
                        })
                        .collect::<Vec<String>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let all: HashSet<String> = ids.into_iter().flatten().collect();
    assert_eq!(all.len(), THREADS * 25);
    assert_eq!(t.row_count("shop"), THREADS * 25);
    assert_eq!(t.cluster.connect_count(), 1);
}

#[test]
fn racing_updates_keep_locked_fields() {
    let t = TestAdapter::new();
    let store = t.docs();
    let mut original = doc("d1");
    original.creatorid = Some("alice".into());
    store.create("shop", &mut original).unwrap();

    thread::scope(|s| {
        for i in 0..THREADS {
            let store = store.clone();
            let mut mine = original.clone();
            s.spawn(move || {
                mine.creatorid = Some(format!("thread-{}", i));
                mine.doc_type = Some("hijacked".into());
                mine.set_property("writer", i);
                store.update("shop", &mut mine).unwrap();
            });
        }
    });

    let stored = store.read("shop", "d1").unwrap();
    assert_eq!(stored.creatorid.as_deref(), Some("alice"));
    assert_eq!(stored.doc_type, original.doc_type);
    assert_eq!(stored.timestamp, original.timestamp);
    let writer = stored.property("writer").and_then(|v| v.as_u64()).unwrap();
    assert!((writer as usize) < THREADS);
}

#[test]
fn read_all_during_writes_sees_whole_documents() {
    let t = TestAdapter::new();
    let store = t.docs();
    store.create_all("shop", &mut docs("d", 50)).unwrap();
    let ids: Vec<String> = (0..50).map(|i| format!("d{}", i)).collect();

    thread::scope(|s| {
        let writer = store.clone();
        s.spawn(move || {
            for round in 0..20 {
                let mut batch = docs("d", 50);
                for d in batch.iter_mut() {
                    d.set_property("round", round);
                }
                writer.update_all("shop", &mut batch).unwrap();
            }
        });

        for _ in 0..20 {
            let found = store.read_all("shop", &ids);
            assert_eq!(found.len(), 50);
            for d in found.values() {
                assert_eq!(d.appid.as_deref(), Some("shop"));
                assert!(d.timestamp.is_some());
            }
        }
    });
}

#[test]
fn shutdown_while_in_use_recovers() {
    let t = TestAdapter::new();
    let store = t.docs();
    store.create("shop", &mut doc("d0")).unwrap();

    thread::scope(|s| {
        for i in 0..4 {
            let store = store.clone();
            s.spawn(move || {
                for n in 0..20 {
                    let _ = store.read("shop", "d0");
                    let _ = store.create("shop", &mut doc(&format!("w{}-{}", i, n)));
                }
            });
        }
        for _ in 0..5 {
            t.adapter.shutdown();
        }
    });

    assert!(store.read("shop", "d0").is_some());
    assert!(t.cluster.connect_count() >= 1);
}
