// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;

#[test]
fn uuid_gen_creates_unique_ids() {
    let id_gen = UuidIdGen;
    let id1 = id_gen.next();
    let id2 = id_gen.next();
    assert_ne!(id1, id2);
    assert_eq!(id1.len(), 36); // UUID format
}

#[test]
fn sequential_gen_creates_predictable_ids() {
    let id_gen = SequentialIdGen::new("evt");
    assert_eq!(id_gen.next(), "evt-1");
    assert_eq!(id_gen.next(), "evt-2");
    assert_eq!(id_gen.next(), "evt-3");
}

#[test]
fn sequential_gen_is_shared_across_threads() {
    let id_gen = SequentialIdGen::new("t");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let id_gen = id_gen.clone();
            std::thread::spawn(move || (0..250).map(|_| id_gen.next()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate id");
        }
    }
    assert_eq!(seen.len(), 1000);
}

use proptest::prelude::*;

proptest! {
    #[test]
    fn uuid_ids_never_repeat(count in 1usize..200) {
        let id_gen = UuidIdGen;
        let ids: HashSet<String> = (0..count).map(|_| id_gen.next()).collect();
        prop_assert_eq!(ids.len(), count);
    }
}
