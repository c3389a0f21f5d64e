#![cfg(test)]

// Property tests for DualHash kept inside the crate so they can check the
// internal table invariants after every step.

use crate::dual_hash::DualHash;
use crate::table::MIN_ORDER;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations: indices shrink toward earlier keys and the key
// pool itself shrinks, which keeps failing cases small.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Mutate(usize, i32),
    Peek,
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{1,6}", 1..=120).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            4 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Peek),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..400).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants checked after every operation:
// - `len` equals the model's distinct key count.
// - `insert` reports the displaced entry exactly when the model had the key.
// - `remove` returns the owned `(K, V)` the model held.
// - `iter` yields each live key once; key set equals the model's.
// - Robin Hood ordering, stored hashes and the low-water cursor in both
//   tables; no key lives in both tables; neither table is ever full.
// - At most one entry migrates per call.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: DualHash<String, i32> = DualHash::new();
        let mut model: HashMap<String, i32> = HashMap::new();

        for op in ops {
            let migrations = sut.stats().migrations;
            match op {
                OpI::Insert(i, v) => {
                    let k = pool[i].clone();
                    let prev = sut.insert(k.clone(), v);
                    let mprev = model.insert(k.clone(), v);
                    prop_assert_eq!(prev, mprev.map(|mv| (k, mv)));
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    let got = sut.remove(k.as_str());
                    let want = model.remove(k).map(|v| (k.clone(), v));
                    prop_assert_eq!(got, want);
                }
                OpI::Get(i) => {
                    let k = pool[i].as_str();
                    prop_assert_eq!(sut.get(k), model.get(k));
                    prop_assert_eq!(sut.contains(k), model.contains_key(k));
                }
                OpI::Mutate(i, d) => {
                    let k = pool[i].as_str();
                    if let Some(v) = sut.get_mut(k) {
                        *v = v.wrapping_add(d);
                    }
                    if let Some(v) = model.get_mut(k) {
                        *v = v.wrapping_add(d);
                    }
                }
                OpI::Peek => {
                    match sut.peek_entry() {
                        Some((k, v)) => {
                            prop_assert_eq!(model.get(k), Some(v));
                        }
                        None => {
                            prop_assert!(model.is_empty());
                        }
                    }
                }
                OpI::Iterate => {
                    let keys: Vec<&String> = sut.iter().map(|(k, _)| k).collect();
                    let unique: BTreeSet<&String> = keys.iter().copied().collect();
                    prop_assert_eq!(unique.len(), keys.len(), "no key yielded twice");
                    let want: BTreeSet<&String> = model.keys().collect();
                    prop_assert_eq!(unique, want);
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.order(), MIN_ORDER);
                }
            }
            prop_assert!(sut.stats().migrations - migrations <= 1);
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            sut.check_invariants();
        }
    }
}

// Property: inserting a set of keys and removing all of them, in any order,
// returns the hash to the minimum order with nothing left behind.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_grow_then_drain_returns_to_min_order(
        keys in proptest::collection::hash_set(any::<u32>(), 0..1500),
        seed in any::<u64>(),
    ) {
        let mut sut: DualHash<u32, ()> = DualHash::new();
        for &k in &keys {
            sut.insert(k, ());
        }
        let mut order: Vec<u32> = keys.into_iter().collect();
        // Deterministic shuffle keyed by the case seed.
        let mut s = seed | 1;
        for i in (1..order.len()).rev() {
            s ^= s << 13;
            s ^= s >> 7;
            s ^= s << 17;
            order.swap(i, (s % (i as u64 + 1)) as usize);
        }
        for (n, k) in order.into_iter().enumerate() {
            prop_assert!(sut.remove(&k).is_some());
            if n % 64 == 0 {
                sut.check_invariants();
            }
        }
        prop_assert_eq!(sut.len(), 0);
        prop_assert_eq!(sut.order(), MIN_ORDER);
        prop_assert_eq!(sut.capacity(), 128);
    }
}
