#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can call the
// test-only invariant checker.

use crate::error::{InsertError, KeyNotFound};
use crate::hash_table::HashTable;
use crate::policy::{BucketHash, BytesHash, DefaultHash, DefaultKeyEq, ReleaseKey};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

// Counts keys handed to the release policy.
struct CountRelease(Rc<Cell<usize>>);
impl ReleaseKey<Key> for CountRelease {
    fn release(&mut self, _key: Key) {
        self.0.set(self.0.get() + 1);
    }
}

// Every key lands in bucket 0.
struct ConstHash;
impl<Q: ?Sized> BucketHash<Q> for ConstHash {
    fn hash(&self, _key: &Q, _buckets: usize) -> usize {
        0
    }
}

// Pool-indexed operations so shrinking converges on earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Update(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Rehash(usize),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Update(i, v)),
            idx.clone().prop_map(Op::Remove),
            idx.clone().prop_map(Op::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(Op::Contains),
            (1usize..=16).prop_map(Op::Rehash),
            Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Insert never overwrites; a duplicate hands back exactly the rejected pair.
// - Update replaces present values only and returns the previous value.
// - Remove returns the model's value; get/contains parity with the model.
// - Rehash keeps every entry; bucket count becomes the requested size.
// - Iteration yields the model's key set and value multiset.
// - len/is_empty parity, entries sit in their hashed bucket, keys are unique.
// - The release policy ran once per removed key, and once per remaining
//   key when the table is dropped.
fn run_against_model<H>(
    mut sut: HashTable<Key, i32, H, DefaultKeyEq, CountRelease>,
    released: Rc<Cell<usize>>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    H: BucketHash<Key> + BucketHash<str>,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut expected_released = 0usize;

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey { key, value }) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(key, k);
                        prop_assert_eq!(value, v);
                    }
                }
            }
            Op::Update(i, v) => {
                let k = key_from(pool, i);
                match sut.update(&k, v) {
                    Ok(old) => {
                        let prev = model.insert(k, v);
                        prop_assert_eq!(prev, Some(old));
                    }
                    Err(KeyNotFound { value }) => {
                        prop_assert!(!model.contains_key(&k));
                        prop_assert_eq!(value, v);
                    }
                }
            }
            Op::Remove(i) => {
                let k = key_from(pool, i);
                let got = sut.remove(&k);
                let want = model.remove(&k);
                prop_assert_eq!(got, want);
                if want.is_some() {
                    expected_released += 1;
                }
                prop_assert!(sut.get(&k).is_none());
            }
            Op::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            Op::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            Op::Rehash(n) => {
                prop_assert!(sut.rehash(n).is_ok());
                prop_assert_eq!(sut.bucket_count(), n);
            }
            Op::Iterate => {
                let s_keys: BTreeSet<Key> = sut.keys().into_iter().cloned().collect();
                let m_keys: BTreeSet<Key> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);

                let mut s_vals: Vec<i32> = sut.values().into_iter().copied().collect();
                let mut m_vals: Vec<i32> = model.values().copied().collect();
                s_vals.sort_unstable();
                m_vals.sort_unstable();
                prop_assert_eq!(s_vals, m_vals);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(released.get(), expected_released);
        sut.assert_invariants();
    }

    drop(sut);
    prop_assert_eq!(released.get(), expected_released + model.len());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), buckets in 1usize..=8) {
        let released = Rc::new(Cell::new(0));
        let sut = HashTable::with_policies(
            buckets,
            DefaultHash::default(),
            DefaultKeyEq,
            CountRelease(released.clone()),
        );
        run_against_model(sut, released, &pool, ops)?;
    }
}

// Same invariants with the deterministic byte-string hash.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_bytes_hash((pool, ops) in arb_scenario(), buckets in 1usize..=8) {
        let released = Rc::new(Cell::new(0));
        let sut = HashTable::with_policies(
            buckets,
            BytesHash,
            DefaultKeyEq,
            CountRelease(released.clone()),
        );
        run_against_model(sut, released, &pool, ops)?;
    }
}

// Worst-case collisions: one chain holds everything, so equality alone
// has to keep entries apart.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let released = Rc::new(Cell::new(0));
        let sut = HashTable::with_policies(
            4,
            ConstHash,
            DefaultKeyEq,
            CountRelease(released.clone()),
        );
        run_against_model(sut, released, &pool, ops)?;
    }
}
