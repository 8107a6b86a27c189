//! HashTable: separate chaining over a fixed array of `Chain` buckets.
//!
//! Every keyed operation computes `hash(key, buckets) % buckets` and then
//! scans that one chain with the equality policy. The bucket array is
//! allocated eagerly and never empty, so any reduced index is valid.
//!
//! Resizing is explicit: `rehash` plans the new placement of every entry
//! (running all hash/equality callbacks) before it moves anything, then
//! swaps the new buckets in. Entries are moved, never copied, and keys
//! only pass through the release policy when their entry is destroyed.

use crate::chain::{self, Chain};
use crate::error::{InsertError, KeyNotFound, RehashError};
use crate::guard::PolicyGuard;
use crate::policy::{BucketHash, DefaultHash, DefaultKeyEq, DropKey, KeyEq, ReleaseKey};
use core::borrow::Borrow;
use core::fmt;
use core::hash::Hash;
use core::mem;
use tracing::{debug, trace, warn};

/// Bucket count used when zero buckets are requested.
pub const DEFAULT_BUCKETS: usize = 100;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

type Bucket<K, V> = Chain<Entry<K, V>>;

fn empty_buckets<K, V>(n: usize) -> Vec<Bucket<K, V>> {
    let mut buckets = Vec::with_capacity(n);
    buckets.resize_with(n, Chain::new);
    buckets
}

/// Separate-chaining hash table with injected hash, equality and
/// key-release policies.
///
/// Keys are unique under `E`. `insert` never overwrites; `update` is the
/// only way to replace a stored value.
pub struct HashTable<K, V, H = DefaultHash, E = DefaultKeyEq, R = DropKey>
where
    R: ReleaseKey<K>,
{
    buckets: Vec<Bucket<K, V>>,
    len: usize,
    hash: H,
    key_eq: E,
    release: R,
    guard: PolicyGuard,
}

impl<K, V> HashTable<K, V>
where
    K: Eq + Hash,
{
    /// Empty table with `DEFAULT_BUCKETS` buckets and default policies.
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    pub fn with_buckets(buckets: usize) -> Self {
        Self::with_policies(buckets, DefaultHash::default(), DefaultKeyEq, DropKey)
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H, E, R> HashTable<K, V, H, E, R>
where
    R: ReleaseKey<K>,
{
    /// Create a table with `buckets` chains. Zero is replaced by
    /// `DEFAULT_BUCKETS`.
    pub fn with_policies(buckets: usize, hash: H, key_eq: E, release: R) -> Self {
        let buckets = if buckets == 0 {
            debug!(buckets = DEFAULT_BUCKETS, "zero buckets requested; using default");
            DEFAULT_BUCKETS
        } else {
            buckets
        };
        Self {
            buckets: empty_buckets(buckets),
            len: 0,
            hash,
            key_eq,
            release,
            guard: PolicyGuard::new(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entries per bucket.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    fn bucket_of<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized,
        H: BucketHash<Q>,
    {
        let n = self.buckets.len();
        self.hash.hash(key, n) % n
    }

    /// Bucket index for `key` and the chain position of its entry, if any.
    fn locate<Q>(&self, key: &Q) -> (usize, Option<usize>)
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: BucketHash<Q>,
        E: KeyEq<Q>,
    {
        let idx = self.bucket_of(key);
        let pos = self.buckets[idx]
            .find(|e| self.key_eq.eq(Borrow::<Q>::borrow(&e.key), key));
        (idx, pos)
    }

    /// Add `key -> value` unless an equal key is already stored. A duplicate
    /// leaves the stored entry as it was and hands the pair back.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError<K, V>>
    where
        H: BucketHash<K>,
        E: KeyEq<K>,
    {
        let _g = self.guard.enter("insert");
        let (idx, pos) = self.locate(&key);
        if pos.is_some() {
            trace!(bucket = idx, "insert rejected duplicate key");
            return Err(InsertError::DuplicateKey { key, value });
        }
        self.buckets[idx].push_back(Entry { key, value });
        self.len += 1;
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: BucketHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.guard.enter("get");
        let (idx, pos) = self.locate(key);
        self.buckets[idx].get(pos?).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: BucketHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.guard.enter("get_mut");
        let (idx, pos) = self.locate(key);
        self.buckets[idx].get_mut(pos?).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: BucketHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.guard.enter("contains_key");
        self.locate(key).1.is_some()
    }

    /// Replace the value stored under `key` and return the previous one.
    /// The key and the entry count are untouched. An absent key hands the
    /// new value back.
    pub fn update<Q>(&mut self, key: &Q, value: V) -> Result<V, KeyNotFound<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: BucketHash<Q>,
        E: KeyEq<Q>,
    {
        match self.get_mut(key) {
            Some(slot) => Ok(mem::replace(slot, value)),
            None => Err(KeyNotFound { value }),
        }
    }

    /// Unlink the entry for `key`, pass its key to the release policy and
    /// return its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: BucketHash<Q>,
        E: KeyEq<Q>,
    {
        let entry = {
            let _g = self.guard.enter("remove");
            let (idx, pos) = self.locate(key);
            self.buckets[idx].remove(pos?)?
        };
        self.len -= 1;
        // Structure is consistent again; the hook may do anything.
        self.release.release(entry.key);
        Some(entry.value)
    }

    /// Borrowing iterator in bucket order, then chain order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            current: None,
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> Chain<&K> {
        self.iter().map(|(k, _)| k).collect()
    }

    pub fn values(&self) -> Chain<&V> {
        self.iter().map(|(_, v)| v).collect()
    }

    /// Snapshot of every key/value pairing.
    pub fn entries(&self) -> Chain<(&K, &V)> {
        self.iter().collect()
    }

    /// Rebuild the table with `new_buckets` chains.
    ///
    /// Placement of every entry is computed first, with the table left
    /// intact; only then are entries moved. If the policies disagree (two
    /// stored keys compare equal but lived in different buckets), the later
    /// one in bucket order is dropped from the table and its key released.
    pub fn rehash(&mut self, new_buckets: usize) -> Result<(), RehashError>
    where
        H: BucketHash<K>,
        E: KeyEq<K>,
    {
        if new_buckets == 0 {
            return Err(RehashError::ZeroBuckets);
        }
        let old_buckets = self.buckets.len();

        let plan: Vec<Option<usize>> = {
            let _g = self.guard.enter("rehash");
            let mut placed: Vec<Vec<&K>> = vec![Vec::new(); new_buckets];
            let mut plan = Vec::with_capacity(self.len);
            for (key, _) in self.iter() {
                let idx = self.hash.hash(key, new_buckets) % new_buckets;
                if placed[idx].iter().any(|k| self.key_eq.eq(*k, key)) {
                    plan.push(None);
                } else {
                    placed[idx].push(key);
                    plan.push(Some(idx));
                }
            }
            plan
        };

        let mut fresh: Vec<Bucket<K, V>> = empty_buckets(new_buckets);
        let mut merged = Vec::new();
        let old = mem::take(&mut self.buckets);
        let entries = old.into_iter().flat_map(|chain| chain.into_iter());
        for (entry, target) in entries.zip(plan) {
            match target {
                Some(idx) => fresh[idx].push_back(entry),
                None => merged.push(entry),
            }
        }
        self.buckets = fresh;
        self.len -= merged.len();

        if !merged.is_empty() {
            warn!(
                merged = merged.len(),
                "rehash found equal keys in different buckets; hash and equality policies disagree"
            );
        }
        for entry in merged {
            self.release.release(entry.key);
        }
        debug!(
            from = old_buckets,
            to = new_buckets,
            entries = self.len,
            "rehashed table"
        );
        Ok(())
    }

    /// Tear the table down: every key goes through the release policy and
    /// every value is handed to `value_destroy`, in bucket order.
    ///
    /// If `value_destroy` or the release policy panics, the keys not yet
    /// released still go through the release policy while unwinding; their
    /// values are dropped. A second panic from the release policy aborts.
    pub fn destroy<F>(mut self, mut value_destroy: F)
    where
        F: FnMut(V),
    {
        self.len = 0;
        for value in Drain::new(mem::take(&mut self.buckets), &mut self.release) {
            value_destroy(value);
        }
    }

    #[cfg(test)]
    pub(crate) fn chain_lengths(&self) -> Vec<usize> {
        self.buckets.iter().map(|c| c.len()).collect()
    }

    /// Panics unless every entry sits in the bucket its key hashes to, keys
    /// are unique and `len` matches the chains.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        H: BucketHash<K>,
        E: KeyEq<K>,
    {
        let n = self.buckets.len();
        assert!(n > 0, "bucket array must never be empty");
        assert_eq!(self.len, self.chain_lengths().iter().sum::<usize>());
        for (idx, chain) in self.buckets.iter().enumerate() {
            for entry in chain {
                assert_eq!(self.hash.hash(&entry.key, n) % n, idx, "entry in wrong bucket");
            }
        }
        let keys: Vec<&K> = self.iter().map(|(k, _)| k).collect();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert!(!self.key_eq.eq(a, b), "duplicate key stored");
            }
        }
    }
}

impl<K, V, H, E, R> Drop for HashTable<K, V, H, E, R>
where
    R: ReleaseKey<K>,
{
    fn drop(&mut self) {
        Drain::new(mem::take(&mut self.buckets), &mut self.release).for_each(drop);
    }
}

/// Takes entries out of detached buckets, releasing each key and yielding
/// its value. Whatever is left when the drain is dropped, including during
/// unwinding, is released too.
struct Drain<'a, K, V, R>
where
    R: ReleaseKey<K>,
{
    entries: core::iter::Flatten<std::vec::IntoIter<Bucket<K, V>>>,
    release: &'a mut R,
}

impl<'a, K, V, R> Drain<'a, K, V, R>
where
    R: ReleaseKey<K>,
{
    fn new(buckets: Vec<Bucket<K, V>>, release: &'a mut R) -> Self {
        Self {
            entries: buckets.into_iter().flatten(),
            release,
        }
    }
}

impl<K, V, R> Iterator for Drain<'_, K, V, R>
where
    R: ReleaseKey<K>,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        let entry = self.entries.next()?;
        self.release.release(entry.key);
        Some(entry.value)
    }
}

impl<K, V, R> Drop for Drain<'_, K, V, R>
where
    R: ReleaseKey<K>,
{
    fn drop(&mut self) {
        for _ in self.by_ref() {}
    }
}

impl<K, V, H, E, R> fmt::Debug for HashTable<K, V, H, E, R>
where
    K: fmt::Debug,
    V: fmt::Debug,
    R: ReleaseKey<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Keeps the first value seen for each key, matching `insert`.
impl<K, V> FromIterator<(K, V)> for HashTable<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = HashTable::new();
        table.extend(iter);
        table
    }
}

impl<K, V, H, E, R> Extend<(K, V)> for HashTable<K, V, H, E, R>
where
    H: BucketHash<K>,
    E: KeyEq<K>,
    R: ReleaseKey<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ = self.insert(key, value);
        }
    }
}

impl<'a, K, V, H, E, R> IntoIterator for &'a HashTable<K, V, H, E, R>
where
    R: ReleaseKey<K>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Iterator over `(&K, &V)` in bucket order, then chain order.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket<K, V>>,
    current: Option<chain::Iter<'a, Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.as_mut().and_then(|it| it.next()) {
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&entry.key, &entry.value));
            }
            self.current = Some(self.buckets.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Step-by-step construction of a `HashTable` with custom policies.
///
/// ```
/// use chained_hashtable::{BucketHash, Builder, BytesHash};
///
/// let mut table = Builder::new()
///     .buckets(16)
///     .hash(|k: &String, n: usize| BytesHash.hash(k.to_ascii_lowercase().as_str(), n))
///     .key_eq(|a: &String, b: &String| a.eq_ignore_ascii_case(b))
///     .build::<String, u32>();
/// table.insert("Alice".to_string(), 1).unwrap();
/// assert!(table.insert("ALICE".to_string(), 2).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct Builder<H = DefaultHash, E = DefaultKeyEq, R = DropKey> {
    buckets: usize,
    hash: H,
    key_eq: E,
    release: R,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS,
            hash: DefaultHash::default(),
            key_eq: DefaultKeyEq,
            release: DropKey,
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, E, R> Builder<H, E, R> {
    /// Requested bucket count; zero falls back to `DEFAULT_BUCKETS`.
    pub fn buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn hash<H2>(self, hash: H2) -> Builder<H2, E, R> {
        Builder {
            buckets: self.buckets,
            hash,
            key_eq: self.key_eq,
            release: self.release,
        }
    }

    pub fn key_eq<E2>(self, key_eq: E2) -> Builder<H, E2, R> {
        Builder {
            buckets: self.buckets,
            hash: self.hash,
            key_eq,
            release: self.release,
        }
    }

    pub fn release_keys<R2>(self, release: R2) -> Builder<H, E, R2> {
        Builder {
            buckets: self.buckets,
            hash: self.hash,
            key_eq: self.key_eq,
            release,
        }
    }

    pub fn build<K, V>(self) -> HashTable<K, V, H, E, R>
    where
        R: ReleaseKey<K>,
    {
        HashTable::with_policies(self.buckets, self.hash, self.key_eq, self.release)
    }
}
