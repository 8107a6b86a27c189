//! Policies injected into `HashTable` at construction.
//!
//! Hash contract: a `BucketHash` receives the current bucket count but may
//! return any `usize`. The table always reduces the result `% buckets`, so a
//! policy that pre-reduces and one that returns a raw hash both behave.
//!
//! Closures implement each policy trait directly, so
//! `|k: &String, n| k.len() % n` is a valid hash policy.

use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Maps a key to a bucket index candidate.
pub trait BucketHash<Q: ?Sized> {
    fn hash(&self, key: &Q, buckets: usize) -> usize;
}

impl<Q, F> BucketHash<Q> for F
where
    Q: ?Sized,
    F: Fn(&Q, usize) -> usize,
{
    #[inline]
    fn hash(&self, key: &Q, buckets: usize) -> usize {
        self(key, buckets)
    }
}

/// Adapts any `BuildHasher` into a bucket hash policy.
#[derive(Clone, Debug, Default)]
pub struct Hashed<S>(pub S);

impl<Q, S> BucketHash<Q> for Hashed<S>
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &Q, _buckets: usize) -> usize {
        self.0.hash_one(key) as usize
    }
}

/// Default hash policy: hashbrown's default `BuildHasher`.
pub type DefaultHash = Hashed<DefaultHashBuilder>;

/// Polynomial byte-string hash, `h = (h * 127 + byte) % buckets`.
///
/// Deterministic across runs, which makes bucket placement reproducible.
/// Reduces as it goes, so the result is already in range.
///
/// Bytes are folded as unsigned values. For ASCII keys this agrees with
/// the classic `char`-based recurrence; bytes above 0x7F count as 128..=255,
/// where a signed `char` fold would see negative values and place the key
/// in a different bucket.
#[derive(Copy, Clone, Debug, Default)]
pub struct BytesHash;

impl BytesHash {
    const MULTIPLIER: usize = 127;
}

impl<Q> BucketHash<Q> for BytesHash
where
    Q: ?Sized + AsRef<[u8]>,
{
    fn hash(&self, key: &Q, buckets: usize) -> usize {
        let buckets = buckets.max(1);
        key.as_ref().iter().fold(0usize, |h, &b| {
            (h.wrapping_mul(Self::MULTIPLIER).wrapping_add(b as usize)) % buckets
        })
    }
}

/// Key equality used to resolve collisions within a bucket.
pub trait KeyEq<Q: ?Sized> {
    fn eq(&self, a: &Q, b: &Q) -> bool;
}

impl<Q, F> KeyEq<Q> for F
where
    Q: ?Sized,
    F: Fn(&Q, &Q) -> bool,
{
    #[inline]
    fn eq(&self, a: &Q, b: &Q) -> bool {
        self(a, b)
    }
}

/// Equality via the key's own `Eq`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultKeyEq;

impl<Q: ?Sized + Eq> KeyEq<Q> for DefaultKeyEq {
    #[inline]
    fn eq(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}

/// Owner-release hook for keys leaving the table.
///
/// Runs exactly once per key when its entry is destroyed: on `remove`,
/// `destroy`, and drop of the table. Never runs on `update` or `rehash`.
pub trait ReleaseKey<K> {
    fn release(&mut self, key: K);
}

impl<K, F> ReleaseKey<K> for F
where
    F: FnMut(K),
{
    #[inline]
    fn release(&mut self, key: K) {
        self(key)
    }
}

/// Default release hook: the key is simply dropped.
#[derive(Copy, Clone, Debug, Default)]
pub struct DropKey;

impl<K> ReleaseKey<K> for DropKey {
    #[inline]
    fn release(&mut self, key: K) {
        drop(key);
    }
}
