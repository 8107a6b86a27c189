//! chained-hashtable: a separate-chaining hash table over arena-backed
//! singly linked chains, with pluggable hash, equality and key-release
//! policies.
//!
//! Internal Design:
//!
//! Summary
//! - `Chain<T>`: singly linked list whose nodes live in a `SlotMap`
//!   arena and link through generational handles. O(1) push at both
//!   ends, O(position) positional access. Used as one bucket of the
//!   table and as the container for bulk queries.
//! - `HashTable<K, V, H, E, R>`: a fixed array of chains plus an entry
//!   count and three injected policies: `H: BucketHash` picks a bucket,
//!   `E: KeyEq` resolves collisions, `R: ReleaseKey` receives keys as
//!   their entries are destroyed.
//!
//! Contracts
//! - Bucket index is always `hash(key, buckets) % buckets`; a hash
//!   policy may pre-reduce or not.
//! - At most one entry per key under `E`. `insert` of a present key is
//!   rejected and the pair handed back; it never overwrites. `update`
//!   replaces the value only.
//! - `R` runs exactly once per key: on `remove`, `destroy`, or drop of
//!   the table. Never on `update`, never on `rehash`.
//! - Resizing is explicit via `rehash`; there is no load-factor trigger.
//!   Rehash computes the full placement before moving any entry, so a
//!   panicking policy leaves the table as it was.
//!
//! Single-threaded
//! - Tables are `!Sync`. Share across threads behind a `Mutex`.
//! - Policies are user code. A debug-only guard panics if a policy
//!   re-enters the table while an operation is in progress.
//!
//! Logging
//! - `tracing` events only; the crate installs no subscriber.

pub mod chain;
pub mod error;
mod guard;
pub mod hash_table;
mod hash_table_proptest;
pub mod policy;

// Public surface
pub use chain::Chain;
pub use error::{InsertError, KeyNotFound, OutOfRange, RehashError};
pub use hash_table::{Builder, HashTable, DEFAULT_BUCKETS};
pub use policy::{
    BucketHash, BytesHash, DefaultHash, DefaultKeyEq, DropKey, Hashed, KeyEq, ReleaseKey,
};

