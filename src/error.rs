//! Named outcomes for operations that can refuse their input.

use thiserror::Error;

/// Returned by `HashTable::insert` when an equal key is already stored.
///
/// The stored entry is left untouched; the rejected pair is handed back to
/// the caller without passing through the key-release policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InsertError<K, V> {
    #[error("key already present in table")]
    DuplicateKey { key: K, value: V },
}

impl<K, V> InsertError<K, V> {
    /// Recover the rejected key/value pair.
    pub fn into_inner(self) -> (K, V) {
        match self {
            InsertError::DuplicateKey { key, value } => (key, value),
        }
    }
}

/// Returned by `HashTable::update` when no entry matches the key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("key not present in table")]
pub struct KeyNotFound<V> {
    /// The value that would have been stored.
    pub value: V,
}

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum RehashError {
    #[error("bucket count must be positive")]
    ZeroBuckets,
}

/// Returned by `Chain::insert` for a position past the end of the chain.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("position {position} out of range for chain of length {len}")]
pub struct OutOfRange<T> {
    pub position: usize,
    pub len: usize,
    /// The value that was not inserted.
    pub value: T,
}
