//! Atomic shared-store contract
//!
//! The store is the only mutable state shared across callers and processes;
//! the pool holds no lock spanning store calls, so every method here must be
//! atomic with respect to arbitrarily many concurrent callers. Production
//! uses [`crate::RedisStore`]; tests and single-node deployments use
//! [`crate::MemoryStore`].
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn SharedStore>`).

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Boxed future alias for the trait methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// One clear-and-refill batch, applied atomically. Bootstrap's only write
/// path: a concurrent reader sees either the old pool or the new one, never
/// a half-loaded mix.
#[derive(Debug, Clone, Default)]
pub struct AtomicReload {
    /// Lists and hashes deleted before the refill.
    pub delete: Vec<String>,
    /// Target list and the values head-inserted into it, in order.
    pub push_front: (String, Vec<String>),
    /// Target hash and the field/value pairs written into it.
    pub hash_fill: (String, Vec<(String, String)>),
}

/// Atomic list/hash primitives the pool is built on.
///
/// Connectivity failures surface as `Error::Connectivity`; nothing here
/// retries internally.
pub trait SharedStore: Send + Sync {
    /// Head-insert a value into a list (LPUSH).
    fn push_front<'a>(&'a self, list: &'a str, value: &'a str) -> StoreFuture<'a, ()>;

    /// Atomically pop the tail of `src` and head-insert it into `dst`,
    /// returning the moved value (LMOVE RIGHT LEFT). The sole lease
    /// primitive: the value is never observable in neither or both lists.
    fn move_back_to_front<'a>(&'a self, src: &'a str, dst: &'a str)
    -> StoreFuture<'a, Option<String>>;

    /// Remove one occurrence of `value` from a list, returning how many were
    /// removed (0 or 1).
    fn remove_one<'a>(&'a self, list: &'a str, value: &'a str) -> StoreFuture<'a, u64>;

    /// All values of a list, head to tail. Diagnostic scans only; never on
    /// the lease path.
    fn list_entries<'a>(&'a self, list: &'a str) -> StoreFuture<'a, Vec<String>>;

    /// Length of a single list; missing lists read as 0.
    fn list_len<'a>(&'a self, list: &'a str) -> StoreFuture<'a, i64>;

    /// Lengths of several lists as one consistent snapshot (single
    /// pipeline), in input order.
    fn list_lens<'a>(&'a self, lists: &'a [&'a str]) -> StoreFuture<'a, Vec<i64>>;

    fn hash_set<'a>(&'a self, map: &'a str, field: &'a str, value: &'a str)
    -> StoreFuture<'a, ()>;

    fn hash_get<'a>(&'a self, map: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>>;

    fn hash_delete<'a>(&'a self, map: &'a str, field: &'a str) -> StoreFuture<'a, ()>;

    /// All field/value pairs of a hash, in no particular order.
    fn hash_entries<'a>(&'a self, map: &'a str) -> StoreFuture<'a, Vec<(String, String)>>;

    /// Apply an [`AtomicReload`] as one atomic batch.
    fn replace_all<'a>(&'a self, batch: AtomicReload) -> StoreFuture<'a, ()>;
}
