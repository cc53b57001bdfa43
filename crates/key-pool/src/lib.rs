//! Tiered upstream API key pool over a shared store
//!
//! Manages a fleet-wide pool of upstream provider keys in three quota tiers
//! (full, mid, low). Callers lease a key for a request's cost class, use it
//! upstream, and release it with an outcome flag; exhausted keys walk down
//! the tier ladder and fall out of the pool at the bottom.
//!
//! All mutable state lives in an external store (Redis in production) and
//! every state change is one atomic store operation, so any number of
//! threads or processes can share one pool with no in-process locking.
//!
//! Key lifecycle:
//! 1. `bootstrap::load_keys` installs the keys file into a tier, atomically
//!    replacing all previous pool state
//! 2. `KeyPool::lease` moves the first available key along the cost class's
//!    candidate-tier order into the processing list
//! 3. `KeyPool::release` requeues (healthy), demotes (exhausted), or
//!    discards (exhausted at the lowest tier)
//! 4. `sweep::spawn_sweep_task` returns leases stranded by crashed callers

pub mod bootstrap;
pub mod classify;
pub mod error;
pub mod memory;
pub mod pool;
pub mod redis;
pub mod store;
pub mod sweep;
pub mod tier;

pub use self::redis::RedisStore;
pub use classify::{exhausted_429, is_key_exhausted};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use pool::{KeyPool, LeasedKey};
pub use store::{AtomicReload, SharedStore};
pub use sweep::spawn_sweep_task;
pub use tier::{CostTier, KeyTier, candidate_tiers};
