//! Cache-aside read path for factnotes.
//!
//! Reads go through [`CacheAsideStore::get_or_load`]: a hit returns the
//! cached value, a miss runs the loader against the system of record and
//! populates the cache. Writers update the system of record first and then
//! call [`CacheAsideStore::invalidate`].
//!
//! The cache is never authoritative. Backend failures degrade to misses,
//! and entries expire after a per-entity TTL, which bounds how long a
//! failed invalidation can serve stale data.

pub mod aside;
pub mod backend;
pub mod error;
pub mod key;

pub use aside::CacheAsideStore;
pub use backend::{CacheBackend, MemoryCacheBackend};
pub use error::CacheError;
pub use key::{CacheConfig, CacheKey};
