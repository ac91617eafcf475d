//! The cache-aside store.

use crate::backend::CacheBackend;
use crate::error::CacheError;
use crate::key::CacheKey;
use rootcause::prelude::Report;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Read-through cache in front of a system of record.
///
/// Values are stored as JSON. Anything that prevents a cached value from
/// being returned (backend errors, undecodable payloads) falls back to the
/// loader.
#[derive(Clone)]
pub struct CacheAsideStore {
    backend: Arc<dyn CacheBackend>,
}

impl CacheAsideStore {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Returns the cached value for `key`, or loads, caches and returns it.
    ///
    /// The loader runs at most once per call and only on a miss. Its error
    /// is returned unchanged and nothing is cached for a failed load.
    /// Failing to populate the cache after a successful load is logged and
    /// otherwise ignored.
    pub async fn get_or_load<V, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        loader: F,
    ) -> Result<V, E>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        match self.backend.get(key.as_str()).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(%key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(%key, error = %e, "discarding undecodable cache entry");
                }
            },
            Ok(None) => debug!(%key, "cache miss"),
            Err(e) => warn!(%key, error = %e, "cache read failed, loading from store"),
        }

        let value = loader().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.backend.set(key.as_str(), raw, ttl).await {
                    warn!(%key, error = %e, "failed to populate cache");
                }
            }
            Err(e) => warn!(%key, error = %e, "failed to serialize value for cache"),
        }

        Ok(value)
    }

    /// Drops the cached value for `key`. A missing key is not an error.
    ///
    /// Call this after the system-of-record write has succeeded.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<(), Report<CacheError>> {
        self.backend.delete(key.as_str()).await?;
        debug!(%key, "cache entry invalidated");
        Ok(())
    }

    /// Invalidates `key` and logs a failure instead of returning it.
    ///
    /// Writers use this once their write is durable: the write has happened
    /// and must be reported as such, and the TTL bounds any staleness.
    pub async fn invalidate_or_log(&self, key: &CacheKey) {
        if let Err(report) = self.invalidate(key).await {
            warn!(%key, error = %report, "cache invalidation failed, entry expires by TTL");
        }
    }
}
