//! Cache keys and TTL configuration.

use factnotes_core::{SummaryId, UserId};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Key of a cached entity, formatted as `<entity>:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key from an entity name and an id.
    #[must_use]
    pub fn new(entity: &str, id: impl fmt::Display) -> Self {
        Self(format!("{entity}:{id}"))
    }

    /// Key of a cached user record.
    #[must_use]
    pub fn user(id: UserId) -> Self {
        Self::new("user", id)
    }

    /// Key of a cached summary record.
    #[must_use]
    pub fn summary(id: SummaryId) -> Self {
        Self::new("summary", id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache configuration, deserialized by the server's config layer.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of cached user records, in seconds.
    #[serde(default = "default_user_ttl_seconds")]
    pub user_ttl_seconds: u64,

    /// Lifetime of cached summary records, in seconds.
    #[serde(default = "default_summary_ttl_seconds")]
    pub summary_ttl_seconds: u64,

    /// Upper bound on entries held by the in-memory backend.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Interval between sweeps of expired entries, in seconds.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_user_ttl_seconds() -> u64 {
    15 * 60
}

fn default_summary_ttl_seconds() -> u64 {
    30 * 60
}

fn default_max_entries() -> usize {
    10_000
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

impl CacheConfig {
    #[must_use]
    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_seconds)
    }

    #[must_use]
    pub fn summary_ttl(&self) -> Duration {
        Duration::from_secs(self.summary_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_ttl_seconds: default_user_ttl_seconds(),
            summary_ttl_seconds: default_summary_ttl_seconds(),
            max_entries: default_max_entries(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_entity() {
        let id = SummaryId::new();
        assert_eq!(CacheKey::summary(id).as_str(), format!("summary:{id}"));

        let id = UserId::new();
        assert_eq!(CacheKey::user(id).to_string(), format!("user:{id}"));
    }

    #[test]
    fn config_has_correct_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.user_ttl(), Duration::from_secs(900));
        assert_eq!(config.summary_ttl(), Duration::from_secs(1800));
        assert_eq!(config.max_entries, 10_000);
    }
}
