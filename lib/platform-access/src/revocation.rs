//! Per-user revocation watermarks for stateless credentials.
//!
//! Credentials carry the role their user had at issuance. When a role or
//! status change must take effect before the credential expires, the
//! directory records a watermark for the user, and verification rejects any
//! credential issued at or before it. Watermarks and issue times are
//! compared in microseconds, so a credential issued earlier in the same
//! second as a role change is still caught.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use factnotes_core::UserId;
use std::sync::Arc;
use tracing::debug;

/// Shared, process-local revocation list.
///
/// Cloning is cheap and every clone observes the same watermarks.
#[derive(Debug, Clone, Default)]
pub struct RevocationList {
    /// Unix microseconds.
    watermarks: Arc<DashMap<UserId, i64>>,
}

impl RevocationList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Revokes every credential issued to `user_id` at or before `at`.
    ///
    /// Watermarks only move forward.
    pub fn revoke_at(&self, user_id: UserId, at: DateTime<Utc>) {
        let at = at.timestamp_micros();
        self.watermarks
            .entry(user_id)
            .and_modify(|w| *w = (*w).max(at))
            .or_insert(at);
        debug!(%user_id, watermark = at, "revoked earlier credentials");
    }

    /// Returns true if a credential issued to `user_id` at `issued_at` has
    /// been revoked.
    #[must_use]
    pub fn is_revoked(&self, user_id: UserId, issued_at: DateTime<Utc>) -> bool {
        let issued_at = issued_at.timestamp_micros();
        self.watermarks
            .get(&user_id)
            .is_some_and(|w| issued_at <= *w)
    }

    /// Forgets watermarks older than `cutoff` and returns how many were
    /// dropped.
    ///
    /// Pass `now - credential lifetime`: every credential a dropped watermark
    /// could reject has expired by then anyway.
    pub fn prune(&self, cutoff: DateTime<Utc>) -> usize {
        let cutoff = cutoff.timestamp_micros();
        let before = self.watermarks.len();
        self.watermarks.retain(|_, w| *w >= cutoff);
        before.saturating_sub(self.watermarks.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.watermarks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watermarks.is_empty()
    }
}
