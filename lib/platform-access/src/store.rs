//! System-of-record contract for users.

use crate::role::Role;
use crate::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use factnotes_core::{Page, StoreError, UserId};

/// Persistent storage for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a new user. Fails with `Conflict` if the external id is taken.
    async fn create(&self, user: &User) -> Result<(), StoreError>;

    /// Persists the display name and avatar of an existing user.
    async fn update_profile(&self, user: &User) -> Result<(), StoreError>;

    /// Sets a user's role and returns the updated record.
    async fn set_role(&self, id: UserId, role: Role) -> Result<User, StoreError>;

    /// Sets a user's active flag and returns the updated record.
    async fn set_active(&self, id: UserId, active: bool) -> Result<User, StoreError>;

    /// Lists users ordered by creation time.
    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError>;

    /// Persists a revocation watermark. A stored watermark never moves
    /// backwards.
    async fn record_revocation(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Returns every watermark later than `cutoff`.
    async fn revocations_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<(UserId, DateTime<Utc>)>, StoreError>;
}
