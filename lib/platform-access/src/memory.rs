//! In-memory user store.

use crate::role::Role;
use crate::store::UserStore;
use crate::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use factnotes_core::{Page, StoreError, UserId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// User store backed by a map, for tests and single-process setups.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    revocations: RwLock<HashMap<UserId, DateTime<Utc>>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify(
        &self,
        id: UserId,
        apply: impl FnOnce(&mut User),
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        apply(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.external_id() == external_id)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.external_id() == user.external_id())
        {
            return Err(StoreError::Conflict {
                entity: "user",
                details: format!("external id '{}' already registered", user.external_id()),
            });
        }
        users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<(), StoreError> {
        let display_name = user.display_name().to_string();
        let avatar_url = user.avatar_url().map(str::to_string);
        self.modify(user.id(), |stored| {
            stored.refresh_profile(&display_name, avatar_url.as_deref());
        })
        .await
        .map(|_| ())
    }

    async fn set_role(&self, id: UserId, role: Role) -> Result<User, StoreError> {
        self.modify(id, |user| user.set_role(role)).await
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<User, StoreError> {
        self.modify(id, |user| user.set_active(active)).await
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut all: Vec<&User> = users.values().collect();
        all.sort_by_key(|u| (u.created_at(), u.id().as_ulid()));
        Ok(page.apply(all.into_iter().cloned()))
    }

    async fn record_revocation(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        if !self.users.read().await.contains_key(&id) {
            return Err(StoreError::not_found("user", id));
        }
        self.revocations
            .write()
            .await
            .entry(id)
            .and_modify(|w| *w = (*w).max(at))
            .or_insert(at);
        Ok(())
    }

    async fn revocations_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<(UserId, DateTime<Utc>)>, StoreError> {
        Ok(self
            .revocations
            .read()
            .await
            .iter()
            .filter(|(_, at)| **at > cutoff)
            .map(|(id, at)| (*id, *at))
            .collect())
    }
}
