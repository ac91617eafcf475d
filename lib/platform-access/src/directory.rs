//! The user directory.
//!
//! Owns user lifecycle: creation on first login, profile refresh, role and
//! status changes. Reads by id go through the cache-aside path; every write
//! lands in the store first and then invalidates the cached record. Role
//! and status changes also move the user's revocation watermark so that
//! credentials carrying the old role stop verifying.

use crate::auth::Caller;
use crate::error::DirectoryError;
use crate::identity::ExternalIdentity;
use crate::revocation::RevocationList;
use crate::role::Role;
use crate::store::UserStore;
use crate::user::User;
use chrono::{DateTime, Utc};
use factnotes_cache::{CacheAsideStore, CacheConfig, CacheKey};
use factnotes_core::{Page, StoreError, UserId};
use rootcause::prelude::Report;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// User lifecycle operations.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    cache: CacheAsideStore,
    ttl: Duration,
    revocations: RevocationList,
}

impl UserDirectory {
    /// Creates a directory with the default user cache lifetime.
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: CacheAsideStore,
        revocations: RevocationList,
    ) -> Self {
        Self {
            store,
            cache,
            ttl: CacheConfig::default().user_ttl(),
            revocations,
        }
    }

    /// Sets how long user records stay cached.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Finds the user behind an external identity, creating it on first login.
    ///
    /// Returns the user and whether it was just created. A changed display
    /// name or avatar is written back.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the system of record fails.
    #[instrument(skip(self, identity), fields(external_id = %identity.external_id))]
    pub async fn resolve_login(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<(User, bool), Report<DirectoryError>> {
        let existing = self
            .store
            .find_by_external_id(&identity.external_id)
            .await
            .map_err(store_error)?;

        if let Some(mut user) = existing {
            if user.refresh_profile(&identity.display_name, identity.avatar_url.as_deref()) {
                self.store
                    .update_profile(&user)
                    .await
                    .map_err(store_error)?;
                self.cache.invalidate_or_log(&CacheKey::user(user.id())).await;
            }
            return Ok((user, false));
        }

        let user = User::new(
            identity.external_id.clone(),
            identity.display_name.clone(),
            identity.avatar_url.clone(),
        );
        match self.store.create(&user).await {
            Ok(()) => {
                info!(user_id = %user.id(), "created user on first login");
                Ok((user, true))
            }
            // Lost a race with a concurrent first login for the same identity.
            Err(StoreError::Conflict { .. }) => {
                let user = self
                    .store
                    .find_by_external_id(&identity.external_id)
                    .await
                    .map_err(store_error)?
                    .ok_or_else(|| DirectoryError::Store {
                        details: "user vanished after conflicting insert".to_string(),
                    })?;
                Ok((user, false))
            }
            Err(e) => Err(store_error(e).into()),
        }
    }

    /// Returns a user by id.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for unknown ids.
    pub async fn get(&self, id: UserId) -> Result<User, Report<DirectoryError>> {
        self.cache
            .get_or_load(&CacheKey::user(id), self.ttl, || {
                load_user(self.store.as_ref(), id)
            })
            .await
    }

    /// Returns the caller's own profile.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for unknown ids and `AccountInactive` for
    /// deactivated accounts.
    pub async fn current_profile(&self, id: UserId) -> Result<User, Report<DirectoryError>> {
        let user = self.get(id).await?;
        if !user.is_active() {
            return Err(DirectoryError::AccountInactive { user_id: id }.into());
        }
        Ok(user)
    }

    /// Lists users ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the system of record fails.
    pub async fn list(&self, page: Page) -> Result<Vec<User>, Report<DirectoryError>> {
        Ok(self.store.list(page).await.map_err(store_error)?)
    }

    /// Returns true if the stored user is active and holds at least `required`.
    ///
    /// Bypasses both the cache and the credential, for operations that must
    /// act on the current role.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the system of record fails.
    pub async fn has_role(&self, id: UserId, required: Role) -> Result<bool, Report<DirectoryError>> {
        let user = self.store.find_by_id(id).await.map_err(store_error)?;
        Ok(user.is_some_and(|u| u.is_active() && u.role().satisfies(required)))
    }

    /// Changes a user's role. Admin only.
    ///
    /// The caller's admin role is re-checked against the store, so a demoted
    /// admin cannot use a credential issued before the demotion.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated`, `PermissionDenied`, `UserNotFound` or `Store`.
    #[instrument(skip_all, fields(target = %id, role = %role))]
    pub async fn update_role(
        &self,
        caller: &Caller,
        id: UserId,
        role: Role,
    ) -> Result<User, Report<DirectoryError>> {
        const ACTION: &str = "change user role";
        let actor = caller
            .require(ACTION, &[Role::Admin])
            .map_err(DirectoryError::from)?;
        if !self.has_role(actor.user_id(), Role::Admin).await? {
            return Err(DirectoryError::PermissionDenied {
                user_id: actor.user_id(),
                action: ACTION.to_string(),
            }
            .into());
        }

        let user = self.store.set_role(id, role).await.map_err(store_error)?;
        self.cache.invalidate_or_log(&CacheKey::user(id)).await;
        self.revoke_credentials(id).await;

        info!(actor = %actor.user_id(), "user role changed");
        Ok(user)
    }

    /// Activates or deactivates a user. Requires moderation capability, and
    /// the target may not outrank the caller.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated`, `PermissionDenied`, `UserNotFound` or `Store`.
    #[instrument(skip_all, fields(target = %id, active = active))]
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: UserId,
        active: bool,
    ) -> Result<User, Report<DirectoryError>> {
        const ACTION: &str = "change user status";
        let actor = caller
            .require(ACTION, &[Role::Moderator])
            .map_err(DirectoryError::from)?;

        let target = load_user(self.store.as_ref(), id).await?;
        if target.role() > actor.role() {
            return Err(DirectoryError::PermissionDenied {
                user_id: actor.user_id(),
                action: ACTION.to_string(),
            }
            .into());
        }

        let user = self
            .store
            .set_active(id, active)
            .await
            .map_err(store_error)?;
        self.cache.invalidate_or_log(&CacheKey::user(id)).await;
        if !active {
            self.revoke_credentials(id).await;
        }

        info!(actor = %actor.user_id(), "user status changed");
        Ok(user)
    }

    /// Reloads persisted watermarks newer than `cutoff` into the revocation
    /// list and returns how many were loaded.
    ///
    /// Call at startup with `now - credential lifetime`.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the system of record fails.
    pub async fn restore_revocations(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, Report<DirectoryError>> {
        let watermarks = self
            .store
            .revocations_since(cutoff)
            .await
            .map_err(store_error)?;
        for (id, at) in &watermarks {
            self.revocations.revoke_at(*id, *at);
        }
        info!(count = watermarks.len(), "restored revocation watermarks");
        Ok(watermarks.len())
    }

    /// Moves the in-process watermark, then persists it so it survives a
    /// restart. A failed write is logged; this process still rejects the
    /// old credentials.
    async fn revoke_credentials(&self, id: UserId) {
        let at = Utc::now();
        self.revocations.revoke_at(id, at);
        if let Err(e) = self.store.record_revocation(id, at).await {
            error!(user_id = %id, error = %e, "failed to persist revocation watermark");
        }
    }

    /// Deactivates a user.
    ///
    /// # Errors
    ///
    /// See [`update_status`](Self::update_status).
    pub async fn deactivate(&self, caller: &Caller, id: UserId) -> Result<User, Report<DirectoryError>> {
        self.update_status(caller, id, false).await
    }

    /// Reactivates a user.
    ///
    /// # Errors
    ///
    /// See [`update_status`](Self::update_status).
    pub async fn reactivate(&self, caller: &Caller, id: UserId) -> Result<User, Report<DirectoryError>> {
        self.update_status(caller, id, true).await
    }
}

async fn load_user(store: &dyn UserStore, id: UserId) -> Result<User, Report<DirectoryError>> {
    match store.find_by_id(id).await.map_err(store_error)? {
        Some(user) => Ok(user),
        None => Err(DirectoryError::UserNotFound { user_id: id }.into()),
    }
}

fn store_error(err: StoreError) -> DirectoryError {
    match err {
        StoreError::NotFound { id, .. } => match id.parse() {
            Ok(user_id) => DirectoryError::UserNotFound { user_id },
            Err(_) => DirectoryError::Store {
                details: format!("user '{id}' not found"),
            },
        },
        other => {
            error!(error = %other, "user store failure");
            DirectoryError::Store {
                details: other.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryUserStore;
    use factnotes_cache::MemoryCacheBackend;

    struct Fixture {
        directory: UserDirectory,
        store: Arc<InMemoryUserStore>,
        revocations: RevocationList,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryUserStore::new());
        let revocations = RevocationList::new();
        let cache = CacheAsideStore::new(Arc::new(MemoryCacheBackend::new(64)));
        Fixture {
            directory: UserDirectory::new(store.clone(), cache, revocations.clone()),
            store,
            revocations,
        }
    }

    fn identity(external_id: &str, name: &str) -> ExternalIdentity {
        ExternalIdentity {
            external_id: external_id.to_string(),
            display_name: name.to_string(),
            avatar_url: None,
            upstream_token: "upstream".to_string(),
        }
    }

    async fn seed(store: &InMemoryUserStore, role: Role) -> User {
        let user = User::new(format!("fb_{}", UserId::new()), "Seed".to_string(), None);
        store.create(&user).await.expect("create");
        store.set_role(user.id(), role).await.expect("set role")
    }

    #[tokio::test]
    async fn first_login_creates_user_second_login_reuses_it() {
        let f = fixture();

        let (first, created) = f
            .directory
            .resolve_login(&identity("fb_1", "Alice"))
            .await
            .expect("first login");
        assert!(created);
        assert_eq!(first.role(), Role::User);
        assert!(first.is_active());

        let (second, created) = f
            .directory
            .resolve_login(&identity("fb_1", "Alice"))
            .await
            .expect("second login");
        assert!(!created);
        assert_eq!(second.id(), first.id());
    }

    #[tokio::test]
    async fn login_refreshes_changed_profile() {
        let f = fixture();
        let (user, _) = f
            .directory
            .resolve_login(&identity("fb_1", "Alice"))
            .await
            .expect("login");
        // Warm the cache with the old name.
        f.directory.get(user.id()).await.expect("get");

        f.directory
            .resolve_login(&identity("fb_1", "Alice Liddell"))
            .await
            .expect("login");

        let fetched = f.directory.get(user.id()).await.expect("get");
        assert_eq!(fetched.display_name(), "Alice Liddell");
    }

    #[tokio::test]
    async fn get_unknown_user_is_not_found() {
        let f = fixture();
        let id = UserId::new();
        let report = f.directory.get(id).await.unwrap_err();
        assert_eq!(
            report.current_context(),
            &DirectoryError::UserNotFound { user_id: id }
        );
    }

    #[tokio::test]
    async fn admin_changes_role_and_cache_is_refreshed() {
        let f = fixture();
        let admin = seed(&f.store, Role::Admin).await;
        let target = seed(&f.store, Role::User).await;
        // Cached as a plain user.
        f.directory.get(target.id()).await.expect("get");

        let caller = Caller::user(admin.id(), Role::Admin);
        let updated = f
            .directory
            .update_role(&caller, target.id(), Role::Moderator)
            .await
            .expect("update role");
        assert_eq!(updated.role(), Role::Moderator);

        let fetched = f.directory.get(target.id()).await.expect("get");
        assert_eq!(fetched.role(), Role::Moderator);
    }

    #[tokio::test]
    async fn role_change_revokes_older_credentials() {
        let f = fixture();
        let admin = seed(&f.store, Role::Admin).await;
        let target = seed(&f.store, Role::Moderator).await;
        let issued_before = Utc::now() - chrono::Duration::seconds(10);

        f.directory
            .update_role(&Caller::user(admin.id(), Role::Admin), target.id(), Role::User)
            .await
            .expect("update role");

        assert!(f.revocations.is_revoked(target.id(), issued_before));
    }

    #[tokio::test]
    async fn moderator_cannot_change_roles() {
        let f = fixture();
        let moderator = seed(&f.store, Role::Moderator).await;
        let target = seed(&f.store, Role::User).await;

        let report = f
            .directory
            .update_role(
                &Caller::user(moderator.id(), Role::Moderator),
                target.id(),
                Role::Admin,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            DirectoryError::PermissionDenied { .. }
        ));
        let stored = f.store.find_by_id(target.id()).await.expect("find");
        assert_eq!(stored.map(|u| u.role()), Some(Role::User));
    }

    #[tokio::test]
    async fn demoted_admin_with_stale_credential_cannot_change_roles() {
        let f = fixture();
        let former_admin = seed(&f.store, Role::User).await;
        let target = seed(&f.store, Role::User).await;

        // Credential still says admin.
        let report = f
            .directory
            .update_role(
                &Caller::user(former_admin.id(), Role::Admin),
                target.id(),
                Role::Admin,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            DirectoryError::PermissionDenied { .. }
        ));
    }

    #[tokio::test]
    async fn moderator_deactivates_user_and_profile_becomes_inactive() {
        let f = fixture();
        let moderator = seed(&f.store, Role::Moderator).await;
        let target = seed(&f.store, Role::User).await;
        f.directory
            .current_profile(target.id())
            .await
            .expect("active profile");

        f.directory
            .deactivate(&Caller::user(moderator.id(), Role::Moderator), target.id())
            .await
            .expect("deactivate");

        let report = f
            .directory
            .current_profile(target.id())
            .await
            .unwrap_err();
        assert_eq!(
            report.current_context(),
            &DirectoryError::AccountInactive {
                user_id: target.id()
            }
        );
        assert!(!f.directory.has_role(target.id(), Role::User).await.expect("has_role"));

        f.directory
            .reactivate(&Caller::user(moderator.id(), Role::Moderator), target.id())
            .await
            .expect("reactivate");
        f.directory
            .current_profile(target.id())
            .await
            .expect("active again");
    }

    #[tokio::test]
    async fn moderator_cannot_deactivate_admin() {
        let f = fixture();
        let moderator = seed(&f.store, Role::Moderator).await;
        let admin = seed(&f.store, Role::Admin).await;

        let report = f
            .directory
            .deactivate(&Caller::user(moderator.id(), Role::Moderator), admin.id())
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            DirectoryError::PermissionDenied { .. }
        ));
    }

    #[tokio::test]
    async fn plain_user_cannot_change_status() {
        let f = fixture();
        let user = seed(&f.store, Role::User).await;

        let report = f
            .directory
            .deactivate(&Caller::user(user.id(), Role::User), user.id())
            .await
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            DirectoryError::PermissionDenied { .. }
        ));
    }

    #[tokio::test]
    async fn anonymous_status_change_is_not_authenticated() {
        let f = fixture();
        let report = f
            .directory
            .deactivate(&Caller::Anonymous, UserId::new())
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &DirectoryError::NotAuthenticated);
    }

    #[tokio::test]
    async fn revocations_survive_a_restart() {
        let f = fixture();
        let admin = seed(&f.store, Role::Admin).await;
        let target = seed(&f.store, Role::Moderator).await;
        let issued_before = Utc::now() - chrono::Duration::seconds(10);
        f.directory
            .update_role(&Caller::user(admin.id(), Role::Admin), target.id(), Role::User)
            .await
            .expect("update role");

        // A fresh process over the same store.
        let revocations = RevocationList::new();
        let cache = CacheAsideStore::new(Arc::new(MemoryCacheBackend::new(64)));
        let restarted = UserDirectory::new(f.store.clone(), cache, revocations.clone());
        assert!(!revocations.is_revoked(target.id(), issued_before));

        let restored = restarted
            .restore_revocations(Utc::now() - chrono::Duration::hours(72))
            .await
            .expect("restore");
        assert_eq!(restored, 1);
        assert!(revocations.is_revoked(target.id(), issued_before));
    }
}
