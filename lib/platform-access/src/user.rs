//! User domain type.
//!
//! A user is created the first time an external identity logs in and is
//! identified internally by a `UserId`. Users are never deleted; they are
//! deactivated instead.

use crate::role::Role;
use chrono::{DateTime, Utc};
use factnotes_core::UserId;
use serde::{Deserialize, Serialize};

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal platform user ID.
    id: UserId,
    /// Identifier assigned by the identity provider.
    external_id: String,
    /// Display name reported by the identity provider.
    display_name: String,
    /// Avatar image URL reported by the identity provider.
    avatar_url: Option<String>,
    role: Role,
    /// Inactive users cannot log in or read their profile.
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an active user with the default role.
    ///
    /// Use this on first login; the user ID is generated automatically.
    #[must_use]
    pub fn new(external_id: String, display_name: String, avatar_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            external_id,
            display_name,
            avatar_url,
            role: Role::default(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        id: UserId,
        external_id: String,
        display_name: String,
        avatar_url: Option<String>,
        role: Role,
        active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            external_id,
            display_name,
            avatar_url,
            role,
            active,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets the user's role.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Activates or deactivates the user.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.updated_at = Utc::now();
    }

    /// Applies the provider's current profile. Returns true if anything changed.
    pub fn refresh_profile(&mut self, display_name: &str, avatar_url: Option<&str>) -> bool {
        if self.display_name == display_name && self.avatar_url.as_deref() == avatar_url {
            return false;
        }
        self.display_name = display_name.to_string();
        self.avatar_url = avatar_url.map(str::to_string);
        self.updated_at = Utc::now();
        true
    }
}
