//! Caller identity as seen by domain operations.
//!
//! Every protected operation receives a [`Caller`]: either anonymous or an
//! [`AuthenticatedUser`] derived from verified session claims. Role checks
//! go through [`Caller::require`], which applies the single role hierarchy
//! from [`crate::role`].

use crate::error::AuthorizationError;
use crate::role::{Role, authorize};
use crate::token::SessionClaims;
use factnotes_core::UserId;

/// An authenticated caller.
///
/// The role is the one embedded in the credential, not necessarily the
/// user's current role in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user_id: UserId,
    role: Role,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns true if the user has moderation capability.
    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }

    /// Returns true if the user has admin access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&SessionClaims> for AuthenticatedUser {
    fn from(claims: &SessionClaims) -> Self {
        Self::new(claims.user_id(), claims.role())
    }
}

/// The identity behind a call, possibly absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(AuthenticatedUser),
}

impl Caller {
    /// Shorthand for an authenticated caller.
    #[must_use]
    pub fn user(user_id: UserId, role: Role) -> Self {
        Self::User(AuthenticatedUser::new(user_id, role))
    }

    #[must_use]
    pub fn authenticated(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }

    /// Requires any authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` for anonymous callers.
    pub fn require_authenticated(&self) -> Result<&AuthenticatedUser, AuthorizationError> {
        self.authenticated()
            .ok_or(AuthorizationError::NotAuthenticated)
    }

    /// Requires an authenticated caller whose role satisfies one of `required`.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` for anonymous callers and `PermissionDenied`
    /// when the role is insufficient.
    pub fn require(
        &self,
        action: &str,
        required: &[Role],
    ) -> Result<&AuthenticatedUser, AuthorizationError> {
        let user = self.require_authenticated()?;
        if authorize(user.role(), required) {
            return Ok(user);
        }
        Err(AuthorizationError::PermissionDenied {
            user_id: user.user_id(),
            action: action.to_string(),
            required: required.iter().copied().min().unwrap_or(Role::Admin),
        })
    }
}

impl From<Option<AuthenticatedUser>> for Caller {
    fn from(user: Option<AuthenticatedUser>) -> Self {
        user.map_or(Self::Anonymous, Self::User)
    }
}

impl From<AuthenticatedUser> for Caller {
    fn from(user: AuthenticatedUser) -> Self {
        Self::User(user)
    }
}
