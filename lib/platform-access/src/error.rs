//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthenticationError`: credential and login failures
//! - `AuthorizationError`: role checks against an authenticated caller
//! - `DirectoryError`: user record lookups and mutations

use crate::role::Role;
use factnotes_core::UserId;
use std::fmt;

/// Errors from authentication operations.
///
/// These errors represent failures in verifying user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The credential failed signature or structural validation.
    InvalidCredential { reason: String },
    /// The credential's expiry has passed.
    CredentialExpired,
    /// The credential was issued before the user's role or status changed.
    CredentialRevoked { user_id: UserId },
    /// The identity provider rejected the exchange or could not be reached.
    ProviderError { provider: String, reason: String },
    /// The account exists but has been deactivated.
    AccountInactive { user_id: UserId },
    /// A credential could not be produced or the directory failed.
    Internal { details: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential { reason } => {
                write!(f, "invalid credential: {reason}")
            }
            Self::CredentialExpired => write!(f, "credential has expired"),
            Self::CredentialRevoked { user_id } => {
                write!(f, "credential for user {user_id} has been revoked")
            }
            Self::ProviderError { provider, reason } => {
                write!(f, "identity provider '{provider}' error: {reason}")
            }
            Self::AccountInactive { user_id } => {
                write!(f, "account {user_id} is inactive")
            }
            Self::Internal { details } => write!(f, "authentication failed: {details}"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from authorization operations.
///
/// These errors represent failures in permission checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// No credential accompanied the call.
    NotAuthenticated,
    /// The caller's role does not satisfy the requirement.
    PermissionDenied {
        user_id: UserId,
        action: String,
        required: Role,
    },
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => {
                write!(f, "user is not authenticated")
            }
            Self::PermissionDenied {
                user_id,
                action,
                required,
            } => {
                write!(
                    f,
                    "user {user_id} lacks permission to {action} (requires {required})"
                )
            }
        }
    }
}

impl std::error::Error for AuthorizationError {}

/// Errors from user directory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// No user with this id exists.
    UserNotFound { user_id: UserId },
    /// The account exists but has been deactivated.
    AccountInactive { user_id: UserId },
    /// The caller is anonymous.
    NotAuthenticated,
    /// The caller may not perform this change.
    PermissionDenied { user_id: UserId, action: String },
    /// The system of record failed.
    Store { details: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserNotFound { user_id } => write!(f, "user {user_id} not found"),
            Self::AccountInactive { user_id } => write!(f, "account {user_id} is inactive"),
            Self::NotAuthenticated => write!(f, "user is not authenticated"),
            Self::PermissionDenied { user_id, action } => {
                write!(f, "user {user_id} lacks permission to {action}")
            }
            Self::Store { details } => write!(f, "user store error: {details}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl From<AuthorizationError> for DirectoryError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::NotAuthenticated => Self::NotAuthenticated,
            AuthorizationError::PermissionDenied {
                user_id, action, ..
            } => Self::PermissionDenied { user_id, action },
        }
    }
}
