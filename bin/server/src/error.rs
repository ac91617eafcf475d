//! HTTP error mapping.
//!
//! Domain errors from the libraries are converted into [`ApiError`], which
//! renders as `{"error": "...", "code": "..."}` with a matching status.
//! Store and other internal failures are logged here and reach the client
//! only as a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use factnotes_moderation::ModerationError;
use factnotes_platform_access::{AuthenticationError, AuthorizationError, DirectoryError};
use rootcause::prelude::Report;
use serde_json::json;
use std::fmt;

/// An error returned from an API handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No usable credential.
    Unauthorized { reason: String },
    /// The credential's lifetime has passed.
    CredentialExpired,
    /// The credential predates a role or status change.
    CredentialRevoked,
    /// The caller may not perform the operation.
    Forbidden { reason: String },
    /// Malformed or out-of-range input.
    Validation { message: String },
    /// Unknown moderation action.
    InvalidAction { message: String },
    /// The record's state does not allow the operation.
    InvalidStatus { message: String },
    NotFound { message: String },
    /// A concurrent change won.
    Conflict { message: String },
    /// The identity provider failed.
    IdentityProvider { message: String },
    Internal,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } | Self::CredentialExpired | Self::CredentialRevoked => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidAction { .. } | Self::InvalidStatus { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::IdentityProvider { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::CredentialExpired => "credential_expired",
            Self::CredentialRevoked => "credential_revoked",
            Self::Forbidden { .. } => "forbidden",
            Self::Validation { .. } => "validation_error",
            Self::InvalidAction { .. } => "invalid_action",
            Self::InvalidStatus { .. } => "invalid_status",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::IdentityProvider { .. } => "identity_provider_error",
            Self::Internal => "internal_error",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized { reason } => write!(f, "unauthorized: {reason}"),
            Self::CredentialExpired => write!(f, "credential has expired"),
            Self::CredentialRevoked => write!(f, "credential has been revoked"),
            Self::Forbidden { reason } => write!(f, "forbidden: {reason}"),
            Self::Validation { message }
            | Self::InvalidAction { message }
            | Self::InvalidStatus { message }
            | Self::NotFound { message }
            | Self::Conflict { message } => write!(f, "{message}"),
            Self::IdentityProvider { message } => write!(f, "identity provider error: {message}"),
            Self::Internal => write!(f, "internal server error"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<&AuthorizationError> for ApiError {
    fn from(err: &AuthorizationError) -> Self {
        match err {
            AuthorizationError::NotAuthenticated => Self::Unauthorized {
                reason: err.to_string(),
            },
            AuthorizationError::PermissionDenied { .. } => Self::Forbidden {
                reason: err.to_string(),
            },
        }
    }
}

impl From<&AuthenticationError> for ApiError {
    fn from(err: &AuthenticationError) -> Self {
        match err {
            AuthenticationError::InvalidCredential { .. } => Self::Unauthorized {
                reason: "invalid credential".to_string(),
            },
            AuthenticationError::CredentialExpired => Self::CredentialExpired,
            AuthenticationError::CredentialRevoked { .. } => Self::CredentialRevoked,
            AuthenticationError::ProviderError { provider, .. } => {
                tracing::warn!(error = %err, "login failed at identity provider");
                Self::IdentityProvider {
                    message: format!("login with {provider} failed"),
                }
            }
            AuthenticationError::AccountInactive { .. } => Self::Forbidden {
                reason: err.to_string(),
            },
            AuthenticationError::Internal { .. } => {
                tracing::error!(error = %err, "authentication failure");
                Self::Internal
            }
        }
    }
}

impl From<&DirectoryError> for ApiError {
    fn from(err: &DirectoryError) -> Self {
        match err {
            DirectoryError::UserNotFound { .. } => Self::NotFound {
                message: err.to_string(),
            },
            DirectoryError::NotAuthenticated => Self::Unauthorized {
                reason: err.to_string(),
            },
            DirectoryError::AccountInactive { .. } | DirectoryError::PermissionDenied { .. } => {
                Self::Forbidden {
                    reason: err.to_string(),
                }
            }
            DirectoryError::Store { .. } => {
                tracing::error!(error = %err, "user directory failure");
                Self::Internal
            }
        }
    }
}

impl From<&ModerationError> for ApiError {
    fn from(err: &ModerationError) -> Self {
        let message = err.to_string();
        match err {
            ModerationError::NotAuthenticated => Self::Unauthorized { reason: message },
            ModerationError::PermissionDenied { .. } => Self::Forbidden { reason: message },
            ModerationError::Validation { .. } => Self::Validation { message },
            ModerationError::InvalidAction { .. } => Self::InvalidAction { message },
            ModerationError::InvalidStatus { .. } => Self::InvalidStatus { message },
            ModerationError::NotFound { .. } => Self::NotFound { message },
            ModerationError::Conflict { .. } => Self::Conflict { message },
            ModerationError::Store { .. } => {
                tracing::error!(error = %err, "summary store failure");
                Self::Internal
            }
        }
    }
}

impl From<Report<AuthenticationError>> for ApiError {
    fn from(report: Report<AuthenticationError>) -> Self {
        report.current_context().into()
    }
}

impl From<Report<DirectoryError>> for ApiError {
    fn from(report: Report<DirectoryError>) -> Self {
        report.current_context().into()
    }
}

impl From<Report<ModerationError>> for ApiError {
    fn from(report: Report<ModerationError>) -> Self {
        report.current_context().into()
    }
}
