//! Authentication extractors for Axum.
//!
//! Credentials arrive as `Authorization: Bearer <token>`.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use factnotes_platform_access::{AuthenticatedUser, AuthenticationError, Caller};
use std::sync::Arc;

use super::AppState;
use crate::error::ApiError;

/// Extractor for requiring an authenticated user.
pub struct RequireAuth(pub AuthenticatedUser);

impl RequireAuth {
    #[must_use]
    pub fn caller(&self) -> Caller {
        Caller::User(self.0)
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthRejection::NotAuthenticated)?;

        let claims = app_state
            .tokens
            .verify(bearer.token())
            .map_err(|report| match report.current_context() {
                AuthenticationError::CredentialExpired => AuthRejection::CredentialExpired,
                AuthenticationError::CredentialRevoked { .. } => AuthRejection::CredentialRevoked,
                _ => AuthRejection::InvalidCredential,
            })?;

        Ok(RequireAuth(AuthenticatedUser::from(&claims)))
    }
}

/// Extractor for optionally getting the authenticated user.
///
/// Requests without an `Authorization` header get an anonymous caller. A
/// header that is present must carry a valid credential; expired, revoked
/// or malformed credentials are rejected as with [`RequireAuth`].
pub struct OptionalAuth(pub Caller);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(OptionalAuth(Caller::Anonymous));
        }
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        Ok(OptionalAuth(Caller::User(user)))
    }
}

/// Extractor for requiring moderation capability.
pub struct RequireModerator(pub AuthenticatedUser);

impl RequireModerator {
    #[must_use]
    pub fn caller(&self) -> Caller {
        Caller::User(self.0)
    }
}

impl<S> FromRequestParts<S> for RequireModerator
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.is_moderator() {
            return Err(AuthRejection::ModeratorRequired);
        }

        Ok(RequireModerator(user))
    }
}

/// Extractor for requiring an authenticated admin user.
pub struct RequireAdmin(pub AuthenticatedUser);

impl RequireAdmin {
    #[must_use]
    pub fn caller(&self) -> Caller {
        Caller::User(self.0)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthRejection::AdminRequired);
        }

        Ok(RequireAdmin(user))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    NotAuthenticated,
    InvalidCredential,
    CredentialExpired,
    CredentialRevoked,
    ModeratorRequired,
    AdminRequired,
}

impl From<AuthRejection> for ApiError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::NotAuthenticated => ApiError::Unauthorized {
                reason: "missing bearer credential".to_string(),
            },
            AuthRejection::InvalidCredential => ApiError::Unauthorized {
                reason: "invalid credential".to_string(),
            },
            AuthRejection::CredentialExpired => ApiError::CredentialExpired,
            AuthRejection::CredentialRevoked => ApiError::CredentialRevoked,
            AuthRejection::ModeratorRequired => ApiError::Forbidden {
                reason: "moderator access required".to_string(),
            },
            AuthRejection::AdminRequired => ApiError::Forbidden {
                reason: "admin access required".to_string(),
            },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
