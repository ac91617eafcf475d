//! Login routes.

use axum::{
    Json,
    extract::{Query, State},
};
use factnotes_platform_access::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::error::ApiError;

/// Query parameters for the login callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
}

/// Where to send the user to log in.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authorization_url: String,
    pub state: String,
}

/// Result of a completed login.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub user: User,
    pub token: String,
    pub is_new_user: bool,
}

/// Returns the identity provider's authorization URL.
pub async fn login(State(state): State<Arc<AppState>>) -> Result<Json<LoginResponse>, ApiError> {
    let initiation = state.login.initiate()?;
    Ok(Json(LoginResponse {
        authorization_url: initiation.authorization_url,
        state: initiation.state,
    }))
}

/// Completes a login with the authorization code from the provider.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>, ApiError> {
    let code = query
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::validation("code is required"))?;

    let outcome = state.login.authenticate(&code).await?;
    Ok(Json(CallbackResponse {
        user: outcome.user,
        token: outcome.credential.into_string(),
        is_new_user: outcome.is_new_user,
    }))
}
