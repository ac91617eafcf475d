//! User directory routes.

use axum::{Json, extract::State};
use factnotes_core::{Page, UserId};
use factnotes_platform_access::{Role, User};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiJson, ApiPath, ApiQuery, parse_id};
use crate::auth::{AppState, RequireAdmin, RequireAuth, RequireModerator};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct UpdateRoleBody {
    role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    active: bool,
}

/// The caller's own profile.
pub async fn me(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.directory.current_profile(user.user_id()).await?))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.directory.list(page).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    Ok(Json(state.directory.get(id).await?))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateRoleBody>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    let role: Role = body
        .role
        .parse()
        .map_err(|e| ApiError::validation(format!("{e}")))?;
    Ok(Json(
        state
            .directory
            .update_role(&admin.caller(), id, role)
            .await?,
    ))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    moderator: RequireModerator,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateStatusBody>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    Ok(Json(
        state
            .directory
            .update_status(&moderator.caller(), id, body.active)
            .await?,
    ))
}
