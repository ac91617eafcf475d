//! JSON API routes.

pub mod summaries;
pub mod users;

use axum::{
    Json, Router,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::error::ApiError;

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query-string extractor whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// Parses an id from a path segment.
pub(crate) fn parse_id<T>(raw: &str, what: &str) -> Result<T, ApiError>
where
    T: FromStr,
{
    raw.parse()
        .map_err(|_| ApiError::validation(format!("invalid {what} id '{raw}'")))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/api/auth/login", get(auth::login))
        .route("/api/auth/login/callback", post(auth::callback))
        .route("/api/auth/users/me", get(users::me))
        .route("/api/auth/users", get(users::list))
        .route("/api/auth/users/{id}", get(users::get))
        // Admin
        .route("/api/admin/users/{id}/role", put(users::update_role))
        .route("/api/admin/users/{id}/status", put(users::update_status))
        // Summaries
        .route(
            "/api/summaries/requests",
            get(summaries::list_requests).post(summaries::submit),
        )
        .route("/api/summaries/requests/{id}", get(summaries::get_request))
        .route("/api/summaries", get(summaries::list))
        .route(
            "/api/summaries/{id}",
            get(summaries::detail).put(summaries::edit),
        )
        .route("/api/summaries/{id}/edits", get(summaries::edits))
        .route("/api/summaries/{id}/rate", post(summaries::rate))
        .route("/api/summaries/{id}/moderate", post(summaries::moderate))
        .route(
            "/api/summaries/{id}/resources",
            get(summaries::list_links).post(summaries::add_link),
        )
        .route(
            "/api/summaries/{id}/resources/{link_id}",
            delete(summaries::remove_link),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
