//! Summary routes.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use factnotes_core::{Page, ResourceLinkId, SummaryId, SummaryRequestId, page::DEFAULT_LIMIT};
use factnotes_moderation::{
    ResourceLink, Summary, SummaryDetail, SummaryEdit, SummaryRequest, SummaryStatus,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiJson, ApiPath, ApiQuery, parse_id};
use crate::auth::{AppState, OptionalAuth, RequireAuth, RequireModerator};
use crate::error::ApiError;

/// Pagination plus an optional status filter.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    offset: Option<u32>,
    limit: Option<u32>,
    status: Option<String>,
}

impl ListQuery {
    fn page(&self) -> Page {
        Page::new(self.offset.unwrap_or(0), self.limit.unwrap_or(DEFAULT_LIMIT))
    }

    fn status(&self) -> Result<Option<SummaryStatus>, ApiError> {
        self.status
            .as_deref()
            .map(|s| s.parse().map_err(|e| ApiError::validation(format!("{e}"))))
            .transpose()
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    content: String,
    #[serde(default)]
    metadata: String,
}

#[derive(Debug, Deserialize)]
pub struct RateBody {
    rating: f64,
}

#[derive(Debug, Deserialize)]
pub struct ModerateBody {
    action: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditBody {
    content: String,
    edit_message: String,
    /// The version the editor read.
    expected_version: i32,
}

#[derive(Debug, Deserialize)]
pub struct AddLinkBody {
    url: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
}

fn summary_id(raw: &str) -> Result<SummaryId, ApiError> {
    parse_id(raw, "summary")
}

/// Anonymous callers are turned away by the workflow itself.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    OptionalAuth(caller): OptionalAuth,
    ApiJson(body): ApiJson<SubmitBody>,
) -> Result<(StatusCode, Json<SummaryRequest>), ApiError> {
    let request = state
        .workflow
        .submit(&caller, &body.content, &body.metadata)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<SummaryRequest>>, ApiError> {
    Ok(Json(state.workflow.list_requests(page).await?))
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<SummaryRequest>, ApiError> {
    let id: SummaryRequestId = parse_id(&id, "request")?;
    Ok(Json(state.workflow.get_request(id).await?))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Summary>>, ApiError> {
    let status = query.status()?;
    Ok(Json(
        state
            .workflow
            .list_summaries(query.page(), status)
            .await?,
    ))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<SummaryDetail>, ApiError> {
    Ok(Json(state.workflow.get_detail(summary_id(&id)?).await?))
}

pub async fn edits(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Vec<SummaryEdit>>, ApiError> {
    Ok(Json(state.workflow.list_edits(summary_id(&id)?).await?))
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<RateBody>,
) -> Result<Json<Summary>, ApiError> {
    Ok(Json(
        state
            .workflow
            .rate(summary_id(&id)?, body.rating)
            .await?,
    ))
}

pub async fn moderate(
    State(state): State<Arc<AppState>>,
    moderator: RequireModerator,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<ModerateBody>,
) -> Result<Json<Summary>, ApiError> {
    let summary = state
        .workflow
        .moderate(
            &moderator.caller(),
            summary_id(&id)?,
            &body.action,
            body.notes.as_deref(),
        )
        .await?;
    Ok(Json(summary))
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    moderator: RequireModerator,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<EditBody>,
) -> Result<Json<Summary>, ApiError> {
    let summary = state
        .workflow
        .edit(
            &moderator.caller(),
            summary_id(&id)?,
            body.expected_version,
            &body.content,
            &body.edit_message,
        )
        .await?;
    Ok(Json(summary))
}

pub async fn list_links(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Vec<ResourceLink>>, ApiError> {
    Ok(Json(state.links.list(summary_id(&id)?).await?))
}

pub async fn add_link(
    State(state): State<Arc<AppState>>,
    moderator: RequireModerator,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<AddLinkBody>,
) -> Result<(StatusCode, Json<ResourceLink>), ApiError> {
    let link = state
        .links
        .add(
            &moderator.caller(),
            summary_id(&id)?,
            &body.url,
            &body.title,
            body.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn remove_link(
    State(state): State<Arc<AppState>>,
    moderator: RequireModerator,
    ApiPath((id, link_id)): ApiPath<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let link_id: ResourceLinkId = parse_id(&link_id, "resource link")?;
    state
        .links
        .remove_from(&moderator.caller(), summary_id(&id)?, link_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
