//! Postgres summary store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use factnotes_core::{
    Page, ResourceLinkId, StoreError, SummaryEditId, SummaryId, SummaryRequestId, UserId,
};
use factnotes_moderation::{
    ModerationDecision, ResourceLink, Summary, SummaryEdit, SummaryRequest, SummaryStatus,
    SummaryStore,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;

use super::{decode_error, store_error};

const REQUEST_COLUMNS: &str = "id, content, metadata, author_id, status, created_at";

const SUMMARY_COLUMNS: &str = "id, request_id, author_id, content, ai_summary, rating, status, \
     moderator_id, moderated_at, moderator_notes, current_version, created_at, updated_at";

const EDIT_COLUMNS: &str = "id, summary_id, content, edited_by, version, edit_message, edited_at";

const LINK_COLUMNS: &str = "id, summary_id, url, title, description, created_by, created_at";

fn parse<T>(what: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    T::from_str(value).map_err(|e| decode_error(what, value, e))
}

/// Row type for summary request queries.
#[derive(FromRow)]
struct RequestRow {
    id: String,
    content: String,
    metadata: String,
    author_id: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl RequestRow {
    fn try_into_request(self) -> Result<SummaryRequest, StoreError> {
        let convert = |row: RequestRow| -> Result<SummaryRequest, sqlx::Error> {
            Ok(SummaryRequest {
                id: parse::<SummaryRequestId>("request id", &row.id)?,
                content: row.content,
                metadata: row.metadata,
                author_id: parse::<UserId>("user id", &row.author_id)?,
                status: parse::<SummaryStatus>("status", &row.status)?,
                created_at: row.created_at,
            })
        };
        convert(self).map_err(|e| store_error("summary_request", e))
    }
}

/// Row type for summary queries.
#[derive(FromRow)]
struct SummaryRow {
    id: String,
    request_id: String,
    author_id: String,
    content: String,
    ai_summary: Option<String>,
    rating: f64,
    status: String,
    moderator_id: Option<String>,
    moderated_at: Option<DateTime<Utc>>,
    moderator_notes: Option<String>,
    current_version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SummaryRow {
    fn try_into_summary(self) -> Result<Summary, StoreError> {
        let convert = |row: SummaryRow| -> Result<Summary, sqlx::Error> {
            let moderator_id = row
                .moderator_id
                .as_deref()
                .map(|id| parse::<UserId>("user id", id))
                .transpose()?;
            Ok(Summary {
                id: parse::<SummaryId>("summary id", &row.id)?,
                request_id: parse::<SummaryRequestId>("request id", &row.request_id)?,
                author_id: parse::<UserId>("user id", &row.author_id)?,
                content: row.content,
                ai_summary: row.ai_summary,
                rating: row.rating,
                status: parse::<SummaryStatus>("status", &row.status)?,
                moderator_id,
                moderated_at: row.moderated_at,
                moderator_notes: row.moderator_notes,
                current_version: row.current_version,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
        };
        convert(self).map_err(|e| store_error("summary", e))
    }
}

/// Row type for edit history queries.
#[derive(FromRow)]
struct EditRow {
    id: String,
    summary_id: String,
    content: String,
    edited_by: String,
    version: i32,
    edit_message: String,
    edited_at: DateTime<Utc>,
}

impl EditRow {
    fn try_into_edit(self) -> Result<SummaryEdit, StoreError> {
        let convert = |row: EditRow| -> Result<SummaryEdit, sqlx::Error> {
            Ok(SummaryEdit {
                id: parse::<SummaryEditId>("edit id", &row.id)?,
                summary_id: parse::<SummaryId>("summary id", &row.summary_id)?,
                content: row.content,
                edited_by: parse::<UserId>("user id", &row.edited_by)?,
                version: row.version,
                edit_message: row.edit_message,
                edited_at: row.edited_at,
            })
        };
        convert(self).map_err(|e| store_error("summary_edit", e))
    }
}

/// Row type for resource link queries.
#[derive(FromRow)]
struct LinkRow {
    id: String,
    summary_id: String,
    url: String,
    title: String,
    description: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl LinkRow {
    fn try_into_link(self) -> Result<ResourceLink, StoreError> {
        let convert = |row: LinkRow| -> Result<ResourceLink, sqlx::Error> {
            Ok(ResourceLink {
                id: parse::<ResourceLinkId>("link id", &row.id)?,
                summary_id: parse::<SummaryId>("summary id", &row.summary_id)?,
                url: row.url,
                title: row.title,
                description: row.description,
                created_by: parse::<UserId>("user id", &row.created_by)?,
                created_at: row.created_at,
            })
        };
        convert(self).map_err(|e| store_error("resource_link", e))
    }
}

/// Summary store backed by Postgres.
#[derive(Clone)]
pub struct PgSummaryStore {
    pool: PgPool,
}

impl PgSummaryStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| store_error("summary", e))
    }

    /// Current status of a summary inside `tx`, used to tell a lost
    /// compare-and-set from a missing row.
    async fn status_in(
        tx: &mut Transaction<'static, Postgres>,
        id: SummaryId,
    ) -> Result<Option<(String, i32)>, StoreError> {
        sqlx::query_as("SELECT status, current_version FROM summaries WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| store_error("summary", e))
    }

    async fn mirror_request_status(
        tx: &mut Transaction<'static, Postgres>,
        request_id: SummaryRequestId,
        status: SummaryStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE summary_requests SET status = $2 WHERE id = $1")
            .bind(request_id.to_string())
            .bind(status.as_str())
            .execute(&mut **tx)
            .await
            .map_err(|e| store_error("summary_request", e))?;
        Ok(())
    }
}

#[async_trait]
impl SummaryStore for PgSummaryStore {
    async fn create_submission(
        &self,
        request: &SummaryRequest,
        summary: &Summary,
    ) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO summary_requests (id, content, metadata, author_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(request.id.to_string())
        .bind(&request.content)
        .bind(&request.metadata)
        .bind(request.author_id.to_string())
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("summary_request", e))?;

        sqlx::query(
            r#"
            INSERT INTO summaries (id, request_id, author_id, content, ai_summary, rating, status,
                                   current_version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(summary.id.to_string())
        .bind(summary.request_id.to_string())
        .bind(summary.author_id.to_string())
        .bind(&summary.content)
        .bind(summary.ai_summary.as_deref())
        .bind(summary.rating)
        .bind(summary.status.as_str())
        .bind(summary.current_version)
        .bind(summary.created_at)
        .bind(summary.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("summary", e))?;

        tx.commit().await.map_err(|e| store_error("summary", e))
    }

    async fn find_request(
        &self,
        id: SummaryRequestId,
    ) -> Result<Option<SummaryRequest>, StoreError> {
        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM summary_requests WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("summary_request", e))?;

        row.map(RequestRow::try_into_request).transpose()
    }

    async fn list_requests(&self, page: Page) -> Result<Vec<SummaryRequest>, StoreError> {
        let rows: Vec<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM summary_requests \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("summary_request", e))?;

        rows.into_iter().map(RequestRow::try_into_request).collect()
    }

    async fn find_summary(&self, id: SummaryId) -> Result<Option<Summary>, StoreError> {
        let row: Option<SummaryRow> =
            sqlx::query_as(&format!("SELECT {SUMMARY_COLUMNS} FROM summaries WHERE id = $1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| store_error("summary", e))?;

        row.map(SummaryRow::try_into_summary).transpose()
    }

    async fn list_summaries(
        &self,
        page: Page,
        status: Option<SummaryStatus>,
    ) -> Result<Vec<Summary>, StoreError> {
        let rows: Vec<SummaryRow> = sqlx::query_as(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM summaries \
             WHERE ($3::TEXT IS NULL OR status = $3) \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("summary", e))?;

        rows.into_iter().map(SummaryRow::try_into_summary).collect()
    }

    async fn set_rating(&self, id: SummaryId, rating: f64) -> Result<Summary, StoreError> {
        let row: Option<SummaryRow> = sqlx::query_as(&format!(
            "UPDATE summaries SET rating = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {SUMMARY_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(rating)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("summary", e))?;

        row.map(SummaryRow::try_into_summary)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("summary", id))
    }

    async fn record_decision(
        &self,
        id: SummaryId,
        expected: SummaryStatus,
        decision: &ModerationDecision,
    ) -> Result<Summary, StoreError> {
        let mut tx = self.begin().await?;
        let status = decision.action.target_status();

        let row: Option<SummaryRow> = sqlx::query_as(&format!(
            "UPDATE summaries \
             SET status = $3, moderator_id = $4, moderated_at = $5, moderator_notes = $6, \
                 updated_at = $5 \
             WHERE id = $1 AND status = $2 \
             RETURNING {SUMMARY_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(expected.as_str())
        .bind(status.as_str())
        .bind(decision.moderator_id.to_string())
        .bind(decision.decided_at)
        .bind(decision.notes.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_error("summary", e))?;

        let Some(row) = row else {
            return match Self::status_in(&mut tx, id).await? {
                Some((current, _)) => Err(StoreError::Conflict {
                    entity: "summary",
                    details: format!("status is {current}, expected {expected}"),
                }),
                None => Err(StoreError::not_found("summary", id)),
            };
        };
        let summary = row.try_into_summary()?;

        Self::mirror_request_status(&mut tx, summary.request_id, summary.status).await?;
        tx.commit().await.map_err(|e| store_error("summary", e))?;
        Ok(summary)
    }

    async fn attach_ai_summary(&self, id: SummaryId, text: &str) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;

        let request_id: Option<(String,)> = sqlx::query_as(
            r#"
            UPDATE summaries
            SET ai_summary = $2, status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING request_id
            "#,
        )
        .bind(id.to_string())
        .bind(text)
        .bind(SummaryStatus::AiReviewed.as_str())
        .bind(SummaryStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_error("summary", e))?;

        let Some((request_id,)) = request_id else {
            return match Self::status_in(&mut tx, id).await? {
                Some(_) => Ok(false),
                None => Err(StoreError::not_found("summary", id)),
            };
        };
        let request_id = parse::<SummaryRequestId>("request id", &request_id)
            .map_err(|e| store_error("summary", e))?;

        Self::mirror_request_status(&mut tx, request_id, SummaryStatus::AiReviewed).await?;
        tx.commit().await.map_err(|e| store_error("summary", e))?;
        Ok(true)
    }

    async fn append_edit(
        &self,
        edit: &SummaryEdit,
        expected_version: i32,
    ) -> Result<Summary, StoreError> {
        let mut tx = self.begin().await?;

        let row: Option<SummaryRow> = sqlx::query_as(&format!(
            "UPDATE summaries SET content = $2, current_version = $3, updated_at = $4 \
             WHERE id = $1 AND current_version = $5 \
             RETURNING {SUMMARY_COLUMNS}"
        ))
        .bind(edit.summary_id.to_string())
        .bind(&edit.content)
        .bind(edit.version)
        .bind(edit.edited_at)
        .bind(expected_version)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_error("summary", e))?;

        let Some(row) = row else {
            return match Self::status_in(&mut tx, edit.summary_id).await? {
                Some((_, current)) => Err(StoreError::Conflict {
                    entity: "summary",
                    details: format!("version is {current}, expected {expected_version}"),
                }),
                None => Err(StoreError::not_found("summary", edit.summary_id)),
            };
        };

        sqlx::query(
            r#"
            INSERT INTO summary_edits (id, summary_id, content, edited_by, version, edit_message, edited_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(edit.id.to_string())
        .bind(edit.summary_id.to_string())
        .bind(&edit.content)
        .bind(edit.edited_by.to_string())
        .bind(edit.version)
        .bind(&edit.edit_message)
        .bind(edit.edited_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("summary_edit", e))?;

        tx.commit().await.map_err(|e| store_error("summary", e))?;
        row.try_into_summary()
    }

    async fn list_edits(&self, id: SummaryId) -> Result<Vec<SummaryEdit>, StoreError> {
        let rows: Vec<EditRow> = sqlx::query_as(&format!(
            "SELECT {EDIT_COLUMNS} FROM summary_edits WHERE summary_id = $1 ORDER BY version"
        ))
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("summary_edit", e))?;

        rows.into_iter().map(EditRow::try_into_edit).collect()
    }

    async fn add_link(&self, link: &ResourceLink) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO resource_links (id, summary_id, url, title, description, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(link.id.to_string())
        .bind(link.summary_id.to_string())
        .bind(&link.url)
        .bind(&link.title)
        .bind(link.description.as_deref())
        .bind(link.created_by.to_string())
        .bind(link.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e
                    .as_database_error()
                    .is_some_and(|db| db.is_foreign_key_violation()) =>
            {
                Err(StoreError::not_found("summary", link.summary_id))
            }
            Err(e) => Err(store_error("resource_link", e)),
        }
    }

    async fn find_link(&self, id: ResourceLinkId) -> Result<Option<ResourceLink>, StoreError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM resource_links WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("resource_link", e))?;

        row.map(LinkRow::try_into_link).transpose()
    }

    async fn remove_link(&self, id: ResourceLinkId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM resource_links WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("resource_link", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("resource_link", id));
        }
        Ok(())
    }

    async fn list_links(&self, summary_id: SummaryId) -> Result<Vec<ResourceLink>, StoreError> {
        let rows: Vec<LinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM resource_links WHERE summary_id = $1 \
             ORDER BY created_at, id"
        ))
        .bind(summary_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("resource_link", e))?;

        rows.into_iter().map(LinkRow::try_into_link).collect()
    }
}
