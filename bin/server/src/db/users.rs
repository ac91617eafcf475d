//! Postgres user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use factnotes_core::{Page, StoreError, UserId};
use factnotes_platform_access::{Role, User, UserStore};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::{decode_error, store_error};

const USER_COLUMNS: &str =
    "id, external_id, display_name, avatar_url, role, active, created_at, updated_at";

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    external_id: String,
    display_name: String,
    avatar_url: Option<String>,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, sqlx::Error> {
        let id = UserId::from_str(&self.id).map_err(|e| decode_error("user id", &self.id, e))?;
        let role = Role::from_str(&self.role).map_err(|e| decode_error("role", &self.role, e))?;
        Ok(User::with_all_fields(
            id,
            self.external_id,
            self.display_name,
            self.avatar_url,
            role,
            self.active,
            self.created_at,
            self.updated_at,
        ))
    }
}

fn into_user(row: UserRow) -> Result<User, StoreError> {
    row.try_into_user().map_err(|e| store_error("user", e))
}

/// User store backed by the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"))
                .bind(value)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| store_error("user", e))?;
        row.map(into_user).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.fetch_one_by("id", &id.to_string()).await
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_by("external_id", external_id).await
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, external_id, display_name, avatar_url, role, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.external_id())
        .bind(user.display_name())
        .bind(user.avatar_url())
        .bind(user.role().as_str())
        .bind(user.is_active())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("user", e))?;

        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET display_name = $2, avatar_url = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.display_name())
        .bind(user.avatar_url())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", user.id()));
        }
        Ok(())
    }

    async fn set_role(&self, id: UserId, role: Role) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("user", e))?;

        row.map(into_user)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET active = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("user", e))?;

        row.map(into_user)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("user", e))?;

        rows.into_iter().map(into_user).collect()
    }

    async fn record_revocation(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET credentials_valid_after = GREATEST(COALESCE(credentials_valid_after, $2), $2)
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }

    async fn revocations_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<(UserId, DateTime<Utc>)>, StoreError> {
        let rows: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, credentials_valid_after FROM users WHERE credentials_valid_after > $1",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("user", e))?;

        rows.into_iter()
            .map(|(id, at)| {
                UserId::from_str(&id)
                    .map(|id| (id, at))
                    .map_err(|e| store_error("user", decode_error("user id", &id, e)))
            })
            .collect()
    }
}
