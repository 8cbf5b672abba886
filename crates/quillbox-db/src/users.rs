//! User repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use quillbox_core::{new_v7, Error, Result, User, UserRepository};

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        external_id: row.get("external_id"),
        profile: row.get("profile"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn upsert(&self, external_id: i64, profile: JsonValue) -> Result<User> {
        let row = sqlx::query(
            r#"INSERT INTO app_user (id, external_id, profile, created_at_utc)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (external_id) DO UPDATE SET profile = EXCLUDED.profile
               RETURNING id, external_id, profile, created_at_utc"#,
        )
        .bind(new_v7())
        .bind(external_id)
        .bind(&profile)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(user_from_row(&row))
    }

    async fn fetch(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query(
            "SELECT id, external_id, profile, created_at_utc FROM app_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::UserNotFound(id))?;

        Ok(user_from_row(&row))
    }
}
