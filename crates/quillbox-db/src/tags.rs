//! Tag repository implementation.
//!
//! Tag resolution is idempotent get-or-create scoped to one user. The
//! read-then-create race between concurrent ingestions is closed by the
//! `(user_id, name)` unique index plus conflict-tolerant inserts: both
//! transactions converge on the same row instead of erroring or retrying.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use quillbox_core::{
    new_v7, validate_tag_name, Error, Result, Tag, TagRepository, TagWithCount,
};

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: PgPool,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve tags within an existing transaction.
    ///
    /// Lowercases and deduplicates the requested names, inserts the missing
    /// ones with `ON CONFLICT DO NOTHING`, and returns the full requested
    /// set in one re-select. Empty input returns without touching storage.
    pub async fn ensure_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Tag>> {
        // Duplicates in the input collapse here; BTreeSet keeps the
        // insert order deterministic.
        let wanted: BTreeSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        for name in &wanted {
            validate_tag_name(name).map_err(Error::InvalidInput)?;
        }

        let now = Utc::now();
        for name in &wanted {
            sqlx::query(
                "INSERT INTO tag (id, user_id, name, created_at_utc) VALUES ($1, $2, $3, $4)
                 ON CONFLICT (user_id, name) DO NOTHING",
            )
            .bind(new_v7())
            .bind(user_id)
            .bind(name)
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        }

        let wanted: Vec<String> = wanted.into_iter().collect();
        let rows = sqlx::query(
            "SELECT id, user_id, name, created_at_utc FROM tag
             WHERE user_id = $1 AND name = ANY($2)
             ORDER BY name",
        )
        .bind(user_id)
        .bind(&wanted)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                user_id: row.get("user_id"),
                name: row.get("name"),
                created_at_utc: row.get("created_at_utc"),
            })
            .collect())
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn ensure(&self, user_id: Uuid, names: &[String]) -> Result<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let tags = self.ensure_tx(&mut tx, user_id, names).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(tags)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<TagWithCount>> {
        let rows = sqlx::query(
            r#"
            SELECT
                t.id,
                t.user_id,
                t.name,
                t.created_at_utc,
                COUNT(nt.note_id) as note_count
            FROM tag t
            LEFT JOIN note_tag nt ON nt.tag_id = t.id
            WHERE t.user_id = $1
            GROUP BY t.id, t.user_id, t.name, t.created_at_utc
            ORDER BY t.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TagWithCount {
                id: row.get("id"),
                user_id: row.get("user_id"),
                name: row.get("name"),
                created_at_utc: row.get("created_at_utc"),
                note_count: row.get("note_count"),
            })
            .collect())
    }

    async fn names_for_note(&self, note_id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT t.name FROM note_tag nt
             JOIN tag t ON t.id = nt.tag_id
             WHERE nt.note_id = $1
             ORDER BY t.name",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }
}
