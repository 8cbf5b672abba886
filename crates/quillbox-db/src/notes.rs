//! Note repository implementation.
//!
//! Writes run inside one transaction each: the note row, tag resolution,
//! and tag links commit or roll back together. Change notifications are
//! published only after a commit succeeds, so subscribers never observe an
//! event for data that failed to persist. Deleting a note removes stored
//! file content before any database row is touched and publishes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use quillbox_core::{
    new_v7, note_update_payload, note_update_topic, parse_submission, validate_create,
    validate_update, ChangeNotifier, CreateNoteRequest, Error, Note, NoteFile, NoteFull,
    NoteRepository, Result, Tag, UpdateNoteRequest,
};

use crate::files::StorageBackend;
use crate::tags::PgTagRepository;

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
    tags: PgTagRepository,
    storage: Arc<dyn StorageBackend>,
    notifier: Arc<dyn ChangeNotifier>,
}

fn note_from_row(row: &sqlx::postgres::PgRow) -> Note {
    Note {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        body: row.get("body"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

fn tag_from_row(row: &sqlx::postgres::PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        created_at_utc: row.get("created_at_utc"),
    }
}

fn file_from_row(row: &sqlx::postgres::PgRow) -> NoteFile {
    NoteFile {
        id: row.get("id"),
        note_id: row.get("note_id"),
        filename: row.get("filename"),
        storage_path: row.get("storage_path"),
        content_type: row.get("content_type"),
        size_bytes: row.get("size_bytes"),
        created_at_utc: row.get("created_at_utc"),
    }
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository.
    ///
    /// The storage backend and notifier are shared by reference: the
    /// backend with the file repository, the notifier with whatever the
    /// process wired up at startup.
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn StorageBackend>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            tags: PgTagRepository::new(pool.clone()),
            pool,
            storage,
            notifier,
        }
    }

    fn notify(&self, user_id: Uuid) {
        let topic = note_update_topic(user_id);
        debug!(
            subsystem = "db",
            component = "notes",
            user_id = %user_id,
            topic = %topic,
            "publishing note change event"
        );
        self.notifier.publish(&topic, &note_update_payload(user_id));
    }

    /// Insert a note with its tag links within an existing transaction.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        title: &str,
        body: &str,
        tag_names: &[String],
    ) -> Result<Uuid> {
        let note_id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO note (id, user_id, title, body, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(note_id)
        .bind(user_id)
        .bind(title)
        .bind(body)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let tags = self.tags.ensure_tx(tx, user_id, tag_names).await?;
        for tag in &tags {
            sqlx::query(
                "INSERT INTO note_tag (note_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT (note_id, tag_id) DO NOTHING",
            )
            .bind(note_id)
            .bind(tag.id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        }

        Ok(note_id)
    }

    /// Fetch a note with tags and files within an existing transaction.
    pub async fn fetch_tx(&self, tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<NoteFull> {
        let note_row = sqlx::query(
            "SELECT id, user_id, title, body, created_at_utc, updated_at_utc
             FROM note WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::NoteNotFound(id))?;

        let tag_rows = sqlx::query(
            "SELECT t.id, t.user_id, t.name, t.created_at_utc
             FROM note_tag nt
             JOIN tag t ON t.id = nt.tag_id
             WHERE nt.note_id = $1
             ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let file_rows = sqlx::query(
            "SELECT id, note_id, filename, storage_path, content_type, size_bytes, created_at_utc
             FROM note_file WHERE note_id = $1 ORDER BY created_at_utc",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(NoteFull {
            note: note_from_row(&note_row),
            tags: tag_rows.iter().map(tag_from_row).collect(),
            files: file_rows.iter().map(file_from_row).collect(),
        })
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn ingest(&self, user_id: Uuid, text: &str) -> Result<NoteFull> {
        let submission = parse_submission(text);
        info!(
            subsystem = "db",
            component = "notes",
            op = "ingest",
            user_id = %user_id,
            tag_count = submission.tag_names.len(),
            "ingesting raw submission"
        );
        self.create(
            user_id,
            CreateNoteRequest {
                title: submission.title,
                body: submission.body,
                tags: submission.tag_names,
            },
        )
        .await
    }

    async fn create(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<NoteFull> {
        validate_create(user_id, &req)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let note_id = self
            .create_tx(&mut tx, user_id, &req.title, &req.body, &req.tags)
            .await?;
        let full = self.fetch_tx(&mut tx, note_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        self.notify(user_id);
        Ok(full)
    }

    async fn fetch(&self, id: Uuid) -> Result<NoteFull> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let full = self.fetch_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(full)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<NoteFull>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let note_rows = sqlx::query(
            "SELECT id, user_id, title, body, created_at_utc, updated_at_utc
             FROM note WHERE user_id = $1
             ORDER BY created_at_utc DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let notes: Vec<Note> = note_rows.iter().map(note_from_row).collect();
        let ids: Vec<Uuid> = notes.iter().map(|n| n.id).collect();

        // One query each for tags and files across all notes, instead of
        // a pair of queries per note.
        let mut tags_by_note: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        let tag_rows = sqlx::query(
            "SELECT nt.note_id, t.id, t.user_id, t.name, t.created_at_utc
             FROM note_tag nt
             JOIN tag t ON t.id = nt.tag_id
             WHERE nt.note_id = ANY($1)
             ORDER BY t.name",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;
        for row in &tag_rows {
            let note_id: Uuid = row.get("note_id");
            tags_by_note.entry(note_id).or_default().push(tag_from_row(row));
        }

        let mut files_by_note: HashMap<Uuid, Vec<NoteFile>> = HashMap::new();
        let file_rows = sqlx::query(
            "SELECT id, note_id, filename, storage_path, content_type, size_bytes, created_at_utc
             FROM note_file WHERE note_id = ANY($1) ORDER BY created_at_utc",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;
        for row in &file_rows {
            let note_id: Uuid = row.get("note_id");
            files_by_note.entry(note_id).or_default().push(file_from_row(row));
        }

        tx.commit().await.map_err(Error::Database)?;

        Ok(notes
            .into_iter()
            .map(|note| {
                let id = note.id;
                NoteFull {
                    note,
                    tags: tags_by_note.remove(&id).unwrap_or_default(),
                    files: files_by_note.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<NoteFull> {
        validate_update(&req)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let user_id: Uuid = sqlx::query_scalar("SELECT user_id FROM note WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;

        let mut updates: Vec<String> = vec!["updated_at_utc = $1".to_string()];
        let now = Utc::now();
        // $1 = now, $2 = id, then dynamic params start at $3
        let mut param_idx = 3;

        if req.title.is_some() {
            updates.push(format!("title = ${}", param_idx));
            param_idx += 1;
        }
        if req.body.is_some() {
            updates.push(format!("body = ${}", param_idx));
        }

        let query = format!("UPDATE note SET {} WHERE id = $2", updates.join(", "));

        let mut q = sqlx::query(&query).bind(now).bind(id);
        if let Some(title) = &req.title {
            q = q.bind(title);
        }
        if let Some(body) = &req.body {
            q = q.bind(body);
        }
        q.execute(&mut *tx).await.map_err(Error::Database)?;

        let full = self.fetch_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        self.notify(user_id);
        Ok(full)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Re-fetch for the current file set; a stale caller-side snapshot
        // could miss attachments added since.
        let full = self.fetch_tx(&mut tx, id).await?;

        // Stored content goes first. Any failure aborts the whole delete
        // with every database row still in place, so a note never ends up
        // pointing at vanished content.
        for file in &full.files {
            self.storage.delete(&file.storage_path).await?;
        }

        // Cascades remove tag links and file rows; tag rows survive.
        sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            note_id = %id,
            file_count = full.files.len(),
            "note deleted"
        );
        // No notification on delete.
        Ok(())
    }
}
