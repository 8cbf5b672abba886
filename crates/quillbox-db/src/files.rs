//! File attachment storage: pluggable content backend plus the note_file
//! repository.
//!
//! Content lives outside the database under UUIDv7-sharded paths; the
//! `note_file` row records where. Writes are atomic (temp file + rename)
//! so a crashed upload never leaves a half-written blob at its final path.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use quillbox_core::{new_v7, Error, NoteFile, Result};

/// Storage backend trait for different storage implementations.
///
/// Allows abstracting over filesystem, S3, or other storage providers.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem storage backend.
///
/// Stores files in a directory hierarchy based on UUIDv7 blob ids.
/// Path format: `{base_path}/blobs/{first-2-hex}/{next-2-hex}/{uuid}.bin`
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Validate that the backend can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (permission errors, missing directories, overlayfs quirks) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("blobs/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_back = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_back != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(storage_path = %path, size = data.len(), "file storage write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "rename failed");
            e
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        Ok(fs::read(full_path).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        // Already-absent content counts as removed; real I/O errors propagate.
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path);
        Ok(fs::try_exists(full_path).await?)
    }
}

/// Generate a storage path from a file id.
///
/// Path format: `blobs/{first-2-hex}/{next-2-hex}/{uuid}.bin`
///
/// Example: `blobs/01/94/01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f.bin`
pub fn generate_storage_path(id: &Uuid) -> String {
    let hex = id.as_hyphenated().to_string().replace('-', "");
    format!(
        "blobs/{}/{}/{}.bin",
        &hex[0..2],
        &hex[2..4],
        id.as_hyphenated()
    )
}

/// Detect a MIME type for uploaded data.
///
/// Uses the caller-supplied content type when present, otherwise falls
/// back to magic-byte detection, otherwise `application/octet-stream`.
pub fn detect_content_type(declared: Option<&str>, data: &[u8]) -> String {
    if let Some(ct) = declared {
        if !ct.is_empty() {
            return ct.to_string();
        }
    }
    infer::get(data)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// PostgreSQL file attachment repository.
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
    backend: Arc<dyn StorageBackend>,
}

fn note_file_from_row(row: &sqlx::postgres::PgRow) -> NoteFile {
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

impl PgFileRepository {
    /// Create a new file repository over a shared storage backend.
    pub fn new(pool: PgPool, backend: Arc<dyn StorageBackend>) -> Self {
        Self { pool, backend }
    }

    /// Attach a file to a note.
    ///
    /// Writes the content to the backend first, then records the row. If
    /// the row insert fails the written content is removed best-effort so
    /// the backend does not accumulate orphans.
    pub async fn attach(
        &self,
        note_id: Uuid,
        filename: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<NoteFile> {
        let file_id = new_v7();
        let storage_path = generate_storage_path(&file_id);
        let content_type = detect_content_type(content_type, data);

        self.backend.write(&storage_path, data).await?;

        let inserted = sqlx::query(
            r#"INSERT INTO note_file
               (id, note_id, filename, storage_path, content_type, size_bytes, created_at_utc)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, note_id, filename, storage_path, content_type, size_bytes, created_at_utc"#,
        )
        .bind(file_id)
        .bind(note_id)
        .bind(filename)
        .bind(&storage_path)
        .bind(&content_type)
        .bind(data.len() as i64)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Ok(note_file_from_row(&row)),
            Err(e) => {
                if let Err(cleanup) = self.backend.delete(&storage_path).await {
                    warn!(storage_path = %storage_path, error = %cleanup, "orphan cleanup failed");
                }
                Err(Error::Database(e))
            }
        }
    }

    /// Download file content by id.
    ///
    /// Returns a tuple of (data, content_type, filename).
    pub async fn download(&self, file_id: Uuid) -> Result<(Vec<u8>, String, String)> {
        let row = sqlx::query(
            "SELECT filename, storage_path, content_type FROM note_file WHERE id = $1",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("File {} not found", file_id)))?;

        let storage_path: String = row.get("storage_path");
        let data = self.backend.read(&storage_path).await?;

        Ok((data, row.get("content_type"), row.get("filename")))
    }

    /// List all files attached to a note, oldest first.
    pub async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<NoteFile>> {
        let rows = sqlx::query(
            "SELECT id, note_id, filename, storage_path, content_type, size_bytes, created_at_utc
             FROM note_file WHERE note_id = $1 ORDER BY created_at_utc",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(note_file_from_row).collect())
    }

    /// Detach a single file: stored content first, then the row.
    ///
    /// A content removal failure aborts before the row is touched, so the
    /// database never points at vanished content the other way around.
    pub async fn delete(&self, file_id: Uuid) -> Result<()> {
        let row = sqlx::query("SELECT storage_path FROM note_file WHERE id = $1")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("File {} not found", file_id)))?;

        let storage_path: String = row.get("storage_path");
        self.backend.delete(&storage_path).await?;

        sqlx::query("DELETE FROM note_file WHERE id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
