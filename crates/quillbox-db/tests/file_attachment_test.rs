//! File attachments: storage round-trips and delete-in-lockstep semantics.

use std::sync::Arc;

use async_trait::async_trait;
use quillbox_db::test_fixtures::TestDatabase;
use quillbox_db::{Error, FilesystemBackend, NoteRepository, Result, StorageBackend};

/// Backend double that refuses to delete one poisoned path.
struct PoisonedBackend {
    inner: FilesystemBackend,
    poisoned_path: String,
}

#[async_trait]
impl StorageBackend for PoisonedBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.inner.write(path, data).await
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if path == self.poisoned_path {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "cannot remove stored content",
            )));
        }
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.inner.exists(path).await
    }
}

#[tokio::test]
async fn test_attach_and_download_round_trip() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;
    let note = test_db
        .db
        .notes
        .ingest(user.id, "With attachment")
        .await
        .expect("ingest should succeed");

    let attached = test_db
        .db
        .files
        .attach(note.note.id, "list.txt", Some("text/plain"), b"milk, eggs")
        .await
        .expect("attach should succeed");
    assert_eq!(attached.content_type, "text/plain");
    assert_eq!(attached.size_bytes, 10);

    let (data, content_type, filename) = test_db
        .db
        .files
        .download(attached.id)
        .await
        .expect("download should succeed");
    assert_eq!(data, b"milk, eggs");
    assert_eq!(content_type, "text/plain");
    assert_eq!(filename, "list.txt");

    // The attachment shows up on the fetched note.
    let fetched = test_db
        .db
        .notes
        .fetch(note.note.id)
        .await
        .expect("fetch should succeed");
    assert_eq!(fetched.files.len(), 1);
    assert_eq!(fetched.files[0].id, attached.id);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_attach_detects_content_type_from_magic_bytes() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;
    let note = test_db
        .db
        .notes
        .ingest(user.id, "Image note")
        .await
        .expect("ingest should succeed");

    let png_header = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let attached = test_db
        .db
        .files
        .attach(note.note.id, "pic.png", None, &png_header)
        .await
        .expect("attach should succeed");
    assert_eq!(attached.content_type, "image/png");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_detach_single_file_removes_content_then_row() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;
    let note = test_db
        .db
        .notes
        .ingest(user.id, "One attachment")
        .await
        .expect("ingest should succeed");

    let attached = test_db
        .db
        .files
        .attach(note.note.id, "a.txt", Some("text/plain"), b"aaa")
        .await
        .expect("attach should succeed");

    test_db
        .db
        .files
        .delete(attached.id)
        .await
        .expect("detach should succeed");

    let backend = FilesystemBackend::new(test_db.storage_dir());
    assert!(!backend.exists(&attached.storage_path).await.unwrap());

    let fetched = test_db
        .db
        .notes
        .fetch(note.note.id)
        .await
        .expect("fetch should succeed");
    assert!(fetched.files.is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_delete_note_removes_all_file_content_and_rows() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;
    let note = test_db
        .db
        .notes
        .ingest(user.id, "Two attachments")
        .await
        .expect("ingest should succeed");

    let first = test_db
        .db
        .files
        .attach(note.note.id, "a.txt", Some("text/plain"), b"aaa")
        .await
        .expect("attach should succeed");
    let second = test_db
        .db
        .files
        .attach(note.note.id, "b.txt", Some("text/plain"), b"bbb")
        .await
        .expect("attach should succeed");

    test_db
        .db
        .notes
        .delete(note.note.id)
        .await
        .expect("delete should succeed");

    // Content is gone from the backend.
    let backend = FilesystemBackend::new(test_db.storage_dir());
    assert!(!backend.exists(&first.storage_path).await.unwrap());
    assert!(!backend.exists(&second.storage_path).await.unwrap());

    // Rows are gone too.
    assert!(matches!(
        test_db.db.files.download(first.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        test_db.db.files.download(second.id).await,
        Err(Error::NotFound(_))
    ));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_failed_content_removal_aborts_the_whole_delete() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;
    let note = test_db
        .db
        .notes
        .ingest(user.id, "Sticky attachments")
        .await
        .expect("ingest should succeed");

    test_db
        .db
        .files
        .attach(note.note.id, "a.txt", Some("text/plain"), b"aaa")
        .await
        .expect("attach should succeed");
    let second = test_db
        .db
        .files
        .attach(note.note.id, "b.txt", Some("text/plain"), b"bbb")
        .await
        .expect("attach should succeed");

    // Same schema, same rows, but a backend that cannot remove the
    // second file's content.
    let poisoned = test_db.database_with_backend(Arc::new(PoisonedBackend {
        inner: FilesystemBackend::new(test_db.storage_dir()),
        poisoned_path: second.storage_path.clone(),
    }));

    let result = poisoned.notes.delete(note.note.id).await;
    assert!(matches!(result, Err(Error::Io(_))));

    // The note row and both file rows are still there.
    let fetched = test_db
        .db
        .notes
        .fetch(note.note.id)
        .await
        .expect("note must survive a failed delete");
    assert_eq!(fetched.files.len(), 2);

    test_db.cleanup().await;
}
