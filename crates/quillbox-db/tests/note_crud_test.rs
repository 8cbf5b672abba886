//! Note CRUD behavior: round-trips, validation, notification counts.

use quillbox_db::test_fixtures::TestDatabase;
use quillbox_db::{
    note_update_topic, CreateNoteRequest, Error, NoteRepository, UpdateNoteRequest,
};
use uuid::Uuid;

fn names(strs: &[&str]) -> Vec<String> {
    strs.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_create_then_fetch_round_trip() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let created = test_db
        .db
        .notes
        .create(
            user.id,
            CreateNoteRequest {
                title: "Round trip".to_string(),
                body: "body text".to_string(),
                tags: names(&["a", "b"]),
            },
        )
        .await
        .expect("create should succeed");

    let fetched = test_db
        .db
        .notes
        .fetch(created.note.id)
        .await
        .expect("fetch should succeed");

    assert_eq!(fetched.note, created.note);
    assert_eq!(fetched.tag_names(), vec!["a", "b"]);
    assert!(fetched.files.is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_fetch_unknown_id_is_not_found() {
    let test_db = TestDatabase::new().await;

    let missing = Uuid::now_v7();
    let result = test_db.db.notes.fetch(missing).await;
    assert!(matches!(result, Err(Error::NoteNotFound(id)) if id == missing));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_list_returns_only_owners_notes() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.seed_user().await;
    let bob = test_db.seed_user().await;

    test_db
        .db
        .notes
        .ingest(alice.id, "alice first")
        .await
        .expect("ingest should succeed");
    test_db
        .db
        .notes
        .ingest(alice.id, "alice second")
        .await
        .expect("ingest should succeed");
    test_db
        .db
        .notes
        .ingest(bob.id, "bob only")
        .await
        .expect("ingest should succeed");

    let notes = test_db.db.notes.list(alice.id).await.expect("list should succeed");
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| n.note.user_id == alice.id));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_persists_fields_and_notifies_once() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let created = test_db
        .db
        .notes
        .ingest(user.id, "Before\nold body")
        .await
        .expect("ingest should succeed");

    let updated = test_db
        .db
        .notes
        .update(
            created.note.id,
            UpdateNoteRequest {
                title: Some("After".to_string()),
                body: None,
            },
        )
        .await
        .expect("update should succeed");

    assert_eq!(updated.note.title, "After");
    assert_eq!(updated.note.body, "old body");
    assert!(updated.note.updated_at_utc > created.note.updated_at_utc);

    // One event for the ingest, one for the update.
    let topic = note_update_topic(user.id);
    assert_eq!(test_db.notifier.count_for_topic(&topic), 2);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_with_no_fields_is_a_validation_error() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let created = test_db
        .db
        .notes
        .ingest(user.id, "unchanged")
        .await
        .expect("ingest should succeed");
    let events_before = test_db.notifier.events().len();

    let result = test_db
        .db
        .notes
        .update(created.note.id, UpdateNoteRequest::default())
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    // Nothing persisted, nothing published.
    let fetched = test_db
        .db
        .notes
        .fetch(created.note.id)
        .await
        .expect("fetch should succeed");
    assert_eq!(fetched.note.updated_at_utc, created.note.updated_at_utc);
    assert_eq!(test_db.notifier.events().len(), events_before);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let test_db = TestDatabase::new().await;

    let result = test_db
        .db
        .notes
        .update(
            Uuid::now_v7(),
            UpdateNoteRequest {
                title: Some("x".to_string()),
                body: None,
            },
        )
        .await;
    assert!(matches!(result, Err(Error::NoteNotFound(_))));
    assert!(test_db.notifier.events().is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_delete_removes_note_but_keeps_tags() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let created = test_db
        .db
        .notes
        .ingest(user.id, "Disposable\n#keepme")
        .await
        .expect("ingest should succeed");
    let events_before = test_db.notifier.events().len();

    test_db
        .db
        .notes
        .delete(created.note.id)
        .await
        .expect("delete should succeed");

    let result = test_db.db.notes.fetch(created.note.id).await;
    assert!(matches!(result, Err(Error::NoteNotFound(_))));

    // The tag row survives its last note.
    use quillbox_db::TagRepository;
    let tags = test_db.db.tags.list(user.id).await.expect("list should succeed");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "keepme");
    assert_eq!(tags[0].note_count, 0);

    // Delete publishes nothing.
    assert_eq!(test_db.notifier.events().len(), events_before);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_found() {
    let test_db = TestDatabase::new().await;

    let result = test_db.db.notes.delete(Uuid::now_v7()).await;
    assert!(matches!(result, Err(Error::NoteNotFound(_))));

    test_db.cleanup().await;
}
