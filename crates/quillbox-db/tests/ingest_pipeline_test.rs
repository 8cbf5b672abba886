//! End-to-end ingestion: raw text in, structured note + change event out.

use quillbox_db::test_fixtures::TestDatabase;
use quillbox_db::{note_update_topic, Error, NoteRepository};
use uuid::Uuid;

#[tokio::test]
async fn test_ingest_splits_title_and_body_and_extracts_tags() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let note = test_db
        .db
        .notes
        .ingest(user.id, "Shopping\nBuy milk #errands #food")
        .await
        .expect("ingest should succeed");

    assert_eq!(note.note.title, "Shopping");
    assert_eq!(note.note.body, "Buy milk #errands #food");
    assert_eq!(note.tag_names(), vec!["errands", "food"]);

    let topic = note_update_topic(user.id);
    assert_eq!(test_db.notifier.count_for_topic(&topic), 1);
    let events = test_db.notifier.events();
    assert_eq!(events[0].1, format!("notes updated for {}", user.id));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_ingest_without_newline_uses_whole_text_as_title() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let note = test_db
        .db
        .notes
        .ingest(user.id, "  single line note  ")
        .await
        .expect("ingest should succeed");

    assert_eq!(note.note.title, "single line note");
    assert_eq!(note.note.body, "");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_ingest_empty_input_creates_empty_note() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let note = test_db
        .db
        .notes
        .ingest(user.id, "")
        .await
        .expect("empty input must not fail");

    assert_eq!(note.note.title, "");
    assert_eq!(note.note.body, "");
    assert!(note.tags.is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_ingest_ignores_mixed_case_and_numeric_tokens() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let note = test_db
        .db
        .notes
        .ingest(user.id, "Tokens\n#foo #bar #Foo #123")
        .await
        .expect("ingest should succeed");

    assert_eq!(note.tag_names(), vec!["bar", "foo"]);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_ingest_collapses_duplicate_hashtags() {
    let test_db = TestDatabase::new().await;
    let user = test_db.seed_user().await;

    let note = test_db
        .db
        .notes
        .ingest(user.id, "#todo list\nmore #todo items")
        .await
        .expect("ingest should succeed");

    assert_eq!(note.tag_names(), vec!["todo"]);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_failed_validation_publishes_nothing() {
    let test_db = TestDatabase::new().await;

    let result = test_db.db.notes.ingest(Uuid::nil(), "Title\nbody").await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(test_db.notifier.events().is_empty());

    test_db.cleanup().await;
}
