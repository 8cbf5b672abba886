//! Data model types shared across quillbox crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// An application user, referenced only as the tenant key for notes and
/// tags. Identity itself lives with the external auth provider; the row
/// carries the provider's numeric id and its opaque profile payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Numeric identity assigned by the external auth provider.
    pub external_id: i64,
    /// Opaque profile payload from the provider, stored as-is.
    pub profile: JsonValue,
    pub created_at_utc: DateTime<Utc>,
}

/// Note row: title plus markdown body, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// A user-scoped tag. Names are stored lowercase without the leading `#`
/// and are unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Tag with the number of notes carrying it, for the tag index view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
    pub note_count: i64,
}

/// A file attached to a note. The content lives in the storage backend at
/// `storage_path`; the row is deleted in lockstep with its note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFile {
    pub id: Uuid,
    pub note_id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at_utc: DateTime<Utc>,
}

/// A note with its tags and attached files populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteFull {
    pub note: Note,
    pub tags: Vec<Tag>,
    pub files: Vec<NoteFile>,
}

impl NoteFull {
    /// Tag names as a sorted list, for order-independent comparisons.
    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tags.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }
}

/// Request for creating a note with explicit fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub body: String,
    /// Explicit tag names; lowercased before resolution.
    pub tags: Vec<String>,
}

/// Partial field changes for an existing note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}
