//! Core traits for quillbox abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Repository for note CRUD operations and text ingestion.
///
/// Write operations run inside one database transaction each; a successful
/// `ingest`, `create`, or `update` publishes exactly one change event for
/// the owning user after the transaction commits. `delete` publishes none.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Ingest a raw free-text submission into a structured note.
    ///
    /// The first line becomes the title, the remainder the body, and
    /// `#tag` tokens anywhere in the text become tags. Empty input yields
    /// an empty note rather than an error.
    async fn ingest(&self, user_id: Uuid, text: &str) -> Result<NoteFull>;

    /// Create a note from explicit fields, validating first.
    async fn create(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<NoteFull>;

    /// Fetch a note with tags and files populated.
    async fn fetch(&self, id: Uuid) -> Result<NoteFull>;

    /// List all notes owned by a user, with tags and files populated.
    async fn list(&self, user_id: Uuid) -> Result<Vec<NoteFull>>;

    /// Apply partial field changes, validating first.
    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<NoteFull>;

    /// Delete a note, its tag links, and its files (stored content first).
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// TAG REPOSITORY
// =============================================================================

/// Repository for user-scoped tag resolution.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Resolve names to tags, creating the missing ones.
    ///
    /// Names are lowercased first; duplicates in the input collapse to one
    /// tag. Returns one tag per distinct requested name. Empty input
    /// short-circuits without touching storage.
    async fn ensure(&self, user_id: Uuid, names: &[String]) -> Result<Vec<Tag>>;

    /// List a user's tags with per-tag note counts.
    async fn list(&self, user_id: Uuid) -> Result<Vec<TagWithCount>>;

    /// Tag names attached to a note, sorted.
    async fn names_for_note(&self, note_id: Uuid) -> Result<Vec<String>>;
}

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Repository for the tenant-key user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or refresh a user keyed on the external provider identity.
    ///
    /// Repeat sign-ins reuse the existing row and replace the stored
    /// profile payload.
    async fn upsert(&self, external_id: i64, profile: JsonValue) -> Result<User>;

    /// Fetch a user by id.
    async fn fetch(&self, id: Uuid) -> Result<User>;
}
