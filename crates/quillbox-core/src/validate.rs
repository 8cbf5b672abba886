//! Explicit validation functions returning structured field-level results.
//!
//! Write requests are validated here before any persistence call. A failed
//! validation carries one [`FieldError`] per offending field so callers can
//! surface messages next to the right form field.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::defaults::TAG_NAME_MAX_LEN;
use crate::models::{CreateNoteRequest, UpdateNoteRequest};

/// A single validation failure attached to a named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field the failure applies to (e.g. `"title"`, `"user_id"`).
    pub field: String,
    /// Human-readable message for that field.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulated validation failures for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for a field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// True when no failures were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

/// Validate a tag name.
///
/// Rules:
/// - Length between 1-100 characters
/// - Allowed characters: lowercase alphanumeric, hyphens (-), underscores (_)
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    if tag.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.len() > TAG_NAME_MAX_LEN {
        return Err(format!(
            "Tag name must be {} characters or less",
            TAG_NAME_MAX_LEN
        ));
    }

    let invalid_chars: Vec<char> = tag
        .chars()
        .filter(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-' && *c != '_')
        .collect();

    if !invalid_chars.is_empty() {
        let chars_display: String = invalid_chars
            .iter()
            .take(5)
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "Tag contains invalid characters: {}. Only lowercase alphanumeric characters, hyphens, and underscores are allowed",
            chars_display
        ));
    }

    Ok(())
}

/// Validate a note creation request.
///
/// `user_id` must be a real id (non-nil) and any explicitly supplied tag
/// names must pass [`validate_tag_name`] after lowercasing. Title and body
/// carry no required-non-empty constraint at this layer.
pub fn validate_create(
    user_id: Uuid,
    req: &CreateNoteRequest,
) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if user_id.is_nil() {
        errors.push("user_id", "is required");
    }

    for name in &req.tags {
        if let Err(msg) = validate_tag_name(&name.to_lowercase()) {
            errors.push("tags", msg);
        }
    }

    errors.into_result()
}

/// Validate a partial note update.
///
/// At least one field must be supplied; an update that changes nothing is
/// rejected rather than silently bumping timestamps.
pub fn validate_update(req: &UpdateNoteRequest) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if req.title.is_none() && req.body.is_none() {
        errors.push("attrs", "at least one of title or body must be provided");
    }

    errors.into_result()
}
