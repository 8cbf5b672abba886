//! # quillbox-core
//!
//! Core types, traits, and abstractions for the quillbox note-taking
//! library.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the database crate depends on: the error taxonomy,
//! entity models, free-text ingestion parsing, the change notification
//! bus, validation, and the markdown renderer.

pub mod defaults;
pub mod error;
pub mod events;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod render;
pub mod traits;
pub mod uuid_utils;
pub mod validate;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{
    note_update_payload, note_update_topic, ChangeNotifier, NullNotifier, UpdateBus, UpdateEvent,
};
pub use ingest::{extract_hashtags, parse_submission, split_title_body, Submission};
pub use models::*;
pub use render::{render, CmarkConverter, Converted, MarkupConverter};
pub use traits::*;
pub use uuid_utils::new_v7;
pub use validate::{
    validate_create, validate_tag_name, validate_update, FieldError, ValidationErrors,
};
