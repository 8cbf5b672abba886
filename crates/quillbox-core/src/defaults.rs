//! Centralized default constants for quillbox.
//!
//! Shared default values referenced by both crates instead of scattered
//! magic numbers.

// =============================================================================
// EVENTS
// =============================================================================

/// Update bus buffer capacity for production processes.
pub const BUS_CAPACITY: usize = 256;

/// Update bus buffer capacity for tests.
pub const BUS_CAPACITY_TEST: usize = 32;

// =============================================================================
// TAGS
// =============================================================================

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_LEN: usize = 100;

// =============================================================================
// STORAGE
// =============================================================================

/// Default base directory for stored file content.
pub const STORAGE_PATH: &str = "./data";
