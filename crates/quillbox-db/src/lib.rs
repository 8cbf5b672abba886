//! # quillbox-db
//!
//! PostgreSQL database layer for quillbox.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for users, notes, tags, and files
//! - Free-text ingestion wired through tag resolution and change events
//! - Filesystem-backed attachment storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quillbox_core::{defaults, UpdateBus};
//! use quillbox_db::{Database, FilesystemBackend, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Arc::new(UpdateBus::new(defaults::BUS_CAPACITY));
//!     let storage = Arc::new(FilesystemBackend::new("./data"));
//!     let db = Database::connect("postgres://localhost/quillbox", storage, bus).await?;
//!
//!     let note = db.notes.ingest(user_id, "Shopping\nBuy milk #errands").await?;
//!     println!("Created note: {}", note.note.id);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod config;
pub mod files;
pub mod notes;
pub mod pool;
pub mod tags;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use quillbox_core::*;

// Re-export repository implementations
pub use config::Config;
pub use files::{
    detect_content_type, generate_storage_path, FilesystemBackend, PgFileRepository,
    StorageBackend,
};
pub use notes::PgNoteRepository;
pub use pool::{log_pool_health, PoolConfig};
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::PgPool,
    /// User repository for tenant-key records.
    pub users: PgUserRepository,
    /// Note repository for CRUD and ingestion.
    pub notes: PgNoteRepository,
    /// Tag repository for per-user tag resolution.
    pub tags: PgTagRepository,
    /// File repository for note attachments.
    pub files: PgFileRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    ///
    /// The storage backend is shared between the note and file
    /// repositories; the notifier is whatever the process wired up at
    /// startup (an `UpdateBus`, or `NullNotifier` for batch contexts).
    pub fn new(
        pool: sqlx::PgPool,
        storage: Arc<dyn StorageBackend>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone(), storage.clone(), notifier),
            tags: PgTagRepository::new(pool.clone()),
            files: PgFileRepository::new(pool.clone(), storage),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(
        url: &str,
        storage: Arc<dyn StorageBackend>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Result<Self> {
        let pool = pool::PoolConfig::default().connect(url).await?;
        Ok(Self::new(pool, storage, notifier))
    }

    /// Create from environment configuration, validating the storage
    /// backend with a write/read/delete round-trip before first use.
    pub async fn from_config(config: &Config, notifier: Arc<dyn ChangeNotifier>) -> Result<Self> {
        let backend = FilesystemBackend::new(&config.storage_path);
        backend
            .validate()
            .await
            .map_err(|e| Error::Config(format!("storage backend unusable: {e}")))?;

        let pool = config.pool.connect(&config.database_url).await?;
        Ok(Self::new(pool, Arc::new(backend), notifier))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}
