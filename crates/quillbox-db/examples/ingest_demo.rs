//! Ingest a note from the command line and watch the change event arrive.
//!
//! Usage:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/quillbox \
//!     cargo run --example ingest_demo -- "Shopping\nBuy milk #errands"
//! ```

use std::sync::Arc;

use quillbox_core::UpdateBus;
use quillbox_db::{Config, Database, NoteRepository, UserRepository};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let text = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Shopping\nBuy milk #errands #food".to_string())
        .replace("\\n", "\n");

    let config = Config::from_env()?;
    let bus = Arc::new(UpdateBus::new(config.bus_capacity));
    let mut events = bus.subscribe();

    let db = Database::from_config(&config, bus.clone()).await?;

    let user = db.users.upsert(1, serde_json::json!({ "name": "demo" })).await?;
    let note = db.notes.ingest(user.id, &text).await?;

    println!("created note {}", note.note.id);
    println!("  title: {:?}", note.note.title);
    println!("  body:  {:?}", note.note.body);
    println!("  tags:  {:?}", note.tag_names());

    let event = events.recv().await?;
    println!("received event on {}: {}", event.topic, event.payload);

    Ok(())
}
