//! Change notification bus for live-updating sessions.
//!
//! Repositories publish a "notes changed for user X" event after a write
//! transaction commits; the external view layer subscribes and re-queries
//! on receipt. Delivery is fire-and-forget, at-most-once, with no replay:
//! subscribers only see events published while they are subscribed, and an
//! event carries no state beyond the topic, so consumers must re-query.
//!
//! The bus is constructed once at startup and passed by `Arc` to the
//! repository components; there is no global registry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Topic prefix for per-user note change events.
pub const NOTE_UPDATE_TOPIC_PREFIX: &str = "note-update";

/// Topic for a user's note change events: `note-update:<user_id>`.
pub fn note_update_topic(user_id: Uuid) -> String {
    format!("{}:{}", NOTE_UPDATE_TOPIC_PREFIX, user_id)
}

/// Payload for a user's note change events.
pub fn note_update_payload(user_id: Uuid) -> String {
    format!("notes updated for {}", user_id)
}

/// A published change event.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateEvent {
    /// Logical channel the event was published on.
    pub topic: String,
    /// Informational payload; carries no authoritative state.
    pub payload: String,
    /// When the event was published (UTC).
    pub published_at: DateTime<Utc>,
}

/// Publisher seam injected into repositories.
///
/// Core code only ever calls `publish`; subscription and consumption are
/// owned by the external layer.
pub trait ChangeNotifier: Send + Sync {
    /// Broadcast an event on a topic. Fire-and-forget: events published
    /// with no active subscribers are dropped.
    fn publish(&self, topic: &str, payload: &str);
}

/// Broadcast-based bus distributing [`UpdateEvent`]s to all subscribers.
///
/// Wraps `tokio::sync::broadcast`. Slow receivers that fall behind get a
/// `Lagged` error and miss events; freshness matters more than
/// completeness here since subscribers re-query on every event.
pub struct UpdateBus {
    tx: broadcast::Sender<UpdateEvent>,
}

impl UpdateBus {
    /// Create a new bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ChangeNotifier for UpdateBus {
    fn publish(&self, topic: &str, payload: &str) {
        let event = UpdateEvent {
            topic: topic.to_string(),
            payload: payload.to_string(),
            published_at: Utc::now(),
        };
        tracing::debug!(
            topic = %event.topic,
            subscriber_count = self.tx.receiver_count(),
            "UpdateBus publish"
        );
        let _ = self.tx.send(event);
    }
}

/// Notifier that drops everything, for contexts without a UI (batch
/// imports, tests that don't assert on events).
pub struct NullNotifier;

impl ChangeNotifier for NullNotifier {
    fn publish(&self, _topic: &str, _payload: &str) {}
}
