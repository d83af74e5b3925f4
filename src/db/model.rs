//! Database entity and view models used by repositories.
//!
//! Keep these structs focused on the data returned by queries. Business logic
//! should live in higher layers.

use chrono::{DateTime, Utc};

/// Persisted link from a source page to the calendar event created for it.
/// The durable idempotency record consulted before any marker search.
#[derive(Debug, Clone)]
pub struct EventLink {
    pub notion_page_id: String,
    pub gcal_event_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
