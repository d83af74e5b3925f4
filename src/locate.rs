//! Sink locator: find the calendar event belonging to a source page.
//!
//! The persisted link table is consulted first and each hit is verified
//! against the calendar so stale links get dropped. Pages without a usable
//! link fall back to a free-text search for the embedded marker, and a
//! search hit is adopted into the table. Every failure along the way is
//! logged and degrades to "not found"; callers then take the create path,
//! which at worst duplicates an event rather than losing one.

use tracing::{debug, info, warn};

use crate::db::{self, Pool};
use crate::gcal::model::Event;
use crate::gcal::CalendarService;
use crate::mapper;

/// Locate the event for `page_id`, or `None` when no live event is known.
pub async fn locate_event(
    pool: &Pool,
    calendar: &dyn CalendarService,
    page_id: &str,
) -> Option<Event> {
    match db::find_event_link(pool, page_id).await {
        Ok(Some(link)) => match calendar.get_event(&link.gcal_event_id).await {
            Ok(Some(event)) => {
                debug!(page_id, event_id = %event.id, "located event via link table");
                return Some(event);
            }
            Ok(None) => {
                info!(
                    page_id,
                    event_id = %link.gcal_event_id,
                    "linked event no longer exists, dropping stale link"
                );
                if let Err(err) = db::delete_event_link(pool, page_id).await {
                    warn!(page_id, error = %err, "failed to drop stale event link");
                }
            }
            Err(err) => {
                // Transient verification failure. Keep the link and let the
                // marker search decide.
                warn!(page_id, error = %err, "event lookup by link failed");
            }
        },
        Ok(None) => {}
        Err(err) => warn!(page_id, error = %err, "event link lookup failed"),
    }

    search_by_marker(pool, calendar, page_id).await
}

/// Free-text search for the marker token. First live match wins; the match
/// is recorded in the link table for direct lookup next time.
async fn search_by_marker(
    pool: &Pool,
    calendar: &dyn CalendarService,
    page_id: &str,
) -> Option<Event> {
    let marker = mapper::marker(page_id);
    match calendar.search_events(&marker).await {
        Ok(events) => {
            let event = events.into_iter().find(|e| !e.is_cancelled())?;
            debug!(page_id, event_id = %event.id, "located event via marker search");
            if let Err(err) = db::upsert_event_link(pool, page_id, &event.id).await {
                warn!(page_id, error = %err, "failed to adopt event link");
            }
            Some(event)
        }
        Err(err) => {
            warn!(page_id, error = %err, "marker search failed, treating as not found");
            None
        }
    }
}
