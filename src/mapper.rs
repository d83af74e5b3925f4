//! Event mapping: project a task record into a calendar event body.

use crate::config;
use crate::gcal::model::{EventDate, EventPayload};
use crate::model::TaskRecord;

/// Marker token tying a calendar event back to its source page. Embedded
/// in the event description and used as the search fallback query.
pub fn marker(page_id: &str) -> String {
    format!("notion-id:{page_id}")
}

/// Notes with the marker appended, unless they already end with it. The
/// endswith check keeps a re-mapped description from accumulating markers.
fn description_with_marker(notes: &str, page_id: &str) -> String {
    let suffix = format!("\n\n{}", marker(page_id));
    if notes.ends_with(&suffix) {
        notes.to_string()
    } else {
        format!("{notes}{suffix}")
    }
}

/// Build the event body for a task. Returns `None` for tasks without a
/// deadline start date; those produce no calendar event.
pub fn build_event(
    record: &TaskRecord,
    page_id: &str,
    cal: &config::Calendar,
) -> Option<EventPayload> {
    let start = record
        .deadline
        .as_ref()
        .map(|d| d.start.as_str())
        .unwrap_or_default();
    if start.is_empty() {
        return None;
    }

    // All-day event spanning the single deadline date. Only `start` is
    // read even when the source provides a range.
    let date = EventDate {
        date: start.to_string(),
        time_zone: cal.timezone.clone(),
    };

    Some(EventPayload {
        summary: format!(
            "{} | {} | {}",
            record.course_icon, record.title, record.task_type
        ),
        description: description_with_marker(&record.notes, page_id),
        color_id: cal.color_for(&record.status).to_string(),
        start: date.clone(),
        end: date,
    })
}
