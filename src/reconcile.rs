//! Reconciler: drive one source page to its calendar event.
//!
//! Upserts run extract → resolve course → map → locate → create-or-update;
//! deletes run locate → delete. Reconciliations for the same page are
//! serialized through a per-ID lock so concurrent notifications cannot race
//! each other into duplicate events.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::config;
use crate::course::{self, CourseInfo};
use crate::db::{self, Pool};
use crate::extract::{self, TaskFields};
use crate::gcal::CalendarService;
use crate::locate;
use crate::mapper;
use crate::model::FieldSource;
use crate::notion::NotionService;

/// Per-identifier mutual exclusion. At most one reconciliation per page ID
/// is in flight at a time; distinct pages proceed independently. Entries
/// are never evicted, the map is bounded by the number of distinct pages
/// seen during a process lifetime.
#[derive(Clone, Default)]
pub struct IdLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl IdLocks {
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// What a reconciliation did to the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { event_id: String },
    Updated { event_id: String },
    SkippedNoDeadline,
    Deleted { event_id: String },
    NothingToDelete,
}

pub struct Reconciler {
    pool: Pool,
    notion: Arc<dyn NotionService>,
    calendar: Arc<dyn CalendarService>,
    calendar_cfg: config::Calendar,
    locks: IdLocks,
}

impl Reconciler {
    pub fn new(
        pool: Pool,
        notion: Arc<dyn NotionService>,
        calendar: Arc<dyn CalendarService>,
        calendar_cfg: config::Calendar,
    ) -> Self {
        Self {
            pool,
            notion,
            calendar,
            calendar_cfg,
            locks: IdLocks::default(),
        }
    }

    /// Bring the calendar event for `page_id` in line with the current page
    /// state, creating it if needed. Tasks without a deadline produce no
    /// event; an existing event is left untouched in that case.
    #[instrument(skip_all)]
    pub async fn upsert(&self, page_id: &str) -> Result<Outcome> {
        let _guard = self.locks.acquire(page_id).await;

        let page = self.notion.retrieve_page(page_id).await?;
        let fields = extract::extract_task(&page);
        let course =
            course::resolve_course(self.notion.as_ref(), fields.course.value.as_deref()).await;
        log_field_sources(page_id, &fields, &course);

        let record = fields.into_record(course.icon.value, course.name.value);
        info!(
            page_id,
            course = %record.course_name,
            title = %record.title,
            task_type = %record.task_type,
            status = %record.status,
            "task received"
        );

        let Some(payload) = mapper::build_event(&record, page_id, &self.calendar_cfg) else {
            info!(page_id, "task has no deadline, skipping calendar event");
            return Ok(Outcome::SkippedNoDeadline);
        };

        match locate::locate_event(&self.pool, self.calendar.as_ref(), page_id).await {
            Some(existing) => {
                let updated = self.calendar.update_event(&existing.id, &payload).await?;
                self.record_link(page_id, &updated.id).await;
                info!(
                    page_id,
                    event_id = %updated.id,
                    link = updated.html_link.as_deref().unwrap_or(""),
                    "calendar event updated"
                );
                Ok(Outcome::Updated {
                    event_id: updated.id,
                })
            }
            None => {
                let created = self.calendar.insert_event(&payload).await?;
                self.record_link(page_id, &created.id).await;
                info!(
                    page_id,
                    event_id = %created.id,
                    link = created.html_link.as_deref().unwrap_or(""),
                    "calendar event created"
                );
                Ok(Outcome::Created {
                    event_id: created.id,
                })
            }
        }
    }

    /// Remove the calendar event for a deleted page, if one exists.
    #[instrument(skip_all)]
    pub async fn delete(&self, page_id: &str) -> Result<Outcome> {
        let _guard = self.locks.acquire(page_id).await;

        match locate::locate_event(&self.pool, self.calendar.as_ref(), page_id).await {
            Some(event) => {
                self.calendar.delete_event(&event.id).await?;
                if let Err(err) = db::delete_event_link(&self.pool, page_id).await {
                    warn!(page_id, error = %err, "failed to drop event link");
                }
                info!(page_id, event_id = %event.id, "calendar event deleted");
                Ok(Outcome::Deleted { event_id: event.id })
            }
            None => {
                debug!(page_id, "no calendar event to delete");
                Ok(Outcome::NothingToDelete)
            }
        }
    }

    /// The link table is an optimization over the marker search, so a write
    /// failure downgrades to a warning rather than failing the operation
    /// whose calendar write already succeeded.
    async fn record_link(&self, page_id: &str, event_id: &str) {
        if let Err(err) = db::upsert_event_link(&self.pool, page_id, event_id).await {
            warn!(page_id, event_id, error = %err, "failed to persist event link");
        }
    }
}

/// Surface every field that did not come straight out of the source record.
fn log_field_sources(page_id: &str, fields: &TaskFields, course: &CourseInfo) {
    let mut sources = fields.sources();
    sources.push(("course_icon", &course.icon.source));
    sources.push(("course_name", &course.name.source));

    for (field, source) in sources {
        match source {
            FieldSource::Extracted => {}
            FieldSource::Defaulted(reason) => {
                debug!(page_id, field, reason, "field defaulted");
            }
            FieldSource::Failed(reason) => {
                warn!(page_id, field, reason = %reason, "field lookup failed, default substituted");
            }
        }
    }
}
