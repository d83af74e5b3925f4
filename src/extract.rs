//! Field extraction: project a fetched Notion page into task fields.
//!
//! Extraction is a pure transform and never fails — absent or malformed
//! properties degrade to literal defaults so partial source data cannot
//! abort the pipeline. Every field carries its provenance for logging.

use crate::model::{Deadline, FieldSource, Sourced, TaskRecord};
use crate::notion::model::{Page, Property, RichText};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_TASK_TYPE: &str = "Unknown Type";
pub const DEFAULT_STATUS: &str = "Unknown Status";

// Property display names fixed by the source database schema. The title is
// located by kind, not by name.
const TYPE_PROPERTY: &str = "Type";
const PROGRESS_PROPERTY: &str = "Progress";
const DEADLINE_PROPERTY: &str = "Deadline";
const NOTES_PROPERTY: &str = "notes";
const COURSE_PROPERTY: &str = "Course";

/// Task fields extracted from one page, before course resolution.
#[derive(Debug, Clone)]
pub struct TaskFields {
    pub title: Sourced<String>,
    pub task_type: Sourced<String>,
    pub status: Sourced<String>,
    pub deadline: Sourced<Option<Deadline>>,
    pub notes: Sourced<String>,
    pub course: Sourced<Option<String>>,
}

impl TaskFields {
    /// Field name / provenance pairs, for structured logging of anything
    /// that did not come straight out of the source record.
    pub fn sources(&self) -> Vec<(&'static str, &FieldSource)> {
        vec![
            ("title", &self.title.source),
            ("task_type", &self.task_type.source),
            ("status", &self.status.source),
            ("deadline", &self.deadline.source),
            ("notes", &self.notes.source),
            ("course", &self.course.source),
        ]
    }

    /// Combine with resolved course display data into the record handed to
    /// the event mapper.
    pub fn into_record(self, course_icon: String, course_name: String) -> TaskRecord {
        TaskRecord {
            title: self.title.value,
            task_type: self.task_type.value,
            status: self.status.value,
            deadline: self.deadline.value,
            notes: self.notes.value,
            course_icon,
            course_name,
        }
    }
}

/// Extract all task fields from a page. Never errors.
pub fn extract_task(page: &Page) -> TaskFields {
    let title = match page_title(page) {
        Some(t) => Sourced::extracted(t),
        None => Sourced::defaulted(DEFAULT_TITLE.to_string(), "no title property"),
    };

    let task_type = match select_name(page, TYPE_PROPERTY) {
        Some(t) => Sourced::extracted(t),
        None => Sourced::defaulted(DEFAULT_TASK_TYPE.to_string(), "no Type select"),
    };

    let status = match status_name(page, PROGRESS_PROPERTY) {
        Some(s) => Sourced::extracted(s),
        None => Sourced::defaulted(DEFAULT_STATUS.to_string(), "no Progress status"),
    };

    let deadline = match deadline(page) {
        Some(d) => Sourced::extracted(Some(d)),
        None => Sourced::defaulted(None, "no Deadline date"),
    };

    let notes = match notes_text(page) {
        Some(n) => Sourced::extracted(n),
        None => Sourced::defaulted(String::new(), "no notes rich_text"),
    };

    let course = match course_relation_id(page) {
        Some(id) => Sourced::extracted(Some(id)),
        None => Sourced::defaulted(None, "no Course relation"),
    };

    TaskFields {
        title,
        task_type,
        status,
        deadline,
        notes,
        course,
    }
}

/// The page title: plain-text runs of the first property of kind `title`,
/// concatenated in order. `None` when the page has no title property at
/// all. Shared with the course resolver, which applies its own default.
pub fn page_title(page: &Page) -> Option<String> {
    page.properties.values().find_map(|prop| match prop {
        Property::Title { title } => Some(plain_text(title)),
        _ => None,
    })
}

fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

fn select_name(page: &Page, name: &str) -> Option<String> {
    match page.properties.get(name) {
        Some(Property::Select { select }) => select
            .as_ref()
            .map(|s| s.name.clone())
            .filter(|n| !n.is_empty()),
        _ => None,
    }
}

fn status_name(page: &Page, name: &str) -> Option<String> {
    match page.properties.get(name) {
        Some(Property::Status { status }) => status
            .as_ref()
            .map(|s| s.name.clone())
            .filter(|n| !n.is_empty()),
        _ => None,
    }
}

fn deadline(page: &Page) -> Option<Deadline> {
    match page.properties.get(DEADLINE_PROPERTY) {
        Some(Property::Date { date }) => date.as_ref().map(|d| Deadline {
            start: d.start.clone(),
            end: d.end.clone(),
        }),
        _ => None,
    }
}

fn notes_text(page: &Page) -> Option<String> {
    match page.properties.get(NOTES_PROPERTY) {
        Some(Property::RichText { rich_text }) => Some(plain_text(rich_text)),
        _ => None,
    }
}

/// First related page ID of the `Course` relation, if any.
pub fn course_relation_id(page: &Page) -> Option<String> {
    match page.properties.get(COURSE_PROPERTY) {
        Some(Property::Relation { relation }) => relation
            .first()
            .map(|r| r.id.clone())
            .filter(|id| !id.is_empty()),
        _ => None,
    }
}
