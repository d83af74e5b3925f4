use serde::{Deserialize, Serialize};

/// Change notification kinds delivered by the Notion webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Created,
    Updated,
    PropertiesUpdated,
    Deleted,
}

impl NotificationKind {
    /// Parse the webhook `type` field. Unknown kinds return `None` and are
    /// ignored by the handler.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "page.created" => Some(NotificationKind::Created),
            "page.updated" => Some(NotificationKind::Updated),
            "page.properties_updated" => Some(NotificationKind::PropertiesUpdated),
            "page.deleted" => Some(NotificationKind::Deleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Created => "page.created",
            NotificationKind::Updated => "page.updated",
            NotificationKind::PropertiesUpdated => "page.properties_updated",
            NotificationKind::Deleted => "page.deleted",
        }
    }

    pub fn is_upsert(&self) -> bool {
        !matches!(self, NotificationKind::Deleted)
    }
}

/// Deadline span exactly as the source stores it. Only `start` is ever
/// written to the calendar; `end` is carried for completeness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub start: String,
    pub end: Option<String>,
}

/// Where a field's value came from. `Defaulted` covers absent or malformed
/// source data; `Failed` covers a lookup that errored and was substituted
/// with the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    Extracted,
    Defaulted(&'static str),
    Failed(String),
}

/// A field value tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: FieldSource,
}

impl<T> Sourced<T> {
    pub fn extracted(value: T) -> Self {
        Self {
            value,
            source: FieldSource::Extracted,
        }
    }

    pub fn defaulted(value: T, reason: &'static str) -> Self {
        Self {
            value,
            source: FieldSource::Defaulted(reason),
        }
    }

    pub fn failed(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            source: FieldSource::Failed(reason.into()),
        }
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self.source, FieldSource::Extracted)
    }
}

/// Ephemeral projection of one source task at read time. Assembled fresh on
/// every notification, consumed by the event mapper, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub title: String,
    pub task_type: String,
    pub status: String,
    pub deadline: Option<Deadline>,
    pub notes: String,
    pub course_icon: String,
    pub course_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_notification_kinds() {
        assert_eq!(
            NotificationKind::parse("page.created"),
            Some(NotificationKind::Created)
        );
        assert_eq!(
            NotificationKind::parse("page.properties_updated"),
            Some(NotificationKind::PropertiesUpdated)
        );
        assert_eq!(
            NotificationKind::parse("page.deleted"),
            Some(NotificationKind::Deleted)
        );
        assert_eq!(NotificationKind::parse("database.created"), None);
        assert_eq!(NotificationKind::parse(""), None);
    }

    #[test]
    fn upsert_covers_everything_but_delete() {
        assert!(NotificationKind::Created.is_upsert());
        assert!(NotificationKind::Updated.is_upsert());
        assert!(NotificationKind::PropertiesUpdated.is_upsert());
        assert!(!NotificationKind::Deleted.is_upsert());
    }
}
