//! Course resolution: turn a course relation ID into display data.
//!
//! Icon and name come from two independent page lookups so that one
//! failing cannot take the other down with it. Lookup failures substitute
//! defaults and never propagate.

use tracing::warn;

use crate::extract::page_title;
use crate::model::Sourced;
use crate::notion::NotionService;

pub const DEFAULT_COURSE_ICON: &str = "📝";
pub const DEFAULT_COURSE_NAME: &str = "Unknown Course";

/// Display data for the course a task belongs to.
#[derive(Debug, Clone)]
pub struct CourseInfo {
    pub icon: Sourced<String>,
    pub name: Sourced<String>,
}

impl CourseInfo {
    fn defaults(reason: &'static str) -> Self {
        Self {
            icon: Sourced::defaulted(DEFAULT_COURSE_ICON.to_string(), reason),
            name: Sourced::defaulted(DEFAULT_COURSE_NAME.to_string(), reason),
        }
    }
}

/// Resolve icon and name for `course_id`. With no course ID, returns the
/// defaults without touching the source system.
pub async fn resolve_course(notion: &dyn NotionService, course_id: Option<&str>) -> CourseInfo {
    let Some(course_id) = course_id else {
        return CourseInfo::defaults("no course relation");
    };

    CourseInfo {
        icon: resolve_icon(notion, course_id).await,
        name: resolve_name(notion, course_id).await,
    }
}

/// The course page's icon. Emoji icons resolve to the glyph, uploaded and
/// external icons pass their URL through, anything else falls back to the
/// placeholder.
async fn resolve_icon(notion: &dyn NotionService, course_id: &str) -> Sourced<String> {
    match notion.retrieve_page(course_id).await {
        Ok(page) => match page.icon.as_ref().and_then(|icon| icon.display_value()) {
            Some(value) => Sourced::extracted(value.to_string()),
            None => Sourced::defaulted(DEFAULT_COURSE_ICON.to_string(), "course page has no icon"),
        },
        Err(err) => {
            warn!(course_id, error = %err, "course icon lookup failed");
            Sourced::failed(DEFAULT_COURSE_ICON.to_string(), err.to_string())
        }
    }
}

/// The course page's title, using the same title rule as task extraction.
async fn resolve_name(notion: &dyn NotionService, course_id: &str) -> Sourced<String> {
    match notion.retrieve_page(course_id).await {
        Ok(page) => match page_title(&page) {
            Some(name) => Sourced::extracted(name),
            None => Sourced::defaulted("Untitled".to_string(), "course page has no title"),
        },
        Err(err) => {
            warn!(course_id, error = %err, "course name lookup failed");
            Sourced::failed(DEFAULT_COURSE_NAME.to_string(), err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    use super::*;
    use crate::model::FieldSource;
    use crate::notion::model::Page;

    struct StubNotion {
        responses: Mutex<VecDeque<Result<Page>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubNotion {
        fn new(responses: Vec<Result<Page>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl NotionService for StubNotion {
        async fn retrieve_page(&self, page_id: &str) -> Result<Page> {
            self.calls.lock().await.push(page_id.to_string());
            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("no response queued")))
        }
    }

    fn course_page(value: serde_json::Value) -> Page {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn no_course_id_skips_lookups() {
        let notion = StubNotion::new(vec![]);
        let info = resolve_course(&notion, None).await;
        assert_eq!(info.icon.value, DEFAULT_COURSE_ICON);
        assert_eq!(info.name.value, DEFAULT_COURSE_NAME);
        assert!(notion.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn resolves_emoji_icon_and_title() {
        let page = course_page(json!({
            "id": "course-1",
            "icon": { "type": "emoji", "emoji": "📚" },
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Algorithms" }] }
            }
        }));
        let notion = StubNotion::new(vec![Ok(page.clone()), Ok(page)]);

        let info = resolve_course(&notion, Some("course-1")).await;
        assert_eq!(info.icon.value, "📚");
        assert_eq!(info.name.value, "Algorithms");
        assert!(info.icon.is_extracted());
        assert!(info.name.is_extracted());
        assert_eq!(*notion.calls.lock().await, vec!["course-1", "course-1"]);
    }

    #[tokio::test]
    async fn external_icon_url_passes_through() {
        let page = course_page(json!({
            "id": "course-1",
            "icon": { "type": "external", "external": { "url": "https://example.com/icon.png" } },
            "properties": {}
        }));
        let notion = StubNotion::new(vec![Ok(page.clone()), Ok(page)]);

        let info = resolve_course(&notion, Some("course-1")).await;
        assert_eq!(info.icon.value, "https://example.com/icon.png");
        assert!(info.icon.is_extracted());
    }

    #[tokio::test]
    async fn course_page_without_icon_or_title_falls_back() {
        let page = course_page(json!({ "id": "course-1", "properties": {} }));
        let notion = StubNotion::new(vec![Ok(page.clone()), Ok(page)]);

        let info = resolve_course(&notion, Some("course-1")).await;
        assert_eq!(info.icon.value, DEFAULT_COURSE_ICON);
        assert_eq!(info.name.value, "Untitled");
        assert!(matches!(info.icon.source, FieldSource::Defaulted(_)));
        assert!(matches!(info.name.source, FieldSource::Defaulted(_)));
    }

    #[tokio::test]
    async fn lookup_failures_substitute_defaults() {
        let notion = StubNotion::new(vec![Err(anyhow!("boom")), Err(anyhow!("boom"))]);

        let info = resolve_course(&notion, Some("course-1")).await;
        assert_eq!(info.icon.value, DEFAULT_COURSE_ICON);
        assert_eq!(info.name.value, DEFAULT_COURSE_NAME);
        assert!(matches!(info.icon.source, FieldSource::Failed(_)));
        assert!(matches!(info.name.source, FieldSource::Failed(_)));
    }

    #[tokio::test]
    async fn icon_survives_a_name_lookup_failure() {
        let page = course_page(json!({
            "id": "course-1",
            "icon": { "type": "emoji", "emoji": "📚" },
            "properties": {}
        }));
        let notion = StubNotion::new(vec![Ok(page), Err(anyhow!("rate limited"))]);

        let info = resolve_course(&notion, Some("course-1")).await;
        assert_eq!(info.icon.value, "📚");
        assert!(info.icon.is_extracted());
        assert_eq!(info.name.value, DEFAULT_COURSE_NAME);
        assert!(matches!(info.name.source, FieldSource::Failed(_)));
    }
}
