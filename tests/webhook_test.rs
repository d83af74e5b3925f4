//! Webhook endpoint contract: every inbound notification is answered with
//! HTTP 200 `{"status":"success"}`, whatever happens inside.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tower::ServiceExt;

use notion_gcal_sync::config;
use notion_gcal_sync::db;
use notion_gcal_sync::gcal::model::{Event, EventPayload};
use notion_gcal_sync::gcal::CalendarService;
use notion_gcal_sync::handlers::{self, AppState};
use notion_gcal_sync::notion::model::Page;
use notion_gcal_sync::notion::NotionService;
use notion_gcal_sync::reconcile::Reconciler;

#[derive(Clone, Default)]
struct StubNotion {
    pages: Arc<Mutex<HashMap<String, Value>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl NotionService for StubNotion {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page> {
        self.calls.lock().await.push(page_id.to_string());
        let pages = self.pages.lock().await;
        match pages.get(page_id) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Err(anyhow!("notion error 404: page {page_id} not found")),
        }
    }
}

#[derive(Clone, Default)]
struct StubCalendar {
    events: Arc<Mutex<HashMap<String, Event>>>,
}

#[async_trait::async_trait]
impl CalendarService for StubCalendar {
    async fn search_events(&self, query: &str) -> Result<Vec<Event>> {
        Ok(self
            .events
            .lock()
            .await
            .values()
            .filter(|e| e.description.contains(query))
            .cloned()
            .collect())
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>> {
        Ok(self.events.lock().await.get(event_id).cloned())
    }

    async fn insert_event(&self, payload: &EventPayload) -> Result<Event> {
        let mut events = self.events.lock().await;
        let event = Event {
            id: format!("evt-{}", events.len() + 1),
            summary: payload.summary.clone(),
            description: payload.description.clone(),
            color_id: payload.color_id.clone(),
            ..Event::default()
        };
        events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn update_event(&self, event_id: &str, payload: &EventPayload) -> Result<Event> {
        let mut events = self.events.lock().await;
        let event = Event {
            id: event_id.to_string(),
            summary: payload.summary.clone(),
            description: payload.description.clone(),
            color_id: payload.color_id.clone(),
            ..Event::default()
        };
        events.insert(event_id.to_string(), event.clone());
        Ok(event)
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        self.events.lock().await.remove(event_id);
        Ok(())
    }
}

async fn setup() -> (SqlitePool, StubNotion, StubCalendar, Router) {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let notion = StubNotion::default();
    let calendar = StubCalendar::default();
    let cfg: config::Calendar = serde_yaml::from_str(
        r#"
calendar_id: "primary"
timezone: "America/Santiago"
oauth:
  client_id: "cid"
  client_secret: "sec"
  refresh_token: "ref"
"#,
    )
    .unwrap();

    let reconciler = Arc::new(Reconciler::new(
        pool.clone(),
        Arc::new(notion.clone()),
        Arc::new(calendar.clone()),
        cfg,
    ));
    let app = handlers::router(AppState { reconciler });
    (pool, notion, calendar, app)
}

fn webhook_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/notion-webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn assert_success_response(response: axum::response::Response) {
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, json!({ "status": "success" }));
}

#[tokio::test]
async fn upsert_notification_creates_a_calendar_event() {
    let (pool, notion, calendar, app) = setup().await;
    notion.pages.lock().await.insert(
        "page-1".into(),
        json!({
            "id": "page-1",
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Essay 1" }] },
                "Deadline": { "type": "date", "date": { "start": "2024-03-10" } }
            }
        }),
    );

    let body = json!({ "type": "page.created", "entity": { "id": "page-1" } });
    let response = app
        .oneshot(webhook_request(body.to_string()))
        .await
        .unwrap();
    assert_success_response(response).await;

    assert_eq!(calendar.events.lock().await.len(), 1);
    assert!(db::find_event_link(&pool, "page-1").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_notification_removes_the_event() {
    let (pool, _notion, calendar, app) = setup().await;
    calendar.events.lock().await.insert(
        "evt-1".into(),
        Event {
            id: "evt-1".into(),
            description: "notes\n\nnotion-id:page-1".into(),
            ..Event::default()
        },
    );
    db::upsert_event_link(&pool, "page-1", "evt-1").await.unwrap();

    let body = json!({
        "type": "page.deleted",
        "entity": { "id": "page-1" },
        "data": { "parent": { "id": "db-1" } }
    });
    let response = app
        .oneshot(webhook_request(body.to_string()))
        .await
        .unwrap();
    assert_success_response(response).await;

    assert!(calendar.events.lock().await.is_empty());
    assert!(db::find_event_link(&pool, "page-1").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_notification_type_is_ignored() {
    let (_pool, notion, calendar, app) = setup().await;

    let body = json!({ "type": "database.updated", "entity": { "id": "db-1" } });
    let response = app
        .oneshot(webhook_request(body.to_string()))
        .await
        .unwrap();
    assert_success_response(response).await;

    assert!(notion.calls.lock().await.is_empty());
    assert!(calendar.events.lock().await.is_empty());
}

#[tokio::test]
async fn malformed_payload_still_answers_success() {
    let (_pool, notion, _calendar, app) = setup().await;

    let response = app
        .oneshot(webhook_request("this is not json {{"))
        .await
        .unwrap();
    assert_success_response(response).await;
    assert!(notion.calls.lock().await.is_empty());
}

#[tokio::test]
async fn missing_entity_id_is_dropped() {
    let (_pool, notion, _calendar, app) = setup().await;

    let body = json!({ "type": "page.updated" });
    let response = app
        .oneshot(webhook_request(body.to_string()))
        .await
        .unwrap();
    assert_success_response(response).await;
    assert!(notion.calls.lock().await.is_empty());
}

#[tokio::test]
async fn backend_failure_never_reaches_the_sender() {
    let (_pool, notion, calendar, app) = setup().await;
    // No page registered, so the reconciler's fetch fails internally.

    let body = json!({ "type": "page.properties_updated", "entity": { "id": "page-x" } });
    let response = app
        .oneshot(webhook_request(body.to_string()))
        .await
        .unwrap();
    assert_success_response(response).await;

    assert_eq!(*notion.calls.lock().await, vec!["page-x".to_string()]);
    assert!(calendar.events.lock().await.is_empty());
}
