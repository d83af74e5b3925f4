//! Inbound webhook surface.
//!
//! A single endpoint receives page notifications. The response is always
//! HTTP 200 with `{"status": "success"}`, whatever happened internally:
//! surfacing an error would only trigger the sender's retry storm, so
//! failures are logged server side and the notification is dropped.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::model::NotificationKind;
use crate::reconcile::Reconciler;

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/notion-webhook", post(notion_webhook))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct WebhookNotification {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    entity: Entity,
    #[serde(default)]
    data: NotificationData,
}

#[derive(Debug, Default, Deserialize)]
struct Entity {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationData {
    #[serde(default)]
    parent: Option<Parent>,
}

#[derive(Debug, Default, Deserialize)]
struct Parent {
    #[serde(default)]
    id: String,
}

async fn notion_webhook(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    debug!(bytes = body.len(), "received notion webhook");

    // Parsed by hand from raw bytes so malformed payloads reach the same
    // success response as everything else.
    let notification: WebhookNotification = match serde_json::from_slice(&body) {
        Ok(notification) => notification,
        Err(err) => {
            warn!(error = %err, "unparseable webhook payload");
            return success();
        }
    };

    let Some(kind) = NotificationKind::parse(&notification.kind) else {
        debug!(kind = %notification.kind, "ignoring unhandled notification type");
        return success();
    };

    let page_id = notification.entity.id;
    if page_id.is_empty() {
        warn!(kind = kind.as_str(), "notification carries no entity id");
        return success();
    }

    if kind.is_upsert() {
        if let Err(err) = state.reconciler.upsert(&page_id).await {
            error!(page_id, error = %err, "failed to process page notification");
        }
    } else {
        if let Some(parent) = notification.data.parent.filter(|p| !p.id.is_empty()) {
            debug!(page_id, parent_id = %parent.id, "delete notification from parent database");
        }
        if let Err(err) = state.reconciler.delete(&page_id).await {
            error!(page_id, error = %err, "failed to process page deletion");
        }
    }

    success()
}

fn success() -> Json<Value> {
    Json(json!({ "status": "success" }))
}
