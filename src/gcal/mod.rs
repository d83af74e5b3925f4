use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config;
use crate::gcal::model::{Event, EventList, EventPayload};

pub mod auth;
pub mod model;

pub use auth::TokenManager;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";

/// Sink-system contract consumed by the locator and reconciler.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Free-text search over the calendar with recurring events expanded to
    /// single instances.
    async fn search_events(&self, query: &str) -> Result<Vec<Event>>;
    /// Fetch one event by ID. `Ok(None)` when the calendar no longer has a
    /// live event under that ID.
    async fn get_event(&self, event_id: &str) -> Result<Option<Event>>;
    async fn insert_event(&self, payload: &EventPayload) -> Result<Event>;
    async fn update_event(&self, event_id: &str, payload: &EventPayload) -> Result<Event>;
    /// Delete an event. An event that is already gone counts as deleted.
    async fn delete_event(&self, event_id: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct GcalClient {
    http: Client,
    base_url: Url,
    calendar_id: String,
    tokens: Arc<TokenManager>,
}

impl fmt::Debug for GcalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcalClient")
            .field("base_url", &self.base_url)
            .field("calendar_id", &self.calendar_id)
            .finish_non_exhaustive()
    }
}

impl GcalClient {
    pub fn new(cfg: &config::Calendar) -> Self {
        let base_url = Url::parse(CALENDAR_API_BASE).expect("valid default Calendar URL");
        Self::with_base_url(cfg, base_url)
    }

    pub fn with_base_url(cfg: &config::Calendar, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("notion-gcal-sync/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        let tokens = Arc::new(TokenManager::new(http.clone(), cfg.oauth.clone()));
        Self {
            http,
            base_url,
            calendar_id: cfg.calendar_id.clone(),
            tokens,
        }
    }

    fn events_url(&self) -> Result<Url> {
        self.base_url
            .join(&format!(
                "calendars/{}/events",
                urlencoding::encode(&self.calendar_id)
            ))
            .context("invalid Calendar base URL")
    }

    fn event_url(&self, event_id: &str) -> Result<Url> {
        self.base_url
            .join(&format!(
                "calendars/{}/events/{}",
                urlencoding::encode(&self.calendar_id),
                urlencoding::encode(event_id)
            ))
            .context("invalid Calendar base URL")
    }

    pub(crate) fn build_search_request(&self, query: &str) -> Result<reqwest::Request> {
        self.http
            .get(self.events_url()?)
            .query(&[("q", query), ("singleEvents", "true")])
            .build()
            .context("failed to build Calendar request")
    }

    pub(crate) fn build_get_request(&self, event_id: &str) -> Result<reqwest::Request> {
        self.http
            .get(self.event_url(event_id)?)
            .build()
            .context("failed to build Calendar request")
    }

    pub(crate) fn build_insert_request(&self, payload: &EventPayload) -> Result<reqwest::Request> {
        self.http
            .post(self.events_url()?)
            .json(payload)
            .build()
            .context("failed to build Calendar request")
    }

    pub(crate) fn build_update_request(
        &self,
        event_id: &str,
        payload: &EventPayload,
    ) -> Result<reqwest::Request> {
        self.http
            .put(self.event_url(event_id)?)
            .json(payload)
            .build()
            .context("failed to build Calendar request")
    }

    pub(crate) fn build_delete_request(&self, event_id: &str) -> Result<reqwest::Request> {
        self.http
            .delete(self.event_url(event_id)?)
            .build()
            .context("failed to build Calendar request")
    }

    pub(crate) fn build_list_upcoming_request(&self, max_results: u32) -> Result<reqwest::Request> {
        let time_min = Utc::now().to_rfc3339();
        self.http
            .get(self.events_url()?)
            .query(&[
                ("maxResults", max_results.to_string().as_str()),
                ("orderBy", "startTime"),
                ("singleEvents", "true"),
                ("timeMin", time_min.as_str()),
            ])
            .build()
            .context("failed to build Calendar request")
    }

    /// Upcoming events ordered by start time. Used by the listing tool, not
    /// by the reconciler.
    pub async fn list_upcoming(&self, max_results: u32) -> Result<Vec<Event>> {
        let request = self.build_list_upcoming_request(max_results)?;
        let res = ensure_success(self.execute(request).await?).await?;
        let list: EventList = res.json().await.context("invalid event list JSON")?;
        Ok(list.items)
    }

    async fn execute(&self, mut request: reqwest::Request) -> Result<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        let header =
            HeaderValue::from_str(&format!("Bearer {token}")).context("invalid token header")?;
        request.headers_mut().insert(AUTHORIZATION, header);
        self.http
            .execute(request)
            .await
            .context("failed to reach Calendar API")
    }
}

async fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response> {
    if res.status() == StatusCode::TOO_MANY_REQUESTS {
        let body = res.text().await.unwrap_or_default();
        warn!("rate limited by Calendar API: {}", body);
        return Err(anyhow!("received 429 from Calendar API: {}", body));
    }
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(anyhow!("calendar error {}: {}", status, body));
    }
    Ok(res)
}

#[async_trait]
impl CalendarService for GcalClient {
    async fn search_events(&self, query: &str) -> Result<Vec<Event>> {
        let request = self.build_search_request(query)?;
        debug!(url = %request.url(), "searching calendar events");
        let res = ensure_success(self.execute(request).await?).await?;
        let list: EventList = res.json().await.context("invalid event list JSON")?;
        Ok(list.items)
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>> {
        let request = self.build_get_request(event_id)?;
        let res = self.execute(request).await?;
        if res.status() == StatusCode::NOT_FOUND || res.status() == StatusCode::GONE {
            return Ok(None);
        }
        let event = ensure_success(res)
            .await?
            .json::<Event>()
            .await
            .context("invalid event JSON")?;
        if event.is_cancelled() {
            return Ok(None);
        }
        Ok(Some(event))
    }

    async fn insert_event(&self, payload: &EventPayload) -> Result<Event> {
        let request = self.build_insert_request(payload)?;
        debug!(summary = %payload.summary, "inserting calendar event");
        let res = ensure_success(self.execute(request).await?).await?;
        res.json::<Event>().await.context("invalid event JSON")
    }

    async fn update_event(&self, event_id: &str, payload: &EventPayload) -> Result<Event> {
        let request = self.build_update_request(event_id, payload)?;
        debug!(event_id, summary = %payload.summary, "updating calendar event");
        let res = ensure_success(self.execute(request).await?).await?;
        res.json::<Event>().await.context("invalid event JSON")
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        let request = self.build_delete_request(event_id)?;
        let res = self.execute(request).await?;
        // Deleting an event that was already removed is not a failure.
        if res.status() == StatusCode::NOT_FOUND || res.status() == StatusCode::GONE {
            debug!(event_id, "event already gone");
            return Ok(());
        }
        ensure_success(res).await?;
        Ok(())
    }
}
