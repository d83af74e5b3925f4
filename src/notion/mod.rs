use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use tracing::{debug, warn};

use crate::notion::model::Page;

pub mod model;

const NOTION_API_BASE: &str = "https://api.notion.com/";

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Source-system contract consumed by the reconciler: fetch the current
/// state of one record by ID. Errors on not-found and transient failures
/// alike; callers decide whether to default or drop.
#[async_trait]
pub trait NotionService: Send + Sync {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page>;
}

impl NotionClient {
    pub fn new(token: String, version: String) -> Self {
        let base_url = Url::parse(NOTION_API_BASE).expect("valid default Notion URL");
        Self::with_base_url(token, version, base_url)
    }

    pub fn with_base_url(token: String, version: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("notion-gcal-sync/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
            version,
        }
    }

    pub fn build_retrieve_request(&self, page_id: &str) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("v1/pages/{}", page_id))
            .context("invalid Notion base URL")?;
        self.http
            .get(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .build()
            .context("failed to build Notion request")
    }
}

#[async_trait]
impl NotionService for NotionClient {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page> {
        let request = self.build_retrieve_request(page_id)?;
        debug!(url = %request.url(), "retrieving Notion page");

        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Notion")?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            warn!("rate limited by Notion: {}", body);
            return Err(anyhow!("received 429 from Notion: {}", body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("notion error {}: {}", status, body));
        }

        res.json::<Page>()
            .await
            .context("invalid Notion page JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_retrieve_request_sets_headers_and_path() {
        let client = NotionClient::new("token".into(), "2022-06-28".into());
        let request = client.build_retrieve_request("abc123").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/v1/pages/abc123");
        let headers = request.headers();
        assert_eq!(
            headers
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "Bearer token"
        );
        assert_eq!(
            headers
                .get("Notion-Version")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "2022-06-28"
        );
    }

    #[test]
    fn with_base_url_overrides_endpoint() {
        let base = Url::parse("http://127.0.0.1:9999/").unwrap();
        let client = NotionClient::with_base_url("t".into(), "v".into(), base);
        let request = client.build_retrieve_request("p1").unwrap();
        assert_eq!(request.url().as_str(), "http://127.0.0.1:9999/v1/pages/p1");
    }

    #[test]
    fn debug_redacts_credentials() {
        let client = NotionClient::new("secret-token".into(), "2022-06-28".into());
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("secret-token"));
    }
}
