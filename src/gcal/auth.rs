//! OAuth access-token acquisition for the Calendar API.
//!
//! Google access tokens are short-lived; the long-lived refresh token from
//! the config is exchanged on demand and the result cached until shortly
//! before its nominal expiry.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::OAuth;

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds subtracted from the advertised lifetime so a token is never used
/// right at its expiry edge.
const EXPIRY_LEEWAY_SECONDS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges the configured refresh token for access tokens.
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
    oauth: OAuth,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, oauth: OAuth) -> Self {
        Self {
            http,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            oauth,
            cached: RwLock::new(None),
        }
    }

    /// Point the manager at a different token endpoint. Test hook.
    pub fn with_token_url(mut self, url: &str) -> Self {
        self.token_url = url.to_string();
        self
    }

    /// A currently-valid access token, refreshed through the token endpoint
    /// when the cached one is missing or stale. Concurrent refreshes are
    /// harmless, the last writer wins.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if Utc::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<String> {
        debug!("refreshing calendar access token");
        let res = self
            .build_refresh_request()
            .send()
            .await
            .context("send token refresh request")?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            bail!("token refresh error {}: {}", status, body);
        }
        let token: TokenResponse = res.json().await.context("decode token refresh response")?;

        let expires_at = expiry(Utc::now(), token.expires_in);
        *self.cached.write().await = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    pub(crate) fn build_refresh_request(&self) -> reqwest::RequestBuilder {
        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
            ("refresh_token", self.oauth.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        self.http.post(&self.token_url).form(&params)
    }
}

fn expiry(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    now + Duration::seconds((expires_in - EXPIRY_LEEWAY_SECONDS).max(0))
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}
