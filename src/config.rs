//! Configuration loader and validator for the Notion→Calendar sync service.
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub notion: Notion,
    pub calendar: Calendar,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub bind_addr: String,
    pub data_dir: String,
}

/// Notion API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notion {
    pub token: String,
    pub version: String,
}

/// Google Calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Calendar {
    pub calendar_id: String,
    pub timezone: String,
    pub oauth: OAuth,
    /// Progress-status label → calendar color ID. Deployments disagree on
    /// some of these (notably the color for "3. Done"), so the table is
    /// data, not code.
    #[serde(default = "default_status_colors")]
    pub status_colors: HashMap<String, String>,
    #[serde(default = "default_color")]
    pub default_color: String,
}

/// OAuth client credentials plus a long-lived refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuth {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

static DEFAULT_STATUS_COLORS: Lazy<HashMap<String, String>> = Lazy::new(|| {
    [
        ("1. Not started", "11"),
        ("2. In progress", "6"),
        ("3. Done", "1"),
        ("4. Submitted", "10"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
});

fn default_status_colors() -> HashMap<String, String> {
    DEFAULT_STATUS_COLORS.clone()
}

fn default_color() -> String {
    "11".to_string()
}

impl Calendar {
    /// Color ID for a status label, falling back to `default_color` for
    /// labels outside the table.
    pub fn color_for(&self, status: &str) -> &str {
        self.status_colors
            .get(status)
            .map(String::as_str)
            .unwrap_or(&self.default_color)
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.bind_addr.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Invalid("app.bind_addr must be a host:port socket address"));
    }
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }

    if cfg.notion.token.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.token must be non-empty"));
    }
    if cfg.notion.version.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.version must be non-empty"));
    }

    if cfg.calendar.calendar_id.trim().is_empty() {
        return Err(ConfigError::Invalid("calendar.calendar_id must be non-empty"));
    }
    if cfg.calendar.timezone.parse::<chrono_tz::Tz>().is_err() {
        return Err(ConfigError::Invalid("calendar.timezone must be an IANA timezone name"));
    }
    if cfg.calendar.default_color.trim().is_empty() {
        return Err(ConfigError::Invalid("calendar.default_color must be non-empty"));
    }

    let oauth = &cfg.calendar.oauth;
    if oauth.client_id.trim().is_empty() {
        return Err(ConfigError::Invalid("calendar.oauth.client_id must be non-empty"));
    }
    if oauth.client_secret.trim().is_empty() {
        return Err(ConfigError::Invalid("calendar.oauth.client_secret must be non-empty"));
    }
    if oauth.refresh_token.trim().is_empty() {
        return Err(ConfigError::Invalid("calendar.oauth.refresh_token must be non-empty"));
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"app:
  bind_addr: "0.0.0.0:5001"
  data_dir: "./data"

notion:
  token: "YOUR_NOTION_INTEGRATION_TOKEN"
  version: "2022-06-28"

calendar:
  calendar_id: "YOUR_CALENDAR_ID@group.calendar.google.com"
  timezone: "America/Santiago"
  oauth:
    client_id: "YOUR_GOOGLE_OAUTH_CLIENT_ID"
    client_secret: "YOUR_GOOGLE_OAUTH_CLIENT_SECRET"
    refresh_token: "YOUR_GOOGLE_OAUTH_REFRESH_TOKEN"

  status_colors:
    "1. Not started": "11"
    "2. In progress": "6"
    "3. Done": "1"
    "4. Submitted": "10"
  default_color: "11"
"#
}
