//! Wire types for the Google Calendar v3 events API.

use serde::{Deserialize, Serialize};

/// All-day date span as sent on insert/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDate {
    pub date: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

/// Event body written to the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub summary: String,
    pub description: String,
    #[serde(rename = "colorId")]
    pub color_id: String,
    pub start: EventDate,
    pub end: EventDate,
}

/// Start/end of a fetched event. Either `date` (all-day) or `date_time` is
/// set, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventTime {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "dateTime", default)]
    pub date_time: Option<String>,
    #[serde(rename = "timeZone", default)]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// Whichever representation is present, for display.
    pub fn display(&self) -> &str {
        self.date
            .as_deref()
            .or(self.date_time.as_deref())
            .unwrap_or("")
    }
}

/// Event resource as returned by the API, reduced to the fields we read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "colorId", default)]
    pub color_id: String,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
    #[serde(rename = "htmlLink", default)]
    pub html_link: Option<String>,
    /// "confirmed", "tentative" or "cancelled".
    #[serde(default)]
    pub status: Option<String>,
}

impl Event {
    /// Soft-deleted events stay fetchable for a while but must be treated
    /// as gone.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

/// Response envelope of the events list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<Event>,
}
