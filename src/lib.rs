//! Webhook-driven sync of Notion task pages into Google Calendar events.
//!
//! Notifications arrive on an HTTP endpoint, the referenced page is
//! re-fetched from Notion, projected into an all-day calendar event and
//! reconciled against the calendar through a persisted page→event link
//! table with a marker-search fallback.

pub mod config;
pub mod course;
pub mod db;
pub mod extract;
pub mod gcal;
pub mod handlers;
pub mod locate;
pub mod mapper;
pub mod model;
pub mod notion;
pub mod reconcile;
