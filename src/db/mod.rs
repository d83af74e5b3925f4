//! Database module: entity models and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: typed rows returned by repositories.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! External modules should import from `notion_gcal_sync::db` — we re-export
//! the repository API and the row models for convenience.

pub mod model;
pub mod repo;

pub use model::EventLink;
pub use repo::*;
