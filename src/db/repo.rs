use super::model::EventLink;
use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    // Pass through non-sqlite schemes
    if !url.starts_with("sqlite:") {
        return url.to_string();
    }

    // In-memory URLs like sqlite::memory: or sqlite::memory:?cache=shared
    if url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    // Strip prefix and optional //
    let rest = &url["sqlite:".len()..];
    let (_had_slashes, path_with_query) = if let Some(r) = rest.strip_prefix("//") {
        (true, r)
    } else {
        (false, rest)
    };

    // Separate query string if any
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        // nothing to normalize
        return url.to_string();
    }

    // Expand leading ~/ to HOME
    let expanded_path = if let Some(rest) = path_part.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            format!("{}/{}", home.trim_end_matches('/'), rest)
        } else {
            path_part.to_string()
        }
    } else {
        path_part.to_string()
    };

    // Ensure parent directory exists if any
    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    // Rebuild URL, prefer sqlite:// form
    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Look up the calendar event previously linked to a page.
#[instrument(skip_all)]
pub async fn find_event_link(pool: &Pool, notion_page_id: &str) -> Result<Option<EventLink>> {
    let row = sqlx::query(
        "SELECT notion_page_id, gcal_event_id, created_at, updated_at \
         FROM event_links WHERE notion_page_id = ?",
    )
    .bind(notion_page_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| EventLink {
        notion_page_id: row.get("notion_page_id"),
        gcal_event_id: row.get("gcal_event_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

/// Record (or replace) the calendar event linked to a page.
#[instrument(skip_all)]
pub async fn upsert_event_link(
    pool: &Pool,
    notion_page_id: &str,
    gcal_event_id: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO event_links (notion_page_id, gcal_event_id) VALUES (?, ?) \
         ON CONFLICT(notion_page_id) DO UPDATE SET \
             gcal_event_id = excluded.gcal_event_id, \
             updated_at = CURRENT_TIMESTAMP",
    )
    .bind(notion_page_id)
    .bind(gcal_event_id)
    .execute(pool)
    .await
    .context("failed to persist event link")?;
    Ok(())
}

/// Drop the link for a page. Deleting a link that does not exist is a no-op.
#[instrument(skip_all)]
pub async fn delete_event_link(pool: &Pool, notion_page_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM event_links WHERE notion_page_id = ?")
        .bind(notion_page_id)
        .execute(pool)
        .await?;
    Ok(())
}
