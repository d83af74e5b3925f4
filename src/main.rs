use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use notion_gcal_sync::config;
use notion_gcal_sync::db;
use notion_gcal_sync::gcal::GcalClient;
use notion_gcal_sync::handlers::{self, AppState};
use notion_gcal_sync::notion::NotionClient;
use notion_gcal_sync::reconcile::Reconciler;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/sync.db?mode=rwc", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let notion = Arc::new(NotionClient::new(
        cfg.notion.token.clone(),
        cfg.notion.version.clone(),
    ));
    let calendar = Arc::new(GcalClient::new(&cfg.calendar));
    let reconciler = Arc::new(Reconciler::new(
        pool,
        notion,
        calendar,
        cfg.calendar.clone(),
    ));

    let app = handlers::router(AppState { reconciler });

    let listener = tokio::net::TcpListener::bind(&cfg.app.bind_addr).await?;
    info!(addr = %cfg.app.bind_addr, "webhook server started");
    axum::serve(listener, app).await?;

    Ok(())
}
