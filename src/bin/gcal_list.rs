use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use notion_gcal_sync::config;
use notion_gcal_sync::gcal::GcalClient;

/// List upcoming events on the configured calendar.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Maximum number of events to print
    #[arg(long, default_value_t = 10)]
    max_results: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = config::load(Some(&args.config))?;
    let client = GcalClient::new(&cfg.calendar);

    let events = client.list_upcoming(args.max_results).await?;
    if events.is_empty() {
        println!("No upcoming events.");
        return Ok(());
    }

    for event in events {
        let start = event
            .start
            .as_ref()
            .map(|t| t.display().to_string())
            .unwrap_or_default();
        println!("{}  {}  {}", event.id, start, event.summary);
        if !event.description.is_empty() {
            for line in event.description.lines() {
                println!("    {line}");
            }
        }
        if !event.color_id.is_empty() {
            println!("    colorId: {}", event.color_id);
        }
    }
    Ok(())
}
