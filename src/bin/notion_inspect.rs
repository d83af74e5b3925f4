use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use notion_gcal_sync::config;
use notion_gcal_sync::course;
use notion_gcal_sync::extract;
use notion_gcal_sync::model::FieldSource;
use notion_gcal_sync::notion::{NotionClient, NotionService};

/// Fetch one task page and print the fields the sync would extract from
/// it, with each field's provenance.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Page ID to inspect
    #[arg(long)]
    page_id: String,
}

fn provenance(source: &FieldSource) -> String {
    match source {
        FieldSource::Extracted => "extracted".to_string(),
        FieldSource::Defaulted(reason) => format!("defaulted: {reason}"),
        FieldSource::Failed(reason) => format!("failed: {reason}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = config::load(Some(&args.config))?;
    let client = NotionClient::new(cfg.notion.token.clone(), cfg.notion.version.clone());

    let page = client.retrieve_page(&args.page_id).await?;
    let fields = extract::extract_task(&page);
    let course = course::resolve_course(&client, fields.course.value.as_deref()).await;

    println!("Page ID: {}", page.id);
    println!("Fields:");
    println!(
        "  title:     {:?}  [{}]",
        fields.title.value,
        provenance(&fields.title.source)
    );
    println!(
        "  type:      {:?}  [{}]",
        fields.task_type.value,
        provenance(&fields.task_type.source)
    );
    println!(
        "  status:    {:?}  [{}]",
        fields.status.value,
        provenance(&fields.status.source)
    );
    println!(
        "  deadline:  {:?}  [{}]",
        fields.deadline.value,
        provenance(&fields.deadline.source)
    );
    println!(
        "  notes:     {:?}  [{}]",
        fields.notes.value,
        provenance(&fields.notes.source)
    );
    println!(
        "  course:    {:?}  [{}]",
        fields.course.value,
        provenance(&fields.course.source)
    );
    println!("Course:");
    println!(
        "  icon:      {:?}  [{}]",
        course.icon.value,
        provenance(&course.icon.source)
    );
    println!(
        "  name:      {:?}  [{}]",
        course.name.value,
        provenance(&course.name.source)
    );
    Ok(())
}
