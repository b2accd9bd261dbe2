use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

use icsync_core::error::SyncError;
use icsync_core::ics::parse_document;
use icsync_core::recurrence::expand_events;
use icsync_core::source::{DocumentSource, FileSource};
use icsync_core::timezone::ZoneResolver;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let source = FileSource::new(&config.source_dir);
    let content = source.fetch(&config.document)?.ok_or_else(|| {
        SyncError::SourceUnavailable(format!(
            "{} not found in {}",
            config.document,
            config.source_dir.display()
        ))
    })?;

    let zones = ZoneResolver::with_aliases(&config.sync.timezone_aliases);
    let mut events = expand_events(parse_document(&content, &zones), &zones);
    events.sort_by_key(|e| e.start);

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    let mut current_date: Option<String> = None;
    for event in &events {
        let date_label = format_date_label(event.start);
        if current_date.as_ref() != Some(&date_label) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", date_label.bold());
            current_date = Some(date_label);
        }

        let time = event.start.with_timezone(&Local).format("%H:%M");
        let key = format!("({})", event.identity_key());
        println!("  {} {} {}", time, event.summary, key.dimmed());
    }

    Ok(())
}

fn format_date_label(start: DateTime<Utc>) -> String {
    start.with_timezone(&Local).format("%a %b %e %Y").to_string()
}
