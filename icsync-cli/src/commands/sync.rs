use anyhow::Result;

use icsync_core::error::SyncError;
use icsync_core::ics::parse_document;
use icsync_core::recurrence::expand_events;
use icsync_core::source::{DocumentSource, FileSource};
use icsync_core::store::EventStore;
use icsync_core::sync::{SyncPlan, apply_plan, event_window};
use icsync_core::timezone::ZoneResolver;

use crate::config::Config;
use crate::render;
use crate::store::JsonStore;

pub async fn run(config: &Config, dry_run: bool) -> Result<()> {
    let mut sync_config = config.sync.clone();
    sync_config.dry_run |= dry_run;

    // Fatal before any mutation: no document, no run.
    let source = FileSource::new(&config.source_dir);
    let content = source.fetch(&config.document)?.ok_or_else(|| {
        SyncError::SourceUnavailable(format!(
            "{} not found in {}",
            config.document,
            config.source_dir.display()
        ))
    })?;

    let zones = ZoneResolver::with_aliases(&sync_config.timezone_aliases);
    let records = parse_document(&content, &zones);
    let events = expand_events(records, &zones);

    let Some((from, to)) = event_window(&events) else {
        println!("No events found in {}", config.document);
        return Ok(());
    };

    let mut store = JsonStore::open(&config.store_path)?;
    let store_events = store.query_events(from, to).await?;
    let plan = SyncPlan::compute(&events, store_events, &sync_config);

    println!("{}", render::render_plan(&plan));

    let report = apply_plan(&mut store, &plan, &sync_config).await;
    println!("\n{}", render::render_report(&report));

    Ok(())
}
