//! Plan application against the target store.
//!
//! Each mutation is isolated: a store failure is counted and the run
//! moves on after a recovery pause. Successful mutations are throttled
//! to stay under the store's burst-rate limits. Dry runs never call a
//! mutating operation.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{SyncConfig, ThrottleConfig};
use crate::error::SyncResult;
use crate::event::EventRecord;
use crate::store::{EventFields, EventStore, StoreEvent};
use crate::sync::plan::{ChangeKind, SyncPlan, event_window};
use crate::sync::report::SyncReport;

/// Paces store mutations: a short pause after every mutation, a longer
/// one after every Nth, and a recovery pause after a failure.
pub struct Throttle {
    mutations: u64,
    config: ThrottleConfig,
}

impl Throttle {
    pub fn new(config: ThrottleConfig) -> Self {
        Throttle { mutations: 0, config }
    }

    pub async fn after_mutation(&mut self) {
        self.mutations += 1;
        sleep(Duration::from_millis(self.config.mutation_pause_ms)).await;
        if self.config.burst_every > 0 && self.mutations % self.config.burst_every == 0 {
            info!(mutations = self.mutations, "throttle pause");
            sleep(Duration::from_millis(self.config.burst_pause_ms)).await;
        }
    }

    pub async fn after_error(&self) {
        sleep(Duration::from_millis(self.config.error_pause_ms)).await;
    }
}

/// Full reconciliation of expanded document events against the store.
///
/// Fails only when the window query itself fails, before any mutation is
/// attempted; everything past that point is contained per mutation.
pub async fn sync_events<S: EventStore>(
    store: &mut S,
    records: &[EventRecord],
    config: &SyncConfig,
) -> SyncResult<SyncReport> {
    let Some((from, to)) = event_window(records) else {
        info!("no document events, nothing to reconcile");
        return Ok(SyncReport::empty(config.dry_run));
    };

    let store_events = store.query_events(from, to).await?;
    let plan = SyncPlan::compute(records, store_events, config);
    Ok(apply_plan(store, &plan, config).await)
}

/// Apply a computed plan: creates and updates first, then deletes.
pub async fn apply_plan<S: EventStore>(
    store: &mut S,
    plan: &SyncPlan,
    config: &SyncConfig,
) -> SyncReport {
    let mut report = SyncReport {
        unchanged: plan.unchanged,
        dry_run: config.dry_run,
        ..SyncReport::default()
    };
    let mut throttle = Throttle::new(config.throttle.clone());

    for change in &plan.changes {
        if config.dry_run {
            info!("[dry run] {change}");
            count(&mut report, change.kind);
            continue;
        }

        let result = match change.kind {
            ChangeKind::Create => {
                let record = change.record.as_ref().expect("create must have a record");
                create_one(store, record, &change.key, config).await
            }
            ChangeKind::Update => {
                let record = change.record.as_ref().expect("update must have a record");
                let target = change.target.as_ref().expect("update must have a target");
                store.update_event(&target.id, &EventFields::from(record)).await
            }
            ChangeKind::Delete => {
                let target = change.target.as_ref().expect("delete must have a target");
                store.delete_event(&target.id).await
            }
        };

        match result {
            Ok(()) => {
                count(&mut report, change.kind);
                throttle.after_mutation().await;
            }
            Err(e) => {
                error!(key = %change.key, kind = %change.kind, "store operation failed: {e}");
                report.errors += 1;
                throttle.after_error().await;
            }
        }
    }

    if plan.duplicate_keys > config.duplicate_key_warn_threshold {
        warn!(
            duplicates = plan.duplicate_keys,
            threshold = config.duplicate_key_warn_threshold,
            "document contains more duplicate identity keys than tolerated"
        );
    }

    report
}

/// Create, then tag with ownership and identity so later runs can
/// correlate the event.
async fn create_one<S: EventStore>(
    store: &mut S,
    record: &EventRecord,
    key: &str,
    config: &SyncConfig,
) -> SyncResult<()> {
    let created: StoreEvent = store.create_event(&EventFields::from(record)).await?;
    store
        .set_tag(&created.id, &config.owner_tag_key, &config.owner_tag_value)
        .await?;
    store.set_tag(&created.id, &config.identity_tag_key, key).await?;
    Ok(())
}

fn count(report: &mut SyncReport, kind: ChangeKind) {
    match kind {
        ChangeKind::Create => report.created += 1,
        ChangeKind::Update => report.updated += 1,
        ChangeKind::Delete => report.deleted += 1,
    }
}
