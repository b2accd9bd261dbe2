//! Diff computation between document events and owned store events.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::event::EventRecord;
use crate::store::StoreEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::Create => "+",
            ChangeKind::Update => "~",
            ChangeKind::Delete => "-",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "create"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// One planned mutation. Creates and updates carry the document record;
/// updates and deletes carry the matched store event.
#[derive(Debug, Clone)]
pub struct EventChange {
    pub kind: ChangeKind,
    pub key: String,
    pub record: Option<EventRecord>,
    pub target: Option<StoreEvent>,
}

impl EventChange {
    /// Human-readable title for logs and rendering.
    pub fn title(&self) -> &str {
        match (&self.record, &self.target) {
            (Some(record), _) => &record.summary,
            (None, Some(target)) => &target.title,
            (None, None) => "",
        }
    }
}

impl fmt::Display for EventChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: \"{}\" (key: {})", self.kind, self.title(), self.key)
    }
}

/// The mutation plan for one run: creates and updates in document order,
/// then deletes in store-query order.
#[derive(Debug, Default)]
pub struct SyncPlan {
    pub changes: Vec<EventChange>,
    pub unchanged: usize,
    /// Identity-key collisions found in the document (last write wins).
    pub duplicate_keys: usize,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// Diff document events against the store's contents in the window.
    ///
    /// Store events without the ownership tag are foreign and never enter
    /// the plan. Owned events are indexed by their identity tag; matched
    /// entries leave the index so whatever remains becomes a delete.
    pub fn compute(
        records: &[EventRecord],
        store_events: Vec<StoreEvent>,
        config: &SyncConfig,
    ) -> SyncPlan {
        // Document events by identity key, last write wins on collision.
        let mut by_key: HashMap<String, &EventRecord> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut duplicate_keys = 0;

        for record in records {
            let key = record.identity_key();
            if by_key.insert(key.clone(), record).is_some() {
                duplicate_keys += 1;
                warn!(key = %key, "duplicate identity key in document, keeping later record");
            } else {
                order.push(key);
            }
        }

        // Partition store events; only owned ones are candidates.
        let mut owned_index: HashMap<String, StoreEvent> = HashMap::new();
        let mut owned_order: Vec<String> = Vec::new();
        let mut owned = 0;
        let mut foreign = 0;

        for event in store_events {
            if event.tag(&config.owner_tag_key) != Some(config.owner_tag_value.as_str()) {
                foreign += 1;
                continue;
            }
            owned += 1;
            match event.tag(&config.identity_tag_key) {
                Some(key) => {
                    let key = key.to_string();
                    if owned_index.insert(key.clone(), event).is_none() {
                        owned_order.push(key);
                    }
                }
                None => debug!(id = %event.id, "owned store event without identity tag, ignoring"),
            }
        }
        debug!(owned, foreign, "partitioned store events");

        let mut plan = SyncPlan {
            duplicate_keys,
            ..SyncPlan::default()
        };

        for key in order {
            let record = by_key[&key];
            match owned_index.remove(&key) {
                Some(target) => {
                    if fields_equal(record, &target) {
                        plan.unchanged += 1;
                    } else {
                        plan.changes.push(EventChange {
                            kind: ChangeKind::Update,
                            key,
                            record: Some(record.clone()),
                            target: Some(target),
                        });
                    }
                }
                None => plan.changes.push(EventChange {
                    kind: ChangeKind::Create,
                    key,
                    record: Some(record.clone()),
                    target: None,
                }),
            }
        }

        // Whatever was never matched is no longer in the document.
        for key in owned_order {
            if let Some(target) = owned_index.remove(&key) {
                plan.changes.push(EventChange {
                    kind: ChangeKind::Delete,
                    key,
                    record: None,
                    target: Some(target),
                });
            }
        }

        plan
    }
}

/// Query window covering all document events, padded by one day on each
/// side against boundary skew. None when there are no events.
pub fn event_window(records: &[EventRecord]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let min = records.iter().map(|r| r.start).min()?;
    let max = records.iter().map(|r| r.end).max()?;
    Some((min - Duration::days(1), max + Duration::days(1)))
}

/// Field-level equality between a document event and a store event.
/// Absent description/location count as empty strings.
fn fields_equal(record: &EventRecord, event: &StoreEvent) -> bool {
    record.summary == event.title
        && record.start == event.start
        && record.end == event.end
        && record.description == event.description.as_deref().unwrap_or("")
        && record.location == event.location.as_deref().unwrap_or("")
}
