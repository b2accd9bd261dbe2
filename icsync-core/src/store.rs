//! Abstract target event store.
//!
//! The engine never talks to a concrete calendar backend; it sees store
//! events as passive records it can compare, tag, and request mutations
//! on. Ownership and identity live entirely in per-event tags, which is
//! the system's only persistent state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;
use crate::event::EventRecord;

/// An event living in the target store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Arbitrary key/value metadata; carries the ownership tag and the
    /// identity tag for events this system created.
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl StoreEvent {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// The writable fields of a store event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub location: String,
}

impl From<&EventRecord> for EventFields {
    fn from(record: &EventRecord) -> Self {
        EventFields {
            title: record.summary.clone(),
            start: record.start,
            end: record.end,
            description: record.description.clone(),
            location: record.location.clone(),
        }
    }
}

/// Operations the reconciliation engine needs from a target store.
///
/// Mutations are independently committed; no transactional atomicity is
/// assumed across a plan.
pub trait EventStore {
    /// All events in the window, owned or foreign.
    fn query_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = SyncResult<Vec<StoreEvent>>>;

    /// Create a new, initially untagged event.
    fn create_event(&mut self, fields: &EventFields) -> impl Future<Output = SyncResult<StoreEvent>>;

    fn set_tag(
        &mut self,
        event_id: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = SyncResult<()>>;

    fn update_event(
        &mut self,
        event_id: &str,
        fields: &EventFields,
    ) -> impl Future<Output = SyncResult<()>>;

    fn delete_event(&mut self, event_id: &str) -> impl Future<Output = SyncResult<()>>;
}
