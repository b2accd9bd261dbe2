//! JSON-file-backed event store.
//!
//! A flat JSON document holding every event in the store, foreign ones
//! included. Each mutation persists immediately, mirroring a remote
//! store's independently committed operations.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use icsync_core::error::{SyncError, SyncResult};
use icsync_core::store::{EventFields, EventStore, StoreEvent};

pub struct JsonStore {
    path: PathBuf,
    events: Vec<StoreEvent>,
    next_id: u64,
}

impl JsonStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable or unparsable one means the scope cannot be resolved,
    /// which is fatal before any mutation.
    pub fn open(path: impl Into<PathBuf>) -> SyncResult<JsonStore> {
        let path = path.into();
        let events: Vec<StoreEvent> = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                SyncError::StoreUnavailable(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(SyncError::StoreUnavailable(format!("{}: {e}", path.display())));
            }
        };

        let next_id = events
            .iter()
            .filter_map(|e| e.id.strip_prefix("evt-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        Ok(JsonStore { path, events, next_id })
    }

    fn persist(&self) -> SyncResult<()> {
        let json = serde_json::to_string_pretty(&self.events)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(SyncError::Io)
    }

    fn find_mut(&mut self, id: &str) -> SyncResult<&mut StoreEvent> {
        self.events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| SyncError::Store(format!("no such event: {id}")))
    }
}

impl EventStore for JsonStore {
    async fn query_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> SyncResult<Vec<StoreEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.end >= from && e.start <= to)
            .cloned()
            .collect())
    }

    async fn create_event(&mut self, fields: &EventFields) -> SyncResult<StoreEvent> {
        let event = StoreEvent {
            id: format!("evt-{}", self.next_id),
            title: fields.title.clone(),
            start: fields.start,
            end: fields.end,
            description: Some(fields.description.clone()),
            location: Some(fields.location.clone()),
            tags: Default::default(),
        };
        self.next_id += 1;
        self.events.push(event.clone());
        self.persist()?;
        Ok(event)
    }

    async fn set_tag(&mut self, event_id: &str, key: &str, value: &str) -> SyncResult<()> {
        self.find_mut(event_id)?
            .tags
            .insert(key.to_string(), value.to_string());
        self.persist()
    }

    async fn update_event(&mut self, event_id: &str, fields: &EventFields) -> SyncResult<()> {
        let event = self.find_mut(event_id)?;
        event.title = fields.title.clone();
        event.start = fields.start;
        event.end = fields.end;
        event.description = Some(fields.description.clone());
        event.location = Some(fields.location.clone());
        self.persist()
    }

    async fn delete_event(&mut self, event_id: &str) -> SyncResult<()> {
        let before = self.events.len();
        self.events.retain(|e| e.id != event_id);
        if self.events.len() == before {
            return Err(SyncError::Store(format!("no such event: {event_id}")));
        }
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fields(title: &str) -> EventFields {
        EventFields {
            title: title.to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 18, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 18, 10, 0, 0).unwrap(),
            description: String::new(),
            location: String::new(),
        }
    }

    #[tokio::test]
    async fn events_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = JsonStore::open(&path).unwrap();
        let created = store.create_event(&fields("Persisted")).await.unwrap();
        store.set_tag(&created.id, "managed-by", "icsync").await.unwrap();

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.events.len(), 1);
        assert_eq!(reopened.events[0].title, "Persisted");
        assert_eq!(reopened.events[0].tag("managed-by"), Some("icsync"));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = JsonStore::open(&path).unwrap();
        let first = store.create_event(&fields("One")).await.unwrap();

        let mut reopened = JsonStore::open(&path).unwrap();
        let second = reopened.create_event(&fields("Two")).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn corrupt_store_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json at all").unwrap();

        assert!(matches!(
            JsonStore::open(&path),
            Err(SyncError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn deleting_unknown_event_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(dir.path().join("store.json")).unwrap();
        assert!(store.delete_event("evt-99").await.is_err());
    }
}
