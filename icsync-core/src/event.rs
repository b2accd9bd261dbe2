//! Document-derived event types.
//!
//! An [`EventRecord`] is one event as read from the ICS document, either
//! directly (standalone events, recurrence exceptions) or produced by
//! expanding a recurring master. The identity key built from `uid` and
//! `recurrence_id` is the sole correlation mechanism between document
//! events and previously created store events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between UID and override id in an identity key.
///
/// Must never appear in a raw UID or RECURRENCE-ID value; `|` is not part
/// of either value domain in RFC 5545.
pub const IDENTITY_SEP: char = '|';

/// Recurrence data carried by a master event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// Raw RRULE value, e.g. `FREQ=WEEKLY;UNTIL=20250601T000000Z;BYDAY=TU`.
    pub rule: String,
    /// Occurrence-id strings from EXDATE lines, accumulated across
    /// repeated properties.
    pub exdates: Vec<String>,
}

/// One event from the document, before or after recurrence expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Series identifier; never empty for retained records.
    pub uid: String,
    /// Raw RECURRENCE-ID value for exceptions and expanded occurrences.
    pub recurrence_id: Option<String>,
    /// Present only on master records.
    pub recurrence: Option<Recurrence>,
    /// Raw DTSTART value (e.g. `20250218T150500`), kept so the expander
    /// can re-resolve each occurrence through the same timezone.
    pub dtstart_value: String,
    /// Full DTSTART property name with parameters (e.g.
    /// `DTSTART;TZID=Tokyo Standard Time`).
    pub dtstart_params: String,
}

impl EventRecord {
    /// Composite key correlating this event with a store event across runs.
    pub fn identity_key(&self) -> String {
        identity_key(&self.uid, self.recurrence_id.as_deref())
    }

    /// Whether this record is a recurring master (has a rule, is not
    /// itself an exception instance).
    pub fn is_master(&self) -> bool {
        self.recurrence.is_some() && self.recurrence_id.is_none()
    }
}

/// Build an identity key: `uid` alone for standalone and master events,
/// `uid|overrideId` for exceptions and expanded occurrences.
pub fn identity_key(uid: &str, override_id: Option<&str>) -> String {
    match override_id {
        Some(id) => format!("{uid}{IDENTITY_SEP}{id}"),
        None => uid.to_string(),
    }
}
