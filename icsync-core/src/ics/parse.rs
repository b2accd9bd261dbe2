//! ICS document parser.
//!
//! A small explicit-state machine over the document's logical lines:
//! outside a record, only `BEGIN:VEVENT` matters; inside one, property
//! lines accumulate onto a pending record until `END:VEVENT` decides
//! whether it is retained. A record is retained only when UID, DTSTART
//! and DTEND all resolved; anything else is dropped with a diagnostic,
//! never failing the whole parse.

use tracing::{debug, warn};

use crate::event::{EventRecord, Recurrence};
use crate::ics::datetime;
use crate::timezone::ZoneResolver;

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";

/// Parse raw ICS text into event records, in document order.
///
/// No deduplication happens here: records sharing a UID are legitimate
/// (a master and its exceptions).
pub fn parse_document(content: &str, zones: &ZoneResolver) -> Vec<EventRecord> {
    let mut events = Vec::new();
    let mut state = State::Outside;

    for line in logical_lines(content) {
        state = match state {
            State::Outside => {
                if line == BEGIN_EVENT {
                    State::InRecord(Pending::default())
                } else {
                    State::Outside
                }
            }
            State::InRecord(mut pending) => {
                if line == END_EVENT {
                    if let Some(record) = pending.into_record() {
                        events.push(record);
                    }
                    State::Outside
                } else {
                    pending.apply_line(&line, zones);
                    State::InRecord(pending)
                }
            }
        };
    }
    // A record whose BEGIN was never closed is discarded with the state.

    debug!(count = events.len(), "parsed events from document");
    events
}

enum State {
    Outside,
    InRecord(Pending),
}

/// Record under construction; start/end stay unresolved until their
/// property lines are seen.
#[derive(Default)]
struct Pending {
    summary: String,
    description: String,
    location: String,
    start: Option<chrono::DateTime<chrono::Utc>>,
    end: Option<chrono::DateTime<chrono::Utc>>,
    uid: String,
    recurrence_id: Option<String>,
    rrule: Option<String>,
    exdates: Vec<String>,
    dtstart_value: String,
    dtstart_params: String,
}

impl Pending {
    fn apply_line(&mut self, line: &str, zones: &ZoneResolver) {
        let Some(colon) = line.find(':') else { return };
        if colon == 0 {
            return;
        }
        let property = &line[..colon];
        let value = unescape_text(&line[colon + 1..]);

        // Strip `;`-delimited parameters from the name, but keep the full
        // property text for date resolution (TZID, VALUE=DATE).
        let name = property.split(';').next().unwrap_or(property);

        match name {
            "SUMMARY" => self.summary = value,
            "DESCRIPTION" => self.description = value,
            "LOCATION" => self.location = value,
            "DTSTART" => {
                self.start = datetime::resolve(&value, property, zones);
                self.dtstart_value = value;
                self.dtstart_params = property.to_string();
            }
            "DTEND" => self.end = datetime::resolve(&value, property, zones),
            "UID" => self.uid = value,
            "RECURRENCE-ID" => self.recurrence_id = Some(value),
            "RRULE" => self.rrule = Some(value),
            "EXDATE" => {
                // Comma-separated; repeated EXDATE lines accumulate.
                self.exdates
                    .extend(value.split(',').map(str::trim).filter(|v| !v.is_empty()).map(String::from));
            }
            _ => {}
        }
    }

    fn into_record(self) -> Option<EventRecord> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            warn!(
                uid = %self.uid,
                summary = %self.summary,
                "dropping record without resolvable start/end"
            );
            return None;
        };
        if self.uid.is_empty() {
            warn!(summary = %self.summary, "dropping record without UID");
            return None;
        }

        let recurrence = self.rrule.map(|rule| Recurrence {
            rule,
            exdates: self.exdates,
        });

        Some(EventRecord {
            summary: self.summary,
            description: self.description,
            location: self.location,
            start,
            end,
            uid: self.uid,
            recurrence_id: self.recurrence_id,
            recurrence,
            dtstart_value: self.dtstart_value,
            dtstart_params: self.dtstart_params,
        })
    }
}

/// Normalize line endings and un-fold continuation lines.
///
/// A line starting with a space or tab continues the previous logical
/// line; exactly one leading whitespace character is removed.
fn logical_lines(content: &str) -> Vec<String> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = Vec::new();

    for raw in normalized.split('\n') {
        if (raw.starts_with(' ') || raw.starts_with('\t'))
            && let Some(last) = lines.last_mut()
        {
            last.push_str(&raw[1..]);
        } else {
            lines.push(raw.to_string());
        }
    }
    lines
}

/// Unescape an ICS text value (RFC 5545 Section 3.3.11).
///
/// Fixed order: `\n`, `\,`, `\;`, then `\\`. Decoding the literal
/// backslash last keeps a decoded `\` from being mistaken for the start
/// of another escape.
fn unescape_text(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
}
