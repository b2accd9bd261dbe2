//! ICS date/time value resolution.
//!
//! Resolution policy, in priority order:
//! 1. trailing `Z` marker: the numeric fields are UTC
//! 2. `TZID` parameter (unless VALUE=DATE): wall-clock fields in that zone,
//!    falling back to policy 3/4 with a warning when resolution fails
//! 3. `VALUE=DATE` or an 8-character value: all-day, midnight local
//! 4. otherwise: floating local date-time

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::timezone::{ZoneResolver, local_to_instant};

/// Resolve an ICS date or date-time value to an absolute instant.
///
/// `params` is the full property name with parameters (e.g.
/// `DTSTART;TZID=Tokyo Standard Time` or `DTSTART;VALUE=DATE`), needed to
/// detect date-only markers and named zones. Returns None for values that
/// match no recognized format.
pub fn resolve(value: &str, params: &str, zones: &ZoneResolver) -> Option<DateTime<Utc>> {
    let is_date_only = params.contains("VALUE=DATE");

    // 1. UTC marker
    if let Some(stripped) = value.strip_suffix('Z')
        && let Some(naive) = parse_naive_datetime(stripped)
    {
        return Some(naive.and_utc());
    }

    // 2. Named timezone
    if !is_date_only
        && let Some(tzid) = tzid_param(params)
        && let Some(naive) = parse_naive_datetime(value)
    {
        match zones.resolve_wall_clock(naive, tzid) {
            Some(instant) => return Some(instant),
            None => {
                warn!(tzid, value, "timezone resolution failed, falling back to floating local");
            }
        }
    }

    // 3. All-day
    if is_date_only || value.len() == 8 {
        let date = parse_naive_date(value)?;
        return Some(local_to_instant(date.and_hms_opt(0, 0, 0)?));
    }

    // 4. Floating local date-time
    if let Some(naive) = parse_naive_datetime(value) {
        return Some(local_to_instant(naive));
    }

    warn!(value, "unrecognized date format");
    None
}

/// Format a date as the canonical ICS date string (`YYYYMMDD`), the form
/// used by DTSTART and RECURRENCE-ID wall-clock values.
pub fn format_ics_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Extract the TZID parameter value from a property name string.
fn tzid_param(params: &str) -> Option<&str> {
    let rest = &params[params.find("TZID=")? + "TZID=".len()..];
    Some(rest.split(';').next().unwrap_or(rest))
}

fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.get(..8)?, "%Y%m%d").ok()
}

fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.get(..15)?, "%Y%m%dT%H%M%S").ok()
}
