//! Timezone name resolution.
//!
//! Outlook exports commonly carry Windows timezone display names in TZID
//! parameters (e.g. `Tokyo Standard Time`). The resolver maps those to
//! IANA zone identifiers before handing them to chrono-tz, and converts
//! wall-clock values in a named zone to absolute instants.

use std::collections::HashMap;

use chrono::offset::LocalResult;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Built-in Windows-to-IANA timezone name mapping.
static LEGACY_ZONE_ALIASES: &[(&str, &str)] = &[
    ("Tokyo Standard Time", "Asia/Tokyo"),
    ("Pacific Standard Time", "America/Los_Angeles"),
    ("Eastern Standard Time", "America/New_York"),
    ("GMT Standard Time", "Europe/London"),
    ("W. Europe Standard Time", "Europe/Paris"),
    ("Central Standard Time", "America/Chicago"),
    ("China Standard Time", "Asia/Shanghai"),
    ("Singapore Standard Time", "Asia/Singapore"),
    ("Hawaiian Standard Time", "Pacific/Honolulu"),
    ("Korea Standard Time", "Asia/Seoul"),
    ("India Standard Time", "Asia/Kolkata"),
    ("Australia Eastern Standard Time", "Australia/Sydney"),
];

/// Resolves TZID values to zones and wall-clock times to instants.
#[derive(Debug, Clone)]
pub struct ZoneResolver {
    aliases: HashMap<String, String>,
}

impl Default for ZoneResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneResolver {
    /// Resolver with only the built-in legacy name table.
    pub fn new() -> Self {
        let aliases = LEGACY_ZONE_ALIASES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        ZoneResolver { aliases }
    }

    /// Resolver with extra aliases from configuration layered on top of
    /// the built-in table. Config entries win on conflict.
    pub fn with_aliases(extra: &HashMap<String, String>) -> Self {
        let mut resolver = Self::new();
        for (from, to) in extra {
            resolver.aliases.insert(from.clone(), to.clone());
        }
        resolver
    }

    /// Look up a TZID, mapping legacy display names to IANA identifiers.
    pub fn zone(&self, tzid: &str) -> Option<Tz> {
        let canonical = self.aliases.get(tzid).map(String::as_str).unwrap_or(tzid);
        canonical.parse::<Tz>().ok()
    }

    /// Resolve wall-clock fields in a named zone to an absolute instant.
    ///
    /// Returns None when the zone is unknown or the wall-clock time does
    /// not exist in that zone (DST gap); the caller falls back to floating
    /// local interpretation.
    pub fn resolve_wall_clock(&self, naive: NaiveDateTime, tzid: &str) -> Option<DateTime<Utc>> {
        let tz = self.zone(tzid)?;
        earliest_instant(&tz, naive).map(|dt| dt.with_timezone(&Utc))
    }
}

/// Interpret a floating (timezone-less) wall-clock value in the local zone.
///
/// A value falling in a DST gap is interpreted as UTC rather than dropped,
/// so a record never loses its start over a spring-forward boundary.
pub fn local_to_instant(naive: NaiveDateTime) -> DateTime<Utc> {
    match earliest_instant(&Local, naive) {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

/// Map a wall-clock value to an instant in `tz`, taking the earlier of the
/// two instants when DST fold makes it ambiguous.
fn earliest_instant<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> Option<DateTime<Z>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(first, _) => Some(first),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn legacy_name_maps_to_iana_zone() {
        let zones = ZoneResolver::new();
        assert_eq!(zones.zone("Tokyo Standard Time"), Some(chrono_tz::Asia::Tokyo));
        assert_eq!(
            zones.zone("Pacific Standard Time"),
            Some(chrono_tz::America::Los_Angeles)
        );
    }

    #[test]
    fn iana_names_pass_through() {
        let zones = ZoneResolver::new();
        assert_eq!(zones.zone("Europe/Stockholm"), Some(chrono_tz::Europe::Stockholm));
    }

    #[test]
    fn unknown_zone_is_none() {
        let zones = ZoneResolver::new();
        assert!(zones.zone("Middle Earth Standard Time").is_none());
    }

    #[test]
    fn config_aliases_override_builtins() {
        let extra = HashMap::from([(
            "Pacific Standard Time".to_string(),
            "Pacific/Pitcairn".to_string(),
        )]);
        let zones = ZoneResolver::with_aliases(&extra);
        assert_eq!(
            zones.zone("Pacific Standard Time"),
            Some(chrono_tz::Pacific::Pitcairn)
        );
    }

    #[test]
    fn wall_clock_resolution_in_tokyo() {
        let zones = ZoneResolver::new();
        let instant = zones
            .resolve_wall_clock(naive(2025, 3, 10, 9, 0), "Tokyo Standard Time")
            .unwrap();
        // 09:00 JST == 00:00 UTC
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn dst_gap_yields_none() {
        let zones = ZoneResolver::new();
        // 2025-03-09 02:30 does not exist in America/Los_Angeles
        assert!(
            zones
                .resolve_wall_clock(naive(2025, 3, 9, 2, 30), "America/Los_Angeles")
                .is_none()
        );
    }
}
