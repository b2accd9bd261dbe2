//! RRULE value parsing.

use chrono::{DateTime, Utc, Weekday};

use crate::ics::datetime;
use crate::timezone::ZoneResolver;

/// Supported recurrence frequencies. Anything else aborts expansion for
/// that master (it is kept as a standalone event instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Weekly,
    Monthly,
}

impl Frequency {
    fn parse(value: &str) -> Option<Frequency> {
        match value {
            "WEEKLY" => Some(Frequency::Weekly),
            "MONTHLY" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

/// One BYDAY entry: a weekday with an optional ordinal prefix
/// (`TU`, `1TU` for first Tuesday, `-1TH` for last Thursday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySpec {
    pub ordinal: Option<i32>,
    pub weekday: Weekday,
}

impl DaySpec {
    /// Parse a BYDAY entry; unknown codes or malformed ordinals are None
    /// and get dropped from the rule.
    pub fn parse(value: &str) -> Option<DaySpec> {
        if value.len() < 2 || !value.is_ascii() {
            return None;
        }
        let (prefix, code) = value.split_at(value.len() - 2);
        let weekday = weekday_from_code(code)?;
        let ordinal = if prefix.is_empty() {
            None
        } else {
            Some(prefix.parse::<i32>().ok()?)
        };
        Some(DaySpec { ordinal, weekday })
    }
}

fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "SU" => Some(Weekday::Sun),
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        _ => None,
    }
}

/// A parsed RRULE. `freq` is None for unsupported or missing FREQ values;
/// the raw text is kept for diagnostics.
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    pub freq: Option<Frequency>,
    pub raw_freq: String,
    pub interval: u32,
    pub until: Option<DateTime<Utc>>,
    pub by_day: Vec<DaySpec>,
    pub week_start: Weekday,
}

impl RecurrenceRule {
    /// Parse an RRULE value like
    /// `FREQ=WEEKLY;INTERVAL=2;UNTIL=20250601T000000Z;BYDAY=TU,TH;WKST=MO`.
    pub fn parse(text: &str, zones: &ZoneResolver) -> RecurrenceRule {
        let mut rule = RecurrenceRule {
            freq: None,
            raw_freq: String::new(),
            interval: 1,
            until: None,
            by_day: Vec::new(),
            week_start: Weekday::Sun,
        };

        for part in text.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key {
                "FREQ" => {
                    rule.raw_freq = value.to_string();
                    rule.freq = Frequency::parse(value);
                }
                "INTERVAL" => {
                    // Interval must stay positive; a zero would never advance.
                    rule.interval = value.parse().unwrap_or(1).max(1);
                }
                "UNTIL" => rule.until = datetime::resolve(value, "", zones),
                "BYDAY" => {
                    rule.by_day = value.split(',').filter_map(DaySpec::parse).collect();
                }
                "WKST" => {
                    if let Some(weekday) = weekday_from_code(value) {
                        rule.week_start = weekday;
                    }
                }
                _ => {}
            }
        }
        rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn zones() -> ZoneResolver {
        ZoneResolver::new()
    }

    #[test]
    fn parses_full_weekly_rule() {
        let rule = RecurrenceRule::parse(
            "FREQ=WEEKLY;INTERVAL=2;UNTIL=20250601T000000Z;BYDAY=TU,TH;WKST=MO",
            &zones(),
        );
        assert_eq!(rule.freq, Some(Frequency::Weekly));
        assert_eq!(rule.interval, 2);
        assert_eq!(
            rule.until,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            rule.by_day,
            vec![
                DaySpec { ordinal: None, weekday: Weekday::Tue },
                DaySpec { ordinal: None, weekday: Weekday::Thu },
            ]
        );
        assert_eq!(rule.week_start, Weekday::Mon);
    }

    #[test]
    fn defaults_apply() {
        let rule = RecurrenceRule::parse("FREQ=WEEKLY", &zones());
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.week_start, Weekday::Sun);
        assert!(rule.until.is_none());
        assert!(rule.by_day.is_empty());
    }

    #[test]
    fn unsupported_freq_is_none_but_raw_is_kept() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;UNTIL=20250601T000000Z", &zones());
        assert_eq!(rule.freq, None);
        assert_eq!(rule.raw_freq, "DAILY");
    }

    #[test]
    fn ordinal_day_specs() {
        assert_eq!(
            DaySpec::parse("1TU"),
            Some(DaySpec { ordinal: Some(1), weekday: Weekday::Tue })
        );
        assert_eq!(
            DaySpec::parse("-1TH"),
            Some(DaySpec { ordinal: Some(-1), weekday: Weekday::Thu })
        );
        assert_eq!(
            DaySpec::parse("+2FR"),
            Some(DaySpec { ordinal: Some(2), weekday: Weekday::Fri })
        );
        assert_eq!(DaySpec::parse("XX"), None);
        assert_eq!(DaySpec::parse("T"), None);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let rule = RecurrenceRule::parse("FREQ=WEEKLY;INTERVAL=0", &zones());
        assert_eq!(rule.interval, 1);
    }
}
