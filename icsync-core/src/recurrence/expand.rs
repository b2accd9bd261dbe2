//! Expansion of recurring masters into concrete occurrence events.
//!
//! Masters that cannot be expanded (unsupported FREQ, missing UNTIL,
//! unusable BYDAY, or a rule producing no occurrences) are kept as
//! standalone events so a series never silently disappears.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use tracing::{debug, warn};

use crate::event::EventRecord;
use crate::ics::datetime;
use crate::recurrence::rule::{Frequency, RecurrenceRule};
use crate::timezone::ZoneResolver;

/// Hard cap on candidates per master, bounding malformed or unbounded
/// input in both weekly and monthly modes.
const MAX_OCCURRENCES: usize = 520;

/// One expanded instance of a master, prior to exclusion/exception
/// filtering.
struct Occurrence {
    /// Canonical occurrence-id string, in the same wall-clock form as
    /// DTSTART and RECURRENCE-ID values (`YYYYMMDD` + original time part).
    id: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Replace recurring masters with their expanded occurrences.
///
/// Output is the union of standalone records (including abort-fallback
/// masters), exception records, and expanded occurrences. Duplicate
/// identity keys are possible in malformed input and are left for the
/// sync plan to handle.
pub fn expand_events(records: Vec<EventRecord>, zones: &ZoneResolver) -> Vec<EventRecord> {
    let mut masters = Vec::new();
    let mut exceptions = Vec::new();
    let mut standalone = Vec::new();

    for record in records {
        if record.is_master() {
            masters.push(record);
        } else if record.recurrence_id.is_some() {
            exceptions.push(record);
        } else {
            standalone.push(record);
        }
    }

    debug!(
        masters = masters.len(),
        exceptions = exceptions.len(),
        standalone = standalone.len(),
        "classified records"
    );

    // (uid, override-id) index for O(1) exception lookup during expansion.
    let mut overridden: HashMap<&str, HashSet<&str>> = HashMap::new();
    for exception in &exceptions {
        if let Some(id) = exception.recurrence_id.as_deref() {
            overridden.entry(exception.uid.as_str()).or_default().insert(id);
        }
    }

    let mut expanded = Vec::new();

    for master in masters {
        let occurrences = expand_master(&master, zones);
        if occurrences.is_empty() {
            warn!(
                uid = %master.uid,
                summary = %master.summary,
                "could not expand recurrence, keeping master as standalone"
            );
            standalone.push(master);
            continue;
        }

        let exdates: HashSet<&str> = master
            .recurrence
            .as_ref()
            .map(|r| r.exdates.iter().map(String::as_str).collect())
            .unwrap_or_default();
        let exception_ids = overridden.get(master.uid.as_str());

        let total = occurrences.len();
        let mut excluded = 0;
        let mut covered = 0;

        for occ in occurrences {
            if exdates.contains(occ.id.as_str()) {
                excluded += 1;
                continue;
            }
            if exception_ids.is_some_and(|ids| ids.contains(occ.id.as_str())) {
                // The exception record itself supplies this occurrence.
                covered += 1;
                continue;
            }
            expanded.push(EventRecord {
                summary: master.summary.clone(),
                description: master.description.clone(),
                location: master.location.clone(),
                start: occ.start,
                end: occ.end,
                uid: master.uid.clone(),
                recurrence_id: Some(occ.id),
                recurrence: None,
                dtstart_value: String::new(),
                dtstart_params: String::new(),
            });
        }

        debug!(
            uid = %master.uid,
            total,
            excluded,
            covered,
            produced = total - excluded - covered,
            "expanded master"
        );
    }

    let mut result = standalone;
    result.extend(exceptions);
    result.extend(expanded);
    result
}

/// Expand a single master's rule into candidate occurrences.
///
/// Empty output means expansion aborted; the caller keeps the master as a
/// standalone event.
fn expand_master(master: &EventRecord, zones: &ZoneResolver) -> Vec<Occurrence> {
    let Some(recurrence) = &master.recurrence else {
        return Vec::new();
    };
    let rule = RecurrenceRule::parse(&recurrence.rule, zones);

    let Some(freq) = rule.freq else {
        warn!(uid = %master.uid, freq = %rule.raw_freq, "unsupported RRULE FREQ");
        return Vec::new();
    };
    let Some(until) = rule.until else {
        warn!(uid = %master.uid, "RRULE missing UNTIL");
        return Vec::new();
    };

    // Wall-clock date and time-of-day from the raw DTSTART value, so each
    // occurrence can be re-resolved through the master's own timezone.
    let (date_part, time_part) = match master.dtstart_value.find('T') {
        Some(idx) => master.dtstart_value.split_at(idx),
        None => (master.dtstart_value.as_str(), ""),
    };
    let Ok(start_date) = NaiveDate::parse_from_str(date_part, "%Y%m%d") else {
        warn!(uid = %master.uid, value = %master.dtstart_value, "unparsable DTSTART date");
        return Vec::new();
    };

    let duration = master.end - master.start;

    match freq {
        Frequency::Weekly => expand_weekly(master, &rule, until, start_date, time_part, duration, zones),
        Frequency::Monthly => {
            expand_monthly(master, &rule, until, start_date, time_part, duration, zones)
        }
    }
}

/// WEEKLY: iterate week by week from the WKST-aligned start of the
/// series' week, emitting each target weekday in ascending order.
fn expand_weekly(
    master: &EventRecord,
    rule: &RecurrenceRule,
    until: DateTime<Utc>,
    start_date: NaiveDate,
    time_part: &str,
    duration: Duration,
    zones: &ZoneResolver,
) -> Vec<Occurrence> {
    // Ordinal prefixes are ignored in weekly mode; only the weekday counts.
    let mut targets: Vec<Weekday> = rule.by_day.iter().map(|spec| spec.weekday).collect();
    if targets.is_empty() {
        targets.push(start_date.weekday());
    }
    targets.sort_by_key(|day| day.num_days_from_sunday());
    targets.dedup();

    let wkst = rule.week_start.num_days_from_sunday();
    let days_back = (start_date.weekday().num_days_from_sunday() + 7 - wkst) % 7;
    let mut week_start = start_date - Duration::days(i64::from(days_back));

    let mut occurrences = Vec::new();
    for _ in 0..MAX_OCCURRENCES {
        for target in &targets {
            let offset = (target.num_days_from_sunday() + 7 - wkst) % 7;
            let date = week_start + Duration::days(i64::from(offset));
            if date < start_date {
                continue;
            }
            let Some(occ) = resolve_candidate(master, date, time_part, duration, zones) else {
                continue;
            };
            if occ.start > until {
                return occurrences;
            }
            occurrences.push(occ);
            if occurrences.len() >= MAX_OCCURRENCES {
                return occurrences;
            }
        }
        week_start += Duration::days(7 * i64::from(rule.interval));
    }
    occurrences
}

/// MONTHLY: requires exactly one ordinal-weekday BYDAY specifier; months
/// lacking the requested occurrence are skipped.
fn expand_monthly(
    master: &EventRecord,
    rule: &RecurrenceRule,
    until: DateTime<Utc>,
    start_date: NaiveDate,
    time_part: &str,
    duration: Duration,
    zones: &ZoneResolver,
) -> Vec<Occurrence> {
    let [spec] = rule.by_day.as_slice() else {
        warn!(uid = %master.uid, "MONTHLY BYDAY must be a single specifier");
        return Vec::new();
    };
    let Some(nth) = spec.ordinal else {
        warn!(uid = %master.uid, "MONTHLY BYDAY without ordinal is unsupported");
        return Vec::new();
    };

    let mut year = start_date.year();
    let mut month = start_date.month();
    let mut occurrences = Vec::new();

    for _ in 0..MAX_OCCURRENCES {
        if let Some(day) = nth_weekday_of_month(year, month, spec.weekday, nth)
            && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
            && date >= start_date
        {
            if let Some(occ) = resolve_candidate(master, date, time_part, duration, zones) {
                if occ.start > until {
                    return occurrences;
                }
                occurrences.push(occ);
                if occurrences.len() >= MAX_OCCURRENCES {
                    return occurrences;
                }
            }
        }

        month += rule.interval;
        while month > 12 {
            month -= 12;
            year += 1;
        }
    }
    occurrences
}

/// Build a candidate for `date`, carrying the master's wall-clock
/// time-of-day and re-resolving through the master's DTSTART parameters
/// (so a zoned series stays on local time across DST transitions).
fn resolve_candidate(
    master: &EventRecord,
    date: NaiveDate,
    time_part: &str,
    duration: Duration,
    zones: &ZoneResolver,
) -> Option<Occurrence> {
    let id = format!("{}{}", datetime::format_ics_date(date), time_part);
    let Some(start) = datetime::resolve(&id, &master.dtstart_params, zones) else {
        warn!(uid = %master.uid, candidate = %id, "skipping unresolvable occurrence");
        return None;
    };
    Some(Occurrence { id, start, end: start + duration })
}

/// Day of month of the nth (1-based) or last (-1) `weekday` in a month.
/// None when that occurrence does not exist.
fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, nth: i32) -> Option<u32> {
    if nth > 0 {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let offset = (weekday.num_days_from_sunday() + 7 - first.weekday().num_days_from_sunday()) % 7;
        let day = 1 + offset + (nth as u32 - 1) * 7;
        NaiveDate::from_ymd_opt(year, month, day).map(|d| d.day())
    } else if nth == -1 {
        let last = last_day_of_month(year, month)?;
        let back = (last.weekday().num_days_from_sunday() + 7 - weekday.num_days_from_sunday()) % 7;
        Some(last.day() - back)
    } else {
        None
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    Some(NaiveDate::from_ymd_opt(next_year, next_month, 1)? - Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::parse_document;
    use chrono::{TimeZone, Utc};

    fn zones() -> ZoneResolver {
        ZoneResolver::new()
    }

    fn expand_doc(body: &str) -> Vec<EventRecord> {
        let content = format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n{body}END:VCALENDAR\r\n");
        let zones = zones();
        expand_events(parse_document(&content, &zones), &zones)
    }

    fn keys(events: &[EventRecord]) -> Vec<String> {
        events.iter().map(|e| e.identity_key()).collect()
    }

    fn weekly_master(rrule: &str, extra: &str) -> String {
        format!(
            "BEGIN:VEVENT\r\n\
             UID:w@test\r\n\
             SUMMARY:Weekly thing\r\n\
             RRULE:{rrule}\r\n\
             {extra}\
             DTSTART:20250107T100000Z\r\n\
             DTEND:20250107T110000Z\r\n\
             END:VEVENT\r\n"
        )
    }

    #[test]
    fn weekly_until_boundary_is_inclusive() {
        let events = expand_doc(&weekly_master(
            "FREQ=WEEKLY;UNTIL=20250121T100000Z;BYDAY=TU",
            "",
        ));
        assert_eq!(
            keys(&events),
            vec![
                "w@test|20250107T100000Z",
                "w@test|20250114T100000Z",
                "w@test|20250121T100000Z",
            ]
        );

        // One second before the boundary candidate excludes it
        let events = expand_doc(&weekly_master(
            "FREQ=WEEKLY;UNTIL=20250121T095959Z;BYDAY=TU",
            "",
        ));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn weekly_interval_two_alternates_weeks() {
        let events = expand_doc(&weekly_master(
            "FREQ=WEEKLY;INTERVAL=2;UNTIL=20250131T090000Z;BYDAY=TU,TH",
            "",
        ));
        assert_eq!(
            keys(&events),
            vec![
                "w@test|20250107T100000Z",
                "w@test|20250109T100000Z",
                "w@test|20250121T100000Z",
                "w@test|20250123T100000Z",
            ]
        );
    }

    #[test]
    fn weekly_without_byday_uses_start_weekday() {
        let events = expand_doc(&weekly_master("FREQ=WEEKLY;UNTIL=20250121T100000Z", ""));
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.uid == "w@test"));
    }

    #[test]
    fn weekly_occurrences_keep_master_duration() {
        let events = expand_doc(&weekly_master(
            "FREQ=WEEKLY;UNTIL=20250121T100000Z;BYDAY=TU",
            "",
        ));
        for event in &events {
            assert_eq!(event.end - event.start, Duration::hours(1));
            assert_eq!(event.summary, "Weekly thing");
        }
    }

    #[test]
    fn exdate_excludes_occurrence() {
        let events = expand_doc(&weekly_master(
            "FREQ=WEEKLY;UNTIL=20250121T100000Z;BYDAY=TU",
            "EXDATE:20250114T100000Z\r\n",
        ));
        assert_eq!(
            keys(&events),
            vec!["w@test|20250107T100000Z", "w@test|20250121T100000Z"]
        );
    }

    #[test]
    fn exception_replaces_expanded_occurrence() {
        let exception = "BEGIN:VEVENT\r\n\
            UID:w@test\r\n\
            SUMMARY:Moved to afternoon\r\n\
            RECURRENCE-ID:20250114T100000Z\r\n\
            DTSTART:20250114T150000Z\r\n\
            DTEND:20250114T160000Z\r\n\
            END:VEVENT\r\n";
        let body = format!(
            "{}{exception}",
            weekly_master("FREQ=WEEKLY;UNTIL=20250121T100000Z;BYDAY=TU", "")
        );
        let events = expand_doc(&body);

        let mut sorted = keys(&events);
        sorted.sort();
        assert_eq!(
            sorted,
            vec![
                "w@test|20250107T100000Z",
                "w@test|20250114T100000Z",
                "w@test|20250121T100000Z",
            ]
        );
        let overridden = events
            .iter()
            .find(|e| e.recurrence_id.as_deref() == Some("20250114T100000Z"))
            .unwrap();
        assert_eq!(overridden.summary, "Moved to afternoon");
        assert_eq!(
            overridden.start,
            Utc.with_ymd_and_hms(2025, 1, 14, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn excluded_and_overridden_occurrence_appears_exactly_once() {
        // Same occurrence id in both EXDATE and an exception record: the
        // exception wins, exactly one record carries the key.
        let exception = "BEGIN:VEVENT\r\n\
            UID:w@test\r\n\
            SUMMARY:Survives exclusion\r\n\
            RECURRENCE-ID:20250114T100000Z\r\n\
            DTSTART:20250114T150000Z\r\n\
            DTEND:20250114T160000Z\r\n\
            END:VEVENT\r\n";
        let body = format!(
            "{}{exception}",
            weekly_master(
                "FREQ=WEEKLY;UNTIL=20250121T100000Z;BYDAY=TU",
                "EXDATE:20250114T100000Z\r\n"
            )
        );
        let events = expand_doc(&body);
        let matches: Vec<_> = events
            .iter()
            .filter(|e| e.identity_key() == "w@test|20250114T100000Z")
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].summary, "Survives exclusion");
    }

    #[test]
    fn monthly_last_thursday_scenario() {
        let body = "BEGIN:VEVENT\r\n\
            UID:m@test\r\n\
            SUMMARY:Monthly review\r\n\
            RRULE:FREQ=MONTHLY;BYDAY=-1TH;UNTIL=20250531T235900Z\r\n\
            DTSTART:20250130T120000Z\r\n\
            DTEND:20250130T130000Z\r\n\
            END:VEVENT\r\n";
        let events = expand_doc(body);
        assert_eq!(
            keys(&events),
            vec![
                "m@test|20250130T120000Z",
                "m@test|20250227T120000Z",
                "m@test|20250327T120000Z",
                "m@test|20250424T120000Z",
                "m@test|20250529T120000Z",
            ]
        );
    }

    #[test]
    fn monthly_skips_months_without_nth_occurrence() {
        // Fifth Friday exists in Jan and May 2025 only (within the bound)
        let body = "BEGIN:VEVENT\r\n\
            UID:m@test\r\n\
            SUMMARY:Fifth Friday\r\n\
            RRULE:FREQ=MONTHLY;BYDAY=5FR;UNTIL=20250630T000000Z\r\n\
            DTSTART:20250131T090000Z\r\n\
            DTEND:20250131T100000Z\r\n\
            END:VEVENT\r\n";
        let events = expand_doc(body);
        assert_eq!(
            keys(&events),
            vec!["m@test|20250131T090000Z", "m@test|20250530T090000Z"]
        );
    }

    #[test]
    fn unsupported_freq_keeps_master_as_standalone() {
        let events = expand_doc(&weekly_master("FREQ=DAILY;UNTIL=20250121T100000Z", ""));
        assert_eq!(keys(&events), vec!["w@test"]);
        assert!(events[0].recurrence.is_some());
    }

    #[test]
    fn missing_until_keeps_master_as_standalone() {
        let events = expand_doc(&weekly_master("FREQ=WEEKLY;BYDAY=TU", ""));
        assert_eq!(keys(&events), vec!["w@test"]);
    }

    #[test]
    fn monthly_bare_weekday_keeps_master_as_standalone() {
        let body = "BEGIN:VEVENT\r\n\
            UID:m@test\r\n\
            SUMMARY:Bad monthly\r\n\
            RRULE:FREQ=MONTHLY;BYDAY=TU;UNTIL=20250601T000000Z\r\n\
            DTSTART:20250107T090000Z\r\n\
            DTEND:20250107T100000Z\r\n\
            END:VEVENT\r\n";
        assert_eq!(keys(&expand_doc(body)), vec!["m@test"]);
    }

    #[test]
    fn expansion_is_capped() {
        let events = expand_doc(&weekly_master("FREQ=WEEKLY;UNTIL=22000101T000000Z;BYDAY=TU", ""));
        assert_eq!(events.len(), MAX_OCCURRENCES);
    }

    #[test]
    fn zoned_series_follows_wall_clock_across_dst() {
        // 09:00 Pacific: PST (UTC-8) on Mar 4, PDT (UTC-7) from Mar 11
        let body = "BEGIN:VEVENT\r\n\
            UID:z@test\r\n\
            SUMMARY:Pacific standup\r\n\
            RRULE:FREQ=WEEKLY;BYDAY=TU;UNTIL=20250318T170000Z\r\n\
            DTSTART;TZID=Pacific Standard Time:20250304T090000\r\n\
            DTEND;TZID=Pacific Standard Time:20250304T100000\r\n\
            END:VEVENT\r\n";
        let events = expand_doc(body);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2025, 3, 4, 17, 0, 0).unwrap());
        assert_eq!(events[1].start, Utc.with_ymd_and_hms(2025, 3, 11, 16, 0, 0).unwrap());
        assert_eq!(events[2].start, Utc.with_ymd_and_hms(2025, 3, 18, 16, 0, 0).unwrap());
    }

    #[test]
    fn expansion_is_deterministic_across_runs() {
        let body = weekly_master("FREQ=WEEKLY;UNTIL=20250301T100000Z;BYDAY=TU,TH", "");
        let first = expand_doc(&body);
        let second = expand_doc(&body);
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn nth_weekday_computation() {
        // January 2025: first Wednesday is the 1st, last Thursday the 30th
        assert_eq!(nth_weekday_of_month(2025, 1, Weekday::Wed, 1), Some(1));
        assert_eq!(nth_weekday_of_month(2025, 1, Weekday::Thu, -1), Some(30));
        assert_eq!(nth_weekday_of_month(2025, 1, Weekday::Fri, 5), Some(31));
        assert_eq!(nth_weekday_of_month(2025, 2, Weekday::Fri, 5), None);
        assert_eq!(nth_weekday_of_month(2025, 2, Weekday::Mon, 0), None);
        assert_eq!(nth_weekday_of_month(2025, 2, Weekday::Mon, -2), None);
    }
}
