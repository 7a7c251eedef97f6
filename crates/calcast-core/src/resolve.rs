//! Occurrence resolution.
//!
//! Turns a calendar into the time-ordered list of occurrences that fall
//! inside a [`Window`]:
//!
//! ```text
//! raw bytes ──parse──▶ CalendarDocument ──expand + filter──▶ Vec<Occurrence> ──stable sort──▶
//! ```
//!
//! Recurring events are expanded with the `rrule` crate, anchored at the
//! event's own `DTSTART` and zone. `EXDATE` values and `RECURRENCE-ID`
//! overrides suppress generated instances by exact timestamp.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use rrule::{RRule, Unvalidated};
use tracing::{debug, trace};

use crate::calendar::{CalendarDocument, decode_value};
use crate::error::{CoreError, CoreResult};
use crate::event::{EventStart, Occurrence};
use crate::time::Window;

const UTC_STAMP: &str = "%Y%m%dT%H%M%SZ";

/// Resolves the occurrences of a calendar within `lookahead_days` from now.
///
/// The clock is sampled exactly once.
///
/// # Errors
///
/// Returns [`CoreError::Parse`] for a malformed calendar and
/// [`CoreError::RuleExpansion`] for a malformed recurrence rule. No partial
/// result is returned on error.
pub fn resolve(bytes: &[u8], lookahead_days: u32, display_zone: Tz) -> CoreResult<Vec<Occurrence>> {
    resolve_at(bytes, &Window::from_now(lookahead_days), display_zone)
}

/// Resolves the occurrences of a calendar within an explicit window.
///
/// This is a pure function of its inputs: the same bytes and window always
/// produce the same ordered output.
///
/// # Errors
///
/// See [`resolve`].
pub fn resolve_at(bytes: &[u8], window: &Window, display_zone: Tz) -> CoreResult<Vec<Occurrence>> {
    let document = CalendarDocument::parse(bytes)?;
    resolve_document(&document, window, display_zone)
}

/// Resolves the occurrences of an already parsed calendar.
///
/// Floating times use the calendar's `X-WR-TIMEZONE` when present and
/// `display_zone` otherwise.
///
/// # Errors
///
/// See [`resolve`].
pub fn resolve_document(
    document: &CalendarDocument,
    window: &Window,
    display_zone: Tz,
) -> CoreResult<Vec<Occurrence>> {
    let floating_zone = document.default_zone.unwrap_or(display_zone);
    let overrides = collect_overrides(document);

    let mut occurrences = Vec::new();
    for event in &document.events {
        if event.cancelled {
            trace!(title = %event.title, "Skipping cancelled event");
            continue;
        }

        let anchor = event.start.resolve_in(floating_zone)?;
        match event.recurrence_rule.as_deref() {
            None => {
                let timestamp = anchor.with_timezone(&Utc);
                if window.contains(timestamp) {
                    occurrences.push(Occurrence::new(&event.title, timestamp));
                }
            }
            Some(rule) => {
                let replaced = event
                    .uid
                    .as_deref()
                    .and_then(|uid| overrides.get(uid))
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let suppressed = event.exception_dates.iter().chain(replaced.iter().copied());
                let expanded = expand_rule(rule, anchor, suppressed, window)?;
                trace!(
                    title = %event.title,
                    count = expanded.len(),
                    "Expanded recurring event"
                );
                occurrences.extend(
                    expanded
                        .into_iter()
                        .map(|timestamp| Occurrence::new(&event.title, timestamp)),
                );
            }
        }
    }

    occurrences.sort_by_key(|occurrence| occurrence.timestamp);

    debug!(
        events = document.events.len(),
        occurrences = occurrences.len(),
        window_start = %window.start,
        window_end = %window.end,
        "Resolved occurrences"
    );
    Ok(occurrences)
}

/// Maps each `UID` to the `RECURRENCE-ID`s of its override instances.
///
/// The values are resolved later, in the master's zone.
fn collect_overrides(document: &CalendarDocument) -> HashMap<&str, Vec<&EventStart>> {
    let mut overrides: HashMap<&str, Vec<&EventStart>> = HashMap::new();
    for event in &document.events {
        if let (Some(uid), Some(recurrence_id)) = (event.uid.as_deref(), &event.recurrence_id) {
            overrides.entry(uid).or_default().push(recurrence_id);
        }
    }
    overrides
}

/// Expands one recurrence rule inside `window`.
///
/// The rule is built from its raw text anchored at `anchor`. Suppressed
/// instants (`EXDATE` and `RECURRENCE-ID` values) without a zone of their
/// own are read in the anchor's zone.
fn expand_rule<'e>(
    rule: &str,
    anchor: DateTime<Tz>,
    suppressed: impl IntoIterator<Item = &'e EventStart>,
    window: &Window,
) -> CoreResult<Vec<DateTime<Utc>>> {
    let anchor_zone = anchor.timezone();

    let suppressed = suppressed
        .into_iter()
        .map(|value| value.resolve_in(anchor_zone).map(|dt| dt.with_timezone(&Utc)))
        .collect::<CoreResult<HashSet<_>>>()?;

    let (rule_text, until) = normalize_until(rule, anchor_zone)?;
    if until.is_some_and(|until| until < anchor.with_timezone(&Utc)) {
        trace!(rule, "UNTIL precedes DTSTART, no instances");
        return Ok(Vec::new());
    }

    let rrule = rule_text
        .parse::<RRule<Unvalidated>>()
        .map_err(|e| CoreError::rule_expansion(rule, e.to_string()))?;
    let dt_start = anchor.with_timezone(&rrule::Tz::Tz(anchor_zone));
    let rrule_set = rrule
        .build(dt_start)
        .map_err(|e| CoreError::rule_expansion(rule, e.to_string()))?;

    let result = rrule_set
        .after(window.start.with_timezone(&rrule::Tz::UTC))
        .before(window.end.with_timezone(&rrule::Tz::UTC))
        .all(u16::MAX);
    if result.limited {
        debug!(rule, "Recurrence expansion hit the instance limit");
    }

    Ok(result
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| window.contains(*dt) && !suppressed.contains(dt))
        .collect())
}

/// Rewrites the rule's `UNTIL` as a UTC instant.
///
/// A DATE `UNTIL` (all-day series) ends at the last second of that local
/// day; a local date-time is read in the anchor's zone. Returns the rule
/// text to build and the `UNTIL` instant, if the rule has one.
fn normalize_until(rule: &str, anchor_zone: Tz) -> CoreResult<(String, Option<DateTime<Utc>>)> {
    let mut until = None;
    let mut parts = Vec::new();

    for part in rule.split(';') {
        let value = part
            .split_once('=')
            .filter(|(key, _)| key.trim().eq_ignore_ascii_case("UNTIL"))
            .map(|(_, value)| value.trim());
        let Some(value) = value else {
            parts.push(part.to_string());
            continue;
        };

        let instant = until_instant(value, anchor_zone).map_err(|e| {
            CoreError::rule_expansion(rule, format!("invalid UNTIL `{value}`: {e}"))
        })?;
        parts.push(format!("UNTIL={}", instant.format(UTC_STAMP)));
        until = Some(instant);
    }

    Ok((parts.join(";"), until))
}

fn until_instant(value: &str, anchor_zone: Tz) -> CoreResult<DateTime<Utc>> {
    let local_end = match decode_value(value, None, false)? {
        EventStart::Zoned(dt) => return Ok(dt.with_timezone(&Utc)),
        EventStart::Floating(naive) => naive,
        EventStart::Date(date) => {
            date.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::seconds(1)
        }
    };
    EventStart::Floating(local_end)
        .resolve_in(anchor_zone)
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn ics_stamp(dt: DateTime<Utc>) -> String {
        dt.format("%Y%m%dT%H%M%SZ").to_string()
    }

    fn calendar(events: &[String]) -> Vec<u8> {
        let mut ics = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n");
        for event in events {
            ics.push_str(event);
        }
        ics.push_str("END:VCALENDAR\r\n");
        ics.into_bytes()
    }

    fn single(summary: &str, start: DateTime<Utc>) -> String {
        format!(
            "BEGIN:VEVENT\r\nUID:{summary}@example.com\r\nDTSTART:{}\r\nSUMMARY:{summary}\r\nEND:VEVENT\r\n",
            ics_stamp(start)
        )
    }

    fn weekly(summary: &str, start: DateTime<Utc>, exdates: &[DateTime<Utc>]) -> String {
        let mut event = format!(
            "BEGIN:VEVENT\r\nUID:{summary}@example.com\r\nDTSTART:{}\r\nRRULE:FREQ=WEEKLY\r\nSUMMARY:{summary}\r\n",
            ics_stamp(start)
        );
        for exdate in exdates {
            event.push_str(&format!("EXDATE:{}\r\n", ics_stamp(*exdate)));
        }
        event.push_str("END:VEVENT\r\n");
        event
    }

    fn now() -> DateTime<Utc> {
        utc(2025, 3, 3, 12, 0, 0)
    }

    fn titles(occurrences: &[Occurrence]) -> Vec<&str> {
        occurrences.iter().map(|o| o.title.as_str()).collect()
    }

    #[test]
    fn single_event_tomorrow() {
        let tomorrow = now() + Duration::days(1);
        let bytes = calendar(&[single("Dentist", tomorrow)]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 7), Tz::UTC).unwrap();

        assert_eq!(occurrences, vec![Occurrence::new("Dentist", tomorrow)]);
    }

    #[test]
    fn weekly_with_exception_on_second_instance() {
        let first = now() + Duration::hours(2);
        let second = first + Duration::weeks(1);
        let third = first + Duration::weeks(2);
        let bytes = calendar(&[weekly("Standup", first, &[second])]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 21), Tz::UTC).unwrap();

        let stamps: Vec<_> = occurrences.iter().map(|o| o.timestamp).collect();
        assert_eq!(stamps, vec![first, third]);
    }

    #[test]
    fn event_beyond_window_is_omitted() {
        let bytes = calendar(&[single("Conference", now() + Duration::days(30))]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 7), Tz::UTC).unwrap();

        assert!(occurrences.is_empty());
    }

    #[test]
    fn past_event_is_omitted() {
        let bytes = calendar(&[single("Yesterday", now() - Duration::days(1))]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 7), Tz::UTC).unwrap();

        assert!(occurrences.is_empty());
    }

    #[test]
    fn empty_calendar_resolves_to_nothing() {
        let bytes = calendar(&[]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 7), Tz::UTC).unwrap();

        assert!(occurrences.is_empty());
    }

    #[test]
    fn malformed_rule_is_an_error() {
        let bytes = calendar(&[format!(
            "BEGIN:VEVENT\r\nDTSTART:{}\r\nRRULE:FREQ=SOMETIMES;BYDAY=XX\r\nSUMMARY:Broken\r\nEND:VEVENT\r\n",
            ics_stamp(now())
        )]);

        let err = resolve_at(&bytes, &Window::lookahead(now(), 7), Tz::UTC).unwrap_err();

        assert!(err.is_rule_expansion(), "unexpected error: {err}");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = resolve_at(b"garbage", &Window::lookahead(now(), 7), Tz::UTC).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = Window::lookahead(now(), 7);
        let bytes = calendar(&[single("At start", window.start), single("At end", window.end)]);

        let occurrences = resolve_at(&bytes, &window, Tz::UTC).unwrap();

        assert_eq!(titles(&occurrences), vec!["At start", "At end"]);
    }

    #[test]
    fn recurring_bounds_are_inclusive() {
        // Weekly from exactly `now`; a 14 day window ends on the third instance.
        let bytes = calendar(&[weekly("Weekly", now(), &[])]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 14), Tz::UTC).unwrap();

        let stamps: Vec<_> = occurrences.iter().map(|o| o.timestamp).collect();
        assert_eq!(
            stamps,
            vec![now(), now() + Duration::weeks(1), now() + Duration::weeks(2)]
        );
    }

    #[test]
    fn zero_day_window_keeps_only_now() {
        let bytes = calendar(&[
            single("Right now", now()),
            single("A second later", now() + Duration::seconds(1)),
        ]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 0), Tz::UTC).unwrap();

        assert_eq!(titles(&occurrences), vec!["Right now"]);
    }

    #[test]
    fn anchor_in_the_past_keeps_its_phase() {
        // Started on a Tuesday months ago; instances stay on Tuesdays at 15:00.
        let anchor = utc(2024, 10, 1, 15, 0, 0);
        let bytes = calendar(&[weekly("Book club", anchor, &[])]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 14), Tz::UTC).unwrap();

        let stamps: Vec<_> = occurrences.iter().map(|o| o.timestamp).collect();
        assert_eq!(stamps, vec![utc(2025, 3, 4, 15, 0, 0), utc(2025, 3, 11, 15, 0, 0)]);
    }

    #[test]
    fn sorted_across_events() {
        let bytes = calendar(&[
            single("Later", now() + Duration::days(3)),
            weekly("Weekly", now() + Duration::days(1), &[]),
            single("Sooner", now() + Duration::hours(1)),
        ]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 10), Tz::UTC).unwrap();

        assert_eq!(titles(&occurrences), vec!["Sooner", "Weekly", "Later", "Weekly"]);
    }

    #[test]
    fn ties_keep_document_order() {
        let at = now() + Duration::days(2);
        let bytes = calendar(&[
            single("Zebra", at),
            single("Apple", at),
            weekly("Mango", at, &[]),
        ]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 3), Tz::UTC).unwrap();

        assert_eq!(titles(&occurrences), vec!["Zebra", "Apple", "Mango"]);
    }

    #[test]
    fn resolution_is_idempotent() {
        let bytes = calendar(&[
            weekly("Standup", now() + Duration::hours(3), &[]),
            single("Dentist", now() + Duration::days(2)),
        ]);
        let window = Window::lookahead(now(), 21);

        let first = resolve_at(&bytes, &window, Tz::UTC).unwrap();
        let second = resolve_at(&bytes, &window, Tz::UTC).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn zoned_anchor_follows_dst() {
        // 09:00 New York every Monday; DST starts on 2025-03-09.
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   DTSTART;TZID=America/New_York:20250224T090000\r\n\
                   RRULE:FREQ=WEEKLY;BYDAY=MO\r\n\
                   SUMMARY:Planning\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";
        let window = Window::new(utc(2025, 3, 1, 0, 0, 0), utc(2025, 3, 12, 0, 0, 0));

        let occurrences = resolve_at(ics.as_bytes(), &window, Tz::UTC).unwrap();

        let stamps: Vec<_> = occurrences.iter().map(|o| o.timestamp).collect();
        assert_eq!(stamps, vec![utc(2025, 3, 3, 14, 0, 0), utc(2025, 3, 10, 13, 0, 0)]);
    }

    #[test]
    fn naive_exdate_uses_anchor_zone() {
        // The EXDATE has no TZID; it must be read as New York time, not as
        // the display zone.
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   DTSTART;TZID=America/New_York:20250303T090000\r\n\
                   RRULE:FREQ=DAILY;COUNT=3\r\n\
                   EXDATE:20250304T090000\r\n\
                   SUMMARY:Daily sync\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";
        let window = Window::new(utc(2025, 3, 1, 0, 0, 0), utc(2025, 3, 10, 0, 0, 0));

        let occurrences =
            resolve_at(ics.as_bytes(), &window, chrono_tz::Asia::Tokyo).unwrap();

        let stamps: Vec<_> = occurrences.iter().map(|o| o.timestamp).collect();
        assert_eq!(stamps, vec![utc(2025, 3, 3, 14, 0, 0), utc(2025, 3, 5, 14, 0, 0)]);
    }

    #[test]
    fn utc_exdate_suppresses_zoned_instance() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   DTSTART;TZID=Europe/Berlin:20250303T100000\r\n\
                   RRULE:FREQ=DAILY;COUNT=3\r\n\
                   EXDATE:20250305T090000Z\r\n\
                   SUMMARY:Daily sync\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";
        let window = Window::new(utc(2025, 3, 1, 0, 0, 0), utc(2025, 3, 10, 0, 0, 0));

        let occurrences = resolve_at(ics.as_bytes(), &window, Tz::UTC).unwrap();

        let stamps: Vec<_> = occurrences.iter().map(|o| o.timestamp).collect();
        assert_eq!(stamps, vec![utc(2025, 3, 3, 9, 0, 0), utc(2025, 3, 4, 9, 0, 0)]);
    }

    #[test]
    fn floating_times_use_calendar_zone_then_display_zone() {
        let body = "BEGIN:VEVENT\r\n\
                    DTSTART:20250304T090000\r\n\
                    SUMMARY:Floating\r\n\
                    END:VEVENT\r\n\
                    END:VCALENDAR\r\n";
        let with_zone = format!("BEGIN:VCALENDAR\r\nX-WR-TIMEZONE:Europe/London\r\n{body}");
        let without_zone = format!("BEGIN:VCALENDAR\r\n{body}");
        let window = Window::lookahead(now(), 7);

        let london = resolve_at(with_zone.as_bytes(), &window, chrono_tz::America::Chicago).unwrap();
        let chicago =
            resolve_at(without_zone.as_bytes(), &window, chrono_tz::America::Chicago).unwrap();

        assert_eq!(london[0].timestamp, utc(2025, 3, 4, 9, 0, 0));
        assert_eq!(chicago[0].timestamp, utc(2025, 3, 4, 15, 0, 0));
    }

    #[test]
    fn override_replaces_generated_instance() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:standup@example.com\r\n\
                   DTSTART:20250303T150000Z\r\n\
                   RRULE:FREQ=DAILY;COUNT=3\r\n\
                   SUMMARY:Standup\r\n\
                   END:VEVENT\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:standup@example.com\r\n\
                   RECURRENCE-ID:20250304T150000Z\r\n\
                   DTSTART:20250304T170000Z\r\n\
                   SUMMARY:Standup (moved)\r\n\
                   END:VEVENT\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:standup@example.com\r\n\
                   RECURRENCE-ID:20250305T150000Z\r\n\
                   DTSTART:20250305T150000Z\r\n\
                   STATUS:CANCELLED\r\n\
                   SUMMARY:Standup\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let occurrences = resolve_at(ics.as_bytes(), &Window::lookahead(now(), 7), Tz::UTC).unwrap();

        assert_eq!(
            occurrences,
            vec![
                Occurrence::new("Standup", utc(2025, 3, 3, 15, 0, 0)),
                Occurrence::new("Standup (moved)", utc(2025, 3, 4, 17, 0, 0)),
            ]
        );
    }

    fn stamps(occurrences: &[Occurrence]) -> Vec<DateTime<Utc>> {
        occurrences.iter().map(|o| o.timestamp).collect()
    }

    #[test]
    fn all_day_series_with_date_until() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   DTSTART;VALUE=DATE:20250301\r\n\
                   RRULE:FREQ=DAILY;UNTIL=20250306\r\n\
                   SUMMARY:Book fair\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let occurrences = resolve_at(
            ics.as_bytes(),
            &Window::lookahead(now(), 7),
            chrono_tz::America::New_York,
        )
        .unwrap();

        // Local midnight in New York; the UNTIL day itself is kept.
        assert_eq!(
            stamps(&occurrences),
            vec![
                utc(2025, 3, 4, 5, 0, 0),
                utc(2025, 3, 5, 5, 0, 0),
                utc(2025, 3, 6, 5, 0, 0),
            ]
        );
    }

    #[test]
    fn floating_series_with_local_until() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   DTSTART:20250301T090000\r\n\
                   RRULE:FREQ=DAILY;UNTIL=20250306T090000\r\n\
                   SUMMARY:Morning run\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let occurrences = resolve_at(
            ics.as_bytes(),
            &Window::lookahead(now(), 7),
            chrono_tz::America::New_York,
        )
        .unwrap();

        assert_eq!(
            stamps(&occurrences),
            vec![
                utc(2025, 3, 3, 14, 0, 0),
                utc(2025, 3, 4, 14, 0, 0),
                utc(2025, 3, 5, 14, 0, 0),
                utc(2025, 3, 6, 14, 0, 0),
            ]
        );
    }

    #[test]
    fn zoned_series_with_local_until() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   DTSTART;TZID=Europe/Berlin:20250303T100000\r\n\
                   RRULE:FREQ=DAILY;UNTIL=20250305T100000\r\n\
                   SUMMARY:Daily sync\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";
        let window = Window::new(utc(2025, 3, 1, 0, 0, 0), utc(2025, 3, 10, 0, 0, 0));

        let occurrences = resolve_at(ics.as_bytes(), &window, Tz::UTC).unwrap();

        assert_eq!(
            stamps(&occurrences),
            vec![
                utc(2025, 3, 3, 9, 0, 0),
                utc(2025, 3, 4, 9, 0, 0),
                utc(2025, 3, 5, 9, 0, 0),
            ]
        );
    }

    #[test]
    fn all_day_series_with_date_exdate() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   DTSTART;VALUE=DATE:20250303\r\n\
                   RRULE:FREQ=DAILY;COUNT=7\r\n\
                   EXDATE;VALUE=DATE:20250305\r\n\
                   SUMMARY:On call\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";
        let window = Window::new(utc(2025, 3, 1, 0, 0, 0), utc(2025, 3, 12, 0, 0, 0));

        let occurrences = resolve_at(ics.as_bytes(), &window, chrono_tz::America::Chicago).unwrap();

        // Chicago midnight is 06:00 UTC until DST starts on the morning of 3/9.
        assert_eq!(
            stamps(&occurrences),
            vec![
                utc(2025, 3, 3, 6, 0, 0),
                utc(2025, 3, 4, 6, 0, 0),
                utc(2025, 3, 6, 6, 0, 0),
                utc(2025, 3, 7, 6, 0, 0),
                utc(2025, 3, 8, 6, 0, 0),
                utc(2025, 3, 9, 6, 0, 0),
            ]
        );
    }

    #[test]
    fn until_before_start_yields_nothing() {
        let bytes = calendar(&[
            "BEGIN:VEVENT\r\n\
             DTSTART:20250305T130000Z\r\n\
             RRULE:FREQ=DAILY;UNTIL=20250301T000000Z\r\n\
             SUMMARY:Never\r\n\
             END:VEVENT\r\n"
                .to_string(),
            single("Dentist", now() + Duration::days(1)),
        ]);

        let occurrences = resolve_at(&bytes, &Window::lookahead(now(), 7), Tz::UTC).unwrap();

        assert_eq!(titles(&occurrences), vec!["Dentist"]);
    }

    #[test]
    fn garbage_until_is_an_error() {
        let bytes = calendar(&[format!(
            "BEGIN:VEVENT\r\nDTSTART:{}\r\nRRULE:FREQ=DAILY;UNTIL=soon\r\nSUMMARY:Broken\r\nEND:VEVENT\r\n",
            ics_stamp(now())
        )]);

        let err = resolve_at(&bytes, &Window::lookahead(now(), 7), Tz::UTC).unwrap_err();

        assert!(err.is_rule_expansion(), "unexpected error: {err}");
        assert!(err.to_string().contains("UNTIL"));
    }

    #[test]
    fn floating_override_uses_master_zone() {
        // The RECURRENCE-ID has no TZID; it names the New York instance
        // even though floating times otherwise follow the display zone.
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:sync@example.com\r\n\
                   DTSTART;TZID=America/New_York:20250303T090000\r\n\
                   RRULE:FREQ=DAILY;COUNT=3\r\n\
                   SUMMARY:Sync\r\n\
                   END:VEVENT\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:sync@example.com\r\n\
                   RECURRENCE-ID:20250304T090000\r\n\
                   DTSTART;TZID=America/New_York:20250304T110000\r\n\
                   SUMMARY:Sync (late)\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";
        let window = Window::new(utc(2025, 3, 1, 0, 0, 0), utc(2025, 3, 10, 0, 0, 0));

        let occurrences = resolve_at(ics.as_bytes(), &window, chrono_tz::Asia::Tokyo).unwrap();

        assert_eq!(
            occurrences,
            vec![
                Occurrence::new("Sync", utc(2025, 3, 3, 14, 0, 0)),
                Occurrence::new("Sync (late)", utc(2025, 3, 4, 16, 0, 0)),
                Occurrence::new("Sync", utc(2025, 3, 5, 14, 0, 0)),
            ]
        );
    }

    mod until {
        use super::*;

        #[test]
        fn date_until_ends_with_local_day() {
            let (rule, until) =
                normalize_until("FREQ=DAILY;UNTIL=20250306", chrono_tz::America::New_York).unwrap();

            assert_eq!(rule, "FREQ=DAILY;UNTIL=20250307T045959Z");
            assert_eq!(until, Some(utc(2025, 3, 7, 4, 59, 59)));
        }

        #[test]
        fn utc_until_is_kept() {
            let (rule, until) =
                normalize_until("FREQ=WEEKLY;UNTIL=20250310T170000Z;BYDAY=MO", Tz::UTC).unwrap();

            assert_eq!(rule, "FREQ=WEEKLY;UNTIL=20250310T170000Z;BYDAY=MO");
            assert_eq!(until, Some(utc(2025, 3, 10, 17, 0, 0)));
        }

        #[test]
        fn rule_without_until_is_untouched() {
            let (rule, until) = normalize_until("FREQ=DAILY;COUNT=3", Tz::UTC).unwrap();

            assert_eq!(rule, "FREQ=DAILY;COUNT=3");
            assert!(until.is_none());
        }
    }
}
