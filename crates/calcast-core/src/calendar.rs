//! iCalendar parsing.
//!
//! This module reads an RFC 5545 document into a [`CalendarDocument`]: the
//! `VEVENT` components as explicit [`EventDefinition`]s plus the calendar's
//! default zone. Other component types are skipped.

use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use tracing::{debug, trace, warn};

use crate::error::{CoreError, CoreResult};
use crate::event::{EventDefinition, EventStart, UNTITLED};
use crate::time::localize;

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A parsed calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarDocument {
    /// Zone from `X-WR-TIMEZONE`, used for floating times.
    pub default_zone: Option<Tz>,
    /// Events in document order.
    pub events: Vec<EventDefinition>,
}

impl CalendarDocument {
    /// Parses raw calendar bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] if the bytes are not a valid calendar,
    /// and [`CoreError::RuleExpansion`] if an `RRULE` is present but empty.
    pub fn parse(bytes: &[u8]) -> CoreResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CoreError::parse(format!("calendar is not valid UTF-8: {e}")))?;
        Self::parse_str(text)
    }

    /// Parses calendar text.
    ///
    /// # Errors
    ///
    /// See [`CalendarDocument::parse`].
    pub fn parse_str(text: &str) -> CoreResult<Self> {
        let text = text.trim_start_matches('\u{feff}').trim_start();
        let opens_calendar = text
            .get(..15)
            .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCALENDAR"));
        if !opens_calendar {
            return Err(CoreError::parse("missing BEGIN:VCALENDAR"));
        }

        let unfolded = unfold(text);
        let calendar = read_calendar(&unfolded).map_err(|e| CoreError::parse(e.to_string()))?;

        let mut document = Self {
            default_zone: calendar_zone(&unfolded),
            events: Vec::new(),
        };
        document.walk(&calendar.components)?;

        debug!(
            events = document.events.len(),
            default_zone = ?document.default_zone,
            "Parsed calendar document"
        );
        Ok(document)
    }

    fn walk(&mut self, components: &[Component<'_>]) -> CoreResult<()> {
        for component in components {
            let name = component.name.as_str();
            if name.eq_ignore_ascii_case("VEVENT") {
                self.events.push(parse_event(component)?);
                continue;
            }
            trace!(component = name, "Skipping component");
            self.walk(&component.components)?;
        }
        Ok(())
    }
}

/// Reads one `VEVENT` into an [`EventDefinition`].
fn parse_event(component: &Component<'_>) -> CoreResult<EventDefinition> {
    let title = find_property(component, "SUMMARY")
        .map(|summary| unescape_text(summary.val.as_str()))
        .unwrap_or_else(|| UNTITLED.to_string());

    let dtstart = find_property(component, "DTSTART")
        .ok_or_else(|| CoreError::parse(format!("event `{title}` has no DTSTART")))?;
    let start = decode_single(dtstart)?;

    let mut event = EventDefinition::new(title, start);

    if let Some(rrule) = find_property(component, "RRULE") {
        let rule = rrule.val.as_str().trim();
        if rule.is_empty() {
            return Err(CoreError::rule_expansion(rule, "RRULE has no value"));
        }
        event = event.with_rule(rule);
    }

    for exdate in component
        .properties
        .iter()
        .filter(|p| p.name.as_str().eq_ignore_ascii_case("EXDATE"))
    {
        event.exception_dates.extend(decode_list(exdate)?);
    }

    if let Some(uid) = find_property(component, "UID") {
        event = event.with_uid(uid.val.as_str().trim());
    }
    if let Some(recurrence_id) = find_property(component, "RECURRENCE-ID") {
        event = event.with_recurrence_id(decode_single(recurrence_id)?);
    }
    if let Some(status) = find_property(component, "STATUS") {
        event = event.with_cancelled(status.val.as_str().trim().eq_ignore_ascii_case("CANCELLED"));
    }

    trace!(
        title = %event.title,
        start = ?event.start,
        rule = ?event.recurrence_rule,
        exdates = event.exception_dates.len(),
        "Parsed event"
    );
    Ok(event)
}

/// Reads the calendar's default zone from the `X-WR-TIMEZONE` line.
fn calendar_zone(unfolded: &str) -> Option<Tz> {
    let name = unfolded.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let key = key.split(';').next().unwrap_or(key);
        key.trim()
            .eq_ignore_ascii_case("X-WR-TIMEZONE")
            .then(|| value.trim())
    })?;
    let zone = lookup_zone(name);
    if zone.is_none() {
        warn!(zone = name, "Ignoring unknown X-WR-TIMEZONE");
    }
    zone
}

fn find_property<'c, 'a>(component: &'c Component<'a>, name: &str) -> Option<&'c Property<'a>> {
    component
        .properties
        .iter()
        .find(|p| p.name.as_str().eq_ignore_ascii_case(name))
}

fn find_parameter<'p>(property: &'p Property<'_>, key: &str) -> Option<&'p str> {
    property
        .params
        .iter()
        .find(|param| param.key.as_str().eq_ignore_ascii_case(key))
        .and_then(|param| param.val.as_ref())
        .map(|val| val.as_str().trim_matches('"'))
}

/// Looks up a `TZID` in the tz database.
///
/// Vendor-prefixed identifiers such as
/// `/mozilla.org/20050126_1/America/New_York` resolve through their trailing
/// IANA name.
fn lookup_zone(tzid: &str) -> Option<Tz> {
    let tzid = tzid.trim();
    if let Ok(tz) = tzid.parse::<Tz>() {
        return Some(tz);
    }
    tzid.match_indices('/')
        .find_map(|(idx, _)| tzid[idx + 1..].parse::<Tz>().ok())
}

/// Decodes a property holding exactly one date or date-time.
fn decode_single(property: &Property<'_>) -> CoreResult<EventStart> {
    let name = property.name.as_str();
    let mut values = decode_list(property)?.into_iter();
    match (values.next(), values.next()) {
        (Some(value), None) => Ok(value),
        (None, _) => Err(CoreError::parse(format!("{name} has no value"))),
        (Some(_), Some(_)) => Err(CoreError::parse(format!("{name} holds more than one value"))),
    }
}

/// Decodes a comma-separated list of dates or date-times.
fn decode_list(property: &Property<'_>) -> CoreResult<Vec<EventStart>> {
    let name = property.name.as_str();
    let is_date = find_parameter(property, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));
    let zone = find_parameter(property, "TZID")
        .map(|tzid| {
            lookup_zone(tzid)
                .ok_or_else(|| CoreError::parse(format!("unknown TZID `{tzid}` on {name}")))
        })
        .transpose()?;

    property
        .val
        .as_str()
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| decode_value(raw, zone, is_date))
        .collect()
}

/// Decodes one iCalendar date or date-time value.
///
/// Handles:
/// - `20250205` (date)
/// - `20250205T100000Z` (UTC)
/// - `20250205T100000` with a `TZID` (zoned)
/// - `20250205T100000` without a `TZID` (floating)
pub(crate) fn decode_value(raw: &str, zone: Option<Tz>, is_date: bool) -> CoreResult<EventStart> {
    let invalid = |e: chrono::ParseError| CoreError::parse(format!("invalid date `{raw}`: {e}"));

    if is_date || (raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit())) {
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(invalid)?;
        return Ok(EventStart::Date(date));
    }

    if let Some(utc) = raw.strip_suffix(['Z', 'z']) {
        let naive = NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT).map_err(invalid)?;
        return Ok(EventStart::Zoned(Tz::UTC.from_utc_datetime(&naive)));
    }

    let naive = NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT).map_err(invalid)?;
    match zone {
        Some(tz) => localize(tz, naive)
            .map(EventStart::Zoned)
            .ok_or_else(|| CoreError::parse(format!("local time `{raw}` does not exist in {tz}"))),
        None => Ok(EventStart::Floating(naive)),
    }
}

/// Reverses RFC 5545 TEXT escaping (`\\`, `\;`, `\,`, `\n`).
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
