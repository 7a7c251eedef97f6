//! Event types.
//!
//! An [`EventDefinition`] is one `VEVENT` as it appears in the feed: a title,
//! a start, and optionally a recurrence rule with its exception dates. The
//! resolver turns definitions into [`Occurrence`]s, concrete instants inside
//! the lookahead window.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::error::{CoreError, CoreResult};
use crate::time::localize;

/// Title used when a `VEVENT` has no `SUMMARY`.
pub const UNTITLED: &str = "(untitled)";

/// A start or exception date as encoded in the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStart {
    /// An instant with a known zone (`Z` suffix or a `TZID` parameter).
    Zoned(DateTime<Tz>),
    /// A local date-time without zone information.
    Floating(NaiveDateTime),
    /// An all-day date (`VALUE=DATE`).
    Date(NaiveDate),
}

impl EventStart {
    /// Resolves this value to an instant.
    ///
    /// Floating values and all-day dates are read as wall-clock time in
    /// `zone`; all-day dates start at local midnight. Zoned values keep
    /// their own zone.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the local time cannot be represented in
    /// `zone`.
    pub fn resolve_in(&self, zone: Tz) -> CoreResult<DateTime<Tz>> {
        let naive = match self {
            Self::Zoned(dt) => return Ok(*dt),
            Self::Floating(naive) => *naive,
            Self::Date(date) => date.and_time(NaiveTime::MIN),
        };
        localize(zone, naive).ok_or_else(|| {
            CoreError::parse(format!("local time {naive} does not exist in {zone}"))
        })
    }
}

/// One `VEVENT` from the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    /// Event title (`SUMMARY`).
    pub title: String,
    /// Event start (`DTSTART`), also the recurrence anchor.
    pub start: EventStart,
    /// Raw `RRULE` value, if the event recurs.
    pub recurrence_rule: Option<String>,
    /// `EXDATE` values suppressing generated occurrences.
    pub exception_dates: Vec<EventStart>,
    /// `UID`, used to pair overrides with their recurring master.
    pub uid: Option<String>,
    /// `RECURRENCE-ID` of an override instance.
    pub recurrence_id: Option<EventStart>,
    /// `STATUS:CANCELLED`.
    pub cancelled: bool,
}

impl EventDefinition {
    /// Creates a single, non-recurring event.
    pub fn new(title: impl Into<String>, start: EventStart) -> Self {
        Self {
            title: title.into(),
            start,
            recurrence_rule: None,
            exception_dates: Vec::new(),
            uid: None,
            recurrence_id: None,
            cancelled: false,
        }
    }

    /// Builder method to set the recurrence rule.
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.recurrence_rule = Some(rule.into());
        self
    }

    /// Builder method to add an exception date.
    pub fn with_exception(mut self, exdate: EventStart) -> Self {
        self.exception_dates.push(exdate);
        self
    }

    /// Builder method to set the UID.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Builder method to mark this event as an override of one instance.
    pub fn with_recurrence_id(mut self, recurrence_id: EventStart) -> Self {
        self.recurrence_id = Some(recurrence_id);
        self
    }

    /// Builder method to mark the event as cancelled.
    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Returns true if the event has a recurrence rule.
    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }

    /// Returns true if the event replaces one instance of a recurring event.
    pub fn is_override(&self) -> bool {
        self.recurrence_id.is_some()
    }
}

/// One concrete point in time at which an event takes place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The event title.
    pub title: String,
    /// When it happens.
    pub timestamp: DateTime<Utc>,
}

impl Occurrence {
    /// Creates a new occurrence.
    pub fn new(title: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            timestamp,
        }
    }
}
