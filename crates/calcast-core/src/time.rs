//! Time types for the digest pipeline.
//!
//! This module provides [`Window`], the closed lookahead interval a run
//! collects occurrences from, and helpers for resolving IANA zone names and
//! local wall-clock times.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CoreError, CoreResult};

/// The lookahead window of a single run.
///
/// Represents a closed interval `[start, end]` in UTC. Both bounds are
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Start of the window (inclusive), normally the run time.
    pub start: DateTime<Utc>,
    /// End of the window (inclusive).
    pub end: DateTime<Utc>,
}

impl Window {
    /// Creates a new window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "Window start must be <= end");
        Self { start, end }
    }

    /// Creates a window from `now` extending `days` whole days.
    pub fn lookahead(now: DateTime<Utc>, days: u32) -> Self {
        Self::new(now, now + Duration::days(i64::from(days)))
    }

    /// Creates a window starting at the current instant.
    ///
    /// The clock is sampled once; every event of a run is checked against
    /// the same bounds.
    pub fn from_now(days: u32) -> Self {
        Self::lookahead(Utc::now(), days)
    }

    /// Checks if an instant falls within this window, bounds included.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt <= self.end
    }
}

/// Parses an IANA timezone name such as `America/New_York`.
///
/// # Errors
///
/// Returns [`CoreError::UnknownTimezone`] if the name is not in the tz
/// database.
pub fn parse_timezone(name: &str) -> CoreResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| CoreError::unknown_timezone(name))
}

/// Resolves a wall-clock time in the given zone.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times in
/// a DST gap are shifted forward by the gap, which is how RFC 5545 reads
/// nonexistent local times.
pub fn localize(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest(),
    }
}
