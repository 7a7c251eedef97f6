//! Digest rendering.
//!
//! A digest is one line per occurrence, in the order the resolver produced:
//!
//! ```text
//! * 3/4 @ 9:00 AM, Standup
//! * 3/5 @ 2:30 PM, Dentist
//! ```
//!
//! Times are shown in a single display zone. Month, day and hour carry no
//! zero padding; minutes always have two digits.
//!
//! # Example
//!
//! ```rust
//! use calcast_core::format::DigestFormatter;
//! use calcast_core::Occurrence;
//! use chrono::{TimeZone, Utc};
//!
//! let formatter = DigestFormatter::new(chrono_tz::America::New_York);
//! let occurrence = Occurrence::new("Standup", Utc.with_ymd_and_hms(2025, 3, 4, 14, 0, 0).unwrap());
//! assert_eq!(formatter.format(&[occurrence]), "* 3/4 @ 9:00 AM, Standup\n");
//! ```

use chrono::Datelike;
use chrono_tz::Tz;

use crate::event::Occurrence;

/// Renders occurrences in a fixed display zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestFormatter {
    zone: Tz,
}

impl DigestFormatter {
    /// Creates a formatter for the given display zone.
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Returns the display zone.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Renders a single occurrence, without the line break.
    pub fn format_line(&self, occurrence: &Occurrence) -> String {
        let local = occurrence.timestamp.with_timezone(&self.zone);
        format!(
            "* {}/{} @ {}, {}",
            local.month(),
            local.day(),
            local.format("%-I:%M %p"),
            occurrence.title
        )
    }

    /// Renders the whole digest.
    ///
    /// Every line ends with `\n`. No occurrences gives an empty string.
    pub fn format(&self, occurrences: &[Occurrence]) -> String {
        occurrences
            .iter()
            .map(|occurrence| self.format_line(occurrence) + "\n")
            .collect()
    }
}

/// Shorthand for `DigestFormatter::new(zone).format(occurrences)`.
pub fn format_digest(occurrences: &[Occurrence], zone: Tz) -> String {
    DigestFormatter::new(zone).format(occurrences)
}
