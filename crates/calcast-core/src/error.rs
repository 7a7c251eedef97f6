//! Error types for the digest pipeline.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that abort a digest run.
///
/// An empty result is not an error: a calendar without upcoming events
/// yields an empty digest.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The input is not a valid iCalendar document.
    #[error("invalid calendar document: {message}")]
    Parse { message: String },

    /// A recurrence rule is present but cannot be expanded.
    #[error("invalid recurrence rule `{rule}`: {message}")]
    RuleExpansion { rule: String, message: String },

    /// A configured timezone name is not a known IANA zone.
    #[error("unknown timezone: {name}")]
    UnknownTimezone { name: String },
}

impl CoreError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a rule expansion error.
    pub fn rule_expansion(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleExpansion {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown timezone error.
    pub fn unknown_timezone(name: impl Into<String>) -> Self {
        Self::UnknownTimezone { name: name.into() }
    }

    /// Returns true if this error came from a recurrence rule.
    pub fn is_rule_expansion(&self) -> bool {
        matches!(self, Self::RuleExpansion { .. })
    }
}
