//! Time formatting for generated timestamps.
//!
//! A [`TimeFormat`] is either a chrono strftime pattern or one of the two
//! epoch shorthands, `Q` (milliseconds) and `s` (seconds). Parsing falls back
//! through a fixed list of common layouts so schema authors can write
//! `2024-01-01` or an RFC 3339 timestamp regardless of the output pattern.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Output pattern used when a schema does not name one.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const FALLBACK_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.3f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Error type for time formatting and parsing.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimeFormatError {
    /// The strftime pattern contains an invalid specifier
    #[error("Invalid time format pattern: {0}")]
    InvalidPattern(String),

    /// The input matched none of the accepted layouts
    #[error("Cannot parse \"{input}\" with format \"{format}\"")]
    Unparseable { input: String, format: String },
}

/// How timestamps are rendered and parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeFormat {
    /// chrono strftime pattern, interpreted in UTC
    Pattern(String),
    /// Integer milliseconds since the epoch (`Q`)
    EpochMillis,
    /// Integer seconds since the epoch (`s`)
    EpochSeconds,
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self::Pattern(DEFAULT_TIME_FORMAT.to_string())
    }
}

impl TimeFormat {
    /// Build a format from its schema spelling, validating the pattern.
    pub fn new(spec: &str) -> Result<Self, TimeFormatError> {
        match spec {
            "Q" => Ok(Self::EpochMillis),
            "s" => Ok(Self::EpochSeconds),
            pattern => {
                if pattern.is_empty()
                    || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
                {
                    return Err(TimeFormatError::InvalidPattern(pattern.to_string()));
                }
                Ok(Self::Pattern(pattern.to_string()))
            }
        }
    }

    /// Render epoch milliseconds. Out-of-range instants fall back to the raw
    /// millisecond count.
    pub fn format(&self, epoch_ms: i64) -> String {
        match self {
            Self::EpochMillis => epoch_ms.to_string(),
            Self::EpochSeconds => epoch_ms.div_euclid(1000).to_string(),
            Self::Pattern(pattern) => match DateTime::from_timestamp_millis(epoch_ms) {
                Some(dt) => dt.format(pattern).to_string(),
                None => epoch_ms.to_string(),
            },
        }
    }

    /// The instant `format(epoch_ms)` reads back as.
    ///
    /// Formats coarser than a millisecond truncate, so a timestamp stored
    /// next to its rendered text must be snapped first. Text that does not
    /// parse back leaves the instant unchanged.
    pub fn snap(&self, epoch_ms: i64) -> i64 {
        match self {
            Self::EpochMillis => epoch_ms,
            Self::EpochSeconds => epoch_ms.div_euclid(1000) * 1000,
            Self::Pattern(_) => self.parse(&self.format(epoch_ms)).unwrap_or(epoch_ms),
        }
    }

    /// Parse a timestamp into epoch milliseconds.
    pub fn parse(&self, input: &str) -> Result<i64, TimeFormatError> {
        let input = input.trim();
        let unparseable = || TimeFormatError::Unparseable {
            input: input.to_string(),
            format: self.to_string(),
        };

        match self {
            Self::EpochMillis => input.parse::<i64>().map_err(|_| unparseable()),
            Self::EpochSeconds => input
                .parse::<i64>()
                .ok()
                .and_then(|s| s.checked_mul(1000))
                .ok_or_else(unparseable),
            Self::Pattern(pattern) => std::iter::once(pattern.as_str())
                .chain(FALLBACK_FORMATS.iter().copied())
                .find_map(|fmt| parse_with(input, fmt))
                .or_else(|| parse_rfc3339_or_date(input))
                .ok_or_else(unparseable),
        }
    }
}

impl std::fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pattern(p) => f.write_str(p),
            Self::EpochMillis => f.write_str("Q"),
            Self::EpochSeconds => f.write_str("s"),
        }
    }
}

fn parse_with(input: &str, fmt: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(input, fmt)
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn parse_rfc3339_or_date(input: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.timestamp_millis());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
}
