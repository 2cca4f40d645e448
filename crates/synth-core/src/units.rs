//! Duration and rate parsing for schema values.
//!
//! Durations look like `"300"`, `"1.5s"`, `"30 min"`, `"4h"` or `"2 days"`
//! and resolve to milliseconds. Rates look like `"5/min"` and resolve to the
//! mean interval between events, also in milliseconds.

/// Milliseconds in one second.
pub const SECOND_MS: f64 = 1_000.0;
/// Milliseconds in one minute.
pub const MINUTE_MS: f64 = 60.0 * SECOND_MS;
/// Milliseconds in one hour.
pub const HOUR_MS: f64 = 60.0 * MINUTE_MS;
/// Milliseconds in one day.
pub const DAY_MS: f64 = 24.0 * HOUR_MS;

/// Error type for unit parsing.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UnitError {
    /// Input was empty
    #[error("Empty {0} string")]
    Empty(&'static str),

    /// Numeric part could not be parsed
    #[error("Invalid number in {kind} \"{input}\"")]
    InvalidNumber { kind: &'static str, input: String },

    /// Unit suffix is unknown
    #[error("Unknown time unit \"{unit}\" in \"{input}\"")]
    UnknownUnit { unit: String, input: String },

    /// Value was negative, zero where not allowed, or not finite
    #[error("Value out of range in \"{0}\"")]
    OutOfRange(String),
}

fn unit_ms(unit: &str) -> Option<f64> {
    match unit {
        "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => Some(1.0),
        "s" | "sec" | "secs" | "second" | "seconds" => Some(SECOND_MS),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MINUTE_MS),
        "h" | "hr" | "hour" | "hours" => Some(HOUR_MS),
        "d" | "day" | "days" => Some(DAY_MS),
        _ => None,
    }
}

/// Split `"12.5 min"` into `("12.5", "min")`.
fn split_number(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+')))
        .unwrap_or(s.len());
    let (num, rest) = s.split_at(end);
    (num.trim(), rest.trim())
}

/// Parse a duration into milliseconds. A bare number is read as seconds.
pub fn parse_duration_ms(s: &str) -> Result<f64, UnitError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(UnitError::Empty("duration"));
    }

    let (num_str, unit) = split_number(s);
    let value: f64 = num_str.parse().map_err(|_| UnitError::InvalidNumber {
        kind: "duration",
        input: s.to_string(),
    })?;

    let scale = if unit.is_empty() {
        SECOND_MS
    } else {
        unit_ms(unit).ok_or_else(|| UnitError::UnknownUnit {
            unit: unit.to_string(),
            input: s.to_string(),
        })?
    };

    let ms = value * scale;
    if !ms.is_finite() || ms < 0.0 {
        return Err(UnitError::OutOfRange(s.to_string()));
    }
    Ok(ms)
}

/// Parse a rate such as `"10/s"` or `"2 / hour"` into a mean interval in
/// milliseconds.
pub fn parse_rate_as_interval_ms(s: &str) -> Result<f64, UnitError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(UnitError::Empty("rate"));
    }

    let (count_str, unit) = match s.split_once('/') {
        Some((count, unit)) => (count.trim(), unit.trim()),
        None => (s, "s"),
    };

    let count: f64 = count_str.parse().map_err(|_| UnitError::InvalidNumber {
        kind: "rate",
        input: s.to_string(),
    })?;
    let scale = unit_ms(unit).ok_or_else(|| UnitError::UnknownUnit {
        unit: unit.to_string(),
        input: s.to_string(),
    })?;

    if !count.is_finite() || count <= 0.0 {
        return Err(UnitError::OutOfRange(s.to_string()));
    }
    Ok(scale / count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration_ms("300").unwrap(), 300_000.0);
        assert_eq!(parse_duration_ms("1ms").unwrap(), 1.0);
        assert_eq!(parse_duration_ms("30m").unwrap(), 30.0 * MINUTE_MS);
        assert_eq!(parse_duration_ms("4 h").unwrap(), 4.0 * HOUR_MS);
        assert_eq!(parse_duration_ms("1.5 days").unwrap(), 1.5 * DAY_MS);
    }

    #[test]
    fn test_parse_duration_errors() {
        assert_eq!(parse_duration_ms(""), Err(UnitError::Empty("duration")));
        assert!(matches!(
            parse_duration_ms("5 fortnights"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration_ms("abc"),
            Err(UnitError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_duration_ms("-3s"),
            Err(UnitError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate_as_interval_ms("1/min").unwrap(), MINUTE_MS);
        assert_eq!(parse_rate_as_interval_ms("10/s").unwrap(), 100.0);
        assert_eq!(parse_rate_as_interval_ms("2 / hour").unwrap(), HOUR_MS / 2.0);
        assert_eq!(parse_rate_as_interval_ms("4").unwrap(), 250.0);
    }

    #[test]
    fn test_parse_rate_rejects_zero() {
        assert!(matches!(
            parse_rate_as_interval_ms("0/s"),
            Err(UnitError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_rate_as_interval_ms("1/week"),
            Err(UnitError::UnknownUnit { .. })
        ));
    }
}
