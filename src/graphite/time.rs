//! Render time boundaries
//!
//! `from` / `until` values accepted by the render endpoint:
//!
//! - `""`: absent, the caller picks a default
//! - `-<duration>`: relative to now, e.g. `-1h`, `-7d`, `-30min`
//! - `now`
//! - base-10 Unix seconds, e.g. `1700000000`

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::query::{parse_duration, DurationError};

/// A parsed boundary; `None` means "use the caller's default"
pub type TimeBoundary = Option<DateTime<Utc>>;

/// Errors from time boundary parsing
#[derive(Error, Debug)]
pub enum TimeParseError {
    #[error("error parsing relative time {input:?}: {source}")]
    Relative {
        input: String,
        #[source]
        source: DurationError,
    },

    #[error("error parsing absolute time {input:?}: {message}")]
    Absolute { input: String, message: String },

    #[error("time {0:?} is out of range")]
    OutOfRange(String),
}

/// Parse a boundary relative to the current time
pub fn parse_time(input: &str) -> Result<TimeBoundary, TimeParseError> {
    parse_time_at(input, Utc::now())
}

/// Parse a boundary relative to `now`
pub fn parse_time_at(input: &str, now: DateTime<Utc>) -> Result<TimeBoundary, TimeParseError> {
    if input.is_empty() {
        return Ok(None);
    }

    if let Some(offset) = input.strip_prefix('-') {
        let duration = parse_duration(offset).map_err(|source| TimeParseError::Relative {
            input: input.to_string(),
            source,
        })?;
        return now
            .checked_sub_signed(duration)
            .map(Some)
            .ok_or_else(|| TimeParseError::OutOfRange(input.to_string()));
    }

    if input == "now" {
        return Ok(Some(now));
    }

    let secs = input
        .parse::<i64>()
        .map_err(|e| TimeParseError::Absolute {
            input: input.to_string(),
            message: e.to_string(),
        })?;

    DateTime::from_timestamp(secs, 0)
        .map(Some)
        .ok_or_else(|| TimeParseError::OutOfRange(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_empty_is_absent() {
        assert!(parse_time_at("", now()).unwrap().is_none());
    }

    #[test]
    fn test_unix_seconds() {
        for secs in [0i64, 1, 60, 1_234_567_890, 4_102_444_800] {
            let parsed = parse_time_at(&secs.to_string(), now()).unwrap().unwrap();
            assert_eq!(parsed.timestamp(), secs);
        }
    }

    #[test]
    fn test_now() {
        assert_eq!(parse_time_at("now", now()).unwrap(), Some(now()));

        let before = Utc::now();
        let parsed = parse_time("now").unwrap().unwrap();
        assert!((parsed - before).num_seconds().abs() <= 1);
    }

    #[test]
    fn test_relative() {
        assert_eq!(
            parse_time_at("-1h", now()).unwrap(),
            Some(now() - Duration::hours(1))
        );
        assert_eq!(
            parse_time_at("-7d", now()).unwrap(),
            Some(now() - Duration::days(7))
        );
        assert_eq!(
            parse_time_at("-30min", now()).unwrap(),
            Some(now() - Duration::minutes(30))
        );

        let expected = Utc::now() - Duration::hours(1);
        let parsed = parse_time("-1h").unwrap().unwrap();
        assert!((parsed - expected).num_seconds().abs() <= 1);
    }

    #[test]
    fn test_relative_errors() {
        assert!(matches!(
            parse_time_at("-", now()),
            Err(TimeParseError::Relative { .. })
        ));
        assert!(matches!(
            parse_time_at("-1fortnight", now()),
            Err(TimeParseError::Relative { .. })
        ));
        // negative integers are read as relative and need a unit
        assert!(matches!(
            parse_time_at("-100", now()),
            Err(TimeParseError::Relative { .. })
        ));
    }

    #[test]
    fn test_absolute_errors() {
        assert!(matches!(
            parse_time_at("not-a-time", now()),
            Err(TimeParseError::Absolute { .. })
        ));
        assert!(matches!(
            parse_time_at("12.5", now()),
            Err(TimeParseError::Absolute { .. })
        ));
        assert!(matches!(
            parse_time_at("Now", now()),
            Err(TimeParseError::Absolute { .. })
        ));
        assert!(matches!(
            parse_time_at("99999999999999999", now()),
            Err(TimeParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_error_message_names_input() {
        let err = parse_time_at("yesterday", now()).unwrap_err();
        assert!(err.to_string().contains("\"yesterday\""));
    }
}
