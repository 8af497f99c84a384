//! Duration parsing
//!
//! Parses an extended duration grammar into a `chrono::Duration`: a
//! sequence of `<number><unit>` terms such as `1h30min`, `7d`, `1.5h` or
//! `2weeks`. Months are 30 days and years are 365 days. A bare `0` is
//! accepted; any other number needs a unit.

use chrono::Duration;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{map_res, opt, recognize, value},
    multi::many1,
    sequence::{pair, tuple},
    IResult,
};
use thiserror::Error;

const NANOS_PER_SEC: f64 = 1e9;

/// Errors from duration parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("duration {0:?} out of range")]
    OutOfRange(String),
}

/// Parse a duration string like `1h30m` or `7days`
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }
    if trimmed == "0" {
        return Ok(Duration::zero());
    }

    let terms = match many1(parse_term)(trimmed) {
        Ok(("", terms)) => terms,
        _ => return Err(DurationError::Invalid(input.to_string())),
    };

    let nanos: f64 = terms.iter().map(|(n, unit)| n * unit).sum();
    if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
        return Err(DurationError::OutOfRange(input.to_string()));
    }
    Ok(Duration::nanoseconds(nanos.round() as i64))
}

/// One `<number><unit>` term, unit expressed in nanoseconds
fn parse_term(input: &str) -> IResult<&str, (f64, f64)> {
    pair(parse_number, parse_unit)(input)
}

fn parse_number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((digit1, opt(pair(char('.'), digit1))))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Longer spellings come first so `min` is not read as `m` + `in`
fn parse_unit(input: &str) -> IResult<&str, f64> {
    const SEC: f64 = NANOS_PER_SEC;
    const MIN: f64 = 60.0 * SEC;
    const HOUR: f64 = 60.0 * MIN;
    const DAY: f64 = 24.0 * HOUR;

    alt((
        alt((
            value(1.0, tag("ns")),
            value(1e3, alt((tag("us"), tag("µs")))),
            value(1e6, tag("ms")),
            value(30.0 * DAY, alt((tag("months"), tag("month"), tag("mon")))),
            value(MIN, alt((tag("minutes"), tag("minute"), tag("min")))),
        )),
        alt((
            value(SEC, alt((tag("seconds"), tag("second"), tag("sec"), tag("s")))),
            value(MIN, tag("m")),
            value(HOUR, alt((tag("hours"), tag("hour"), tag("h")))),
            value(DAY, alt((tag("days"), tag("day"), tag("d")))),
            value(7.0 * DAY, alt((tag("weeks"), tag("week"), tag("w")))),
            value(365.0 * DAY, alt((tag("years"), tag("year"), tag("y")))),
        )),
    ))(input)
}
