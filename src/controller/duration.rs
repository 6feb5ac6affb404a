//! # Duration Parsing
//!
//! `CertificateRequest.spec.duration` is serialized the way Go formats a
//! `time.Duration`, e.g. `2160h0m0s` or `1h30m`. Each component is a decimal
//! number (fractions allowed) followed by one of `ns`, `us`, `µs`, `ms`, `s`,
//! `m` or `h`, with an optional leading sign. A bare `0` is also valid.

use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<whole>\d*)(?:\.(?P<fraction>\d*))?(?P<unit>ns|us|µs|μs|ms|s|m|h)")
        .expect("Failed to compile duration regex - this should never happen")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration {value:?}: {reason}")]
pub struct DurationError {
    pub value: String,
    pub reason: &'static str,
}

fn unit_nanos(unit: &str) -> i128 {
    match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        _ => 3_600 * 1_000_000_000,
    }
}

/// Parse a Go formatted duration string
///
/// # Errors
/// Returns an error if the string is malformed or overflows
pub fn parse_duration(value: &str) -> Result<Duration, DurationError> {
    let error = |reason| DurationError {
        value: value.to_string(),
        reason,
    };

    let (negative, mut rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(error("empty duration"));
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let captures = COMPONENT
            .captures(rest)
            .ok_or_else(|| error("expected <number><unit> components"))?;
        let whole = captures.name("whole").map_or("", |m| m.as_str());
        let fraction = captures.name("fraction").map_or("", |m| m.as_str());
        if whole.is_empty() && fraction.is_empty() {
            return Err(error("missing number before unit"));
        }
        let unit = unit_nanos(captures.name("unit").map_or("h", |m| m.as_str()));

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| error("number out of range"))?
        };
        // Digits past nanosecond precision of an hour cannot change the result
        let fraction = &fraction[..fraction.len().min(18)];
        let scale = 10_i128.pow(u32::try_from(fraction.len()).unwrap_or(18));
        let fraction: i128 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| error("number out of range"))?
        };

        total = whole
            .checked_mul(unit)
            .and_then(|nanos| nanos.checked_add(fraction * unit / scale))
            .and_then(|nanos| total.checked_add(nanos))
            .filter(|nanos| *nanos <= i128::from(i64::MAX))
            .ok_or_else(|| error("duration out of range"))?;

        rest = &rest[captures.get(0).map_or(rest.len(), |m| m.end())..];
    }

    let nanos = i64::try_from(total).map_err(|_| error("duration out of range"))?;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cert_manager_defaults() {
        assert_eq!(parse_duration("2160h0m0s").unwrap(), Duration::hours(2160));
        assert_eq!(parse_duration("168h").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("1h").unwrap(), Duration::hours(1));
    }

    #[test]
    fn test_parse_mixed_units() {
        assert_eq!(
            parse_duration("1h30m15s").unwrap(),
            Duration::seconds(3600 + 30 * 60 + 15)
        );
        assert_eq!(
            parse_duration("1.5h").unwrap(),
            Duration::minutes(90)
        );
        assert_eq!(parse_duration("300ms").unwrap(), Duration::milliseconds(300));
        assert_eq!(parse_duration("2us").unwrap(), Duration::microseconds(2));
        assert_eq!(parse_duration("2µs").unwrap(), Duration::microseconds(2));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::milliseconds(500));
    }

    #[test]
    fn test_parse_sign_and_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::zero());
        assert_eq!(parse_duration("-1h").unwrap(), Duration::hours(-1));
        assert_eq!(parse_duration("+1m").unwrap(), Duration::minutes(1));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for value in ["", "-", "h", "1", "1d", "1h 30m", "abc", "1.5.h", "9999999999999999999h"] {
            assert!(parse_duration(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn test_error_names_value() {
        let err = parse_duration("1d").unwrap_err();
        assert!(err.to_string().starts_with("invalid duration \"1d\""));
    }
}
