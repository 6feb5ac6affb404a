//! Parsing of the `expires_on` timestamp.
//!
//! The API has returned two layouts over time: a verbose one with a trailing
//! zone abbreviation (`2020-12-25 06:27:00 +0000 UTC`) and RFC3339
//! (`2020-12-25T06:27:00Z`). The verbose layout is tried first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const VERBOSE_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expires_on {value:?} matches neither the verbose nor the RFC3339 layout")]
pub struct ExpirationError {
    pub value: String,
}

/// Parse an expiration timestamp in either accepted layout
///
/// # Errors
/// Returns an error if neither layout matches
pub fn parse_expiration(value: &str) -> Result<DateTime<Utc>, ExpirationError> {
    parse_verbose(value)
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .ok_or_else(|| ExpirationError {
            value: value.to_string(),
        })
}

fn parse_verbose(value: &str) -> Option<DateTime<Utc>> {
    // Zone abbreviations are informational only; the numeric offset is authoritative.
    let (timestamp, _zone) = value.rsplit_once(' ')?;
    DateTime::parse_from_str(timestamp, VERBOSE_LAYOUT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_expiration(&value).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_verbose_layout() {
        let expected = Utc.with_ymd_and_hms(2020, 12, 25, 6, 27, 0).unwrap();
        assert_eq!(
            parse_expiration("2020-12-25 06:27:00 +0000 UTC").unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_verbose_layout_with_fraction_and_offset() {
        let expected = Utc.with_ymd_and_hms(2020, 12, 25, 3, 27, 0).unwrap();
        let parsed = parse_expiration("2020-12-25 06:27:00.123456789 +0300 MSK").unwrap();
        assert_eq!(parsed.timestamp(), expected.timestamp());
        assert_eq!(parsed.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn test_parse_rfc3339_layout() {
        let expected = Utc.with_ymd_and_hms(2020, 12, 25, 6, 27, 0).unwrap();
        assert_eq!(parse_expiration("2020-12-25T06:27:00Z").unwrap(), expected);
        assert_eq!(
            parse_expiration("2020-12-25T07:27:00+01:00").unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_rejects_other_layouts() {
        assert!(parse_expiration("").is_err());
        assert!(parse_expiration("2020-12-25").is_err());
        assert!(parse_expiration("2020-12-25 06:27:00 +0000").is_err());
        assert!(parse_expiration("Fri, 25 Dec 2020 06:27:00 GMT").is_err());
    }
}
