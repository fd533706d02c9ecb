//! Server-supplied event timestamps.
//!
//! [`Timestamp`] wraps a [`chrono::DateTime<FixedOffset>`] so the offset the
//! server attached to the instant survives decoding. The console clock is
//! rendered in that same offset: `2024-01-15T14:30:00Z` and
//! `2024-01-15T14:30:00+02:00` both print `14:30:00`. Nothing is converted
//! to the observer's local zone.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer};

/// ISO-8601 timestamp as sent in `event` and `stats` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// Returns the inner instant.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Wall-clock `HH:MM:SS` in the timestamp's own offset.
    #[must_use]
    pub fn clock(&self) -> String {
        self.0.format("%H:%M:%S").to_string()
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    /// Accepts RFC 3339 (`Z` or numeric offset). A timestamp without any
    /// offset is read as UTC wall-clock time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Ok(Self(dt)),
            Err(err) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| Self(naive.and_utc().fixed_offset()))
                .map_err(|_| err),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|err| serde::de::Error::custom(format!("invalid timestamp `{raw}`: {err}")))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
