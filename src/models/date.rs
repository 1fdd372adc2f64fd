//! Lenient timestamp decoding for CORE API date fields.
//!
//! CORE returns dates in several shapes depending on the record's age and
//! origin. [`FlexibleDate`] accepts all of them and normalizes to UTC.
//! Empty strings and `null` decode to [`FlexibleDate::NONE`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Layout used when a date is rendered into a query clause.
pub const CALENDAR_FORMAT: &str = "%Y-%m-%d";

/// Error returned when a raw value matches none of the accepted layouts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date format: {raw}")]
pub struct DateFormatError {
    /// The offending input, unquoted
    pub raw: String,
}

/// A point in time decoded from one of the CORE date layouts, or no date at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlexibleDate(Option<DateTime<Utc>>);

impl FlexibleDate {
    /// The "no date present" sentinel
    pub const NONE: FlexibleDate = FlexibleDate(None);

    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(Some(instant))
    }

    /// Midnight UTC on the given calendar day
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Self(Some(dt.and_utc())))
    }

    /// Decode an unquoted textual timestamp.
    ///
    /// Layouts are tried in order: RFC 3339 with numeric offset, RFC 3339 with a
    /// literal `Z`, date-time without offset (read as UTC), bare date (UTC midnight).
    pub fn decode(raw: &str) -> Result<Self, DateFormatError> {
        if raw.is_empty() || raw == "null" {
            return Ok(Self::NONE);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self(Some(dt.with_timezone(&Utc))));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ") {
            return Ok(Self(Some(naive.and_utc())));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self(Some(naive.and_utc())));
        }
        if let Some(midnight) = NaiveDate::parse_from_str(raw, CALENDAR_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(Self(Some(midnight.and_utc())));
        }

        Err(DateFormatError {
            raw: raw.to_string(),
        })
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.0.map(|dt| dt.date_naive())
    }

    /// `YYYY-MM-DD`, or an empty string for the sentinel
    pub fn format_calendar(&self) -> String {
        self.0
            .map(|dt| dt.format(CALENDAR_FORMAT).to_string())
            .unwrap_or_default()
    }
}

impl From<DateTime<Utc>> for FlexibleDate {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::new(instant)
    }
}

impl fmt::Display for FlexibleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => Ok(()),
        }
    }
}

impl Serialize for FlexibleDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for FlexibleDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => FlexibleDate::decode(&raw).map_err(de::Error::custom),
            None => Ok(FlexibleDate::NONE),
        }
    }
}
