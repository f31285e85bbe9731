//! Front matter dates.
//!
//! Posts and projects carry a `date` that decides their position in the
//! snapshot. A date is either a calendar day or a datetime, with or without an
//! offset, from a YAML string or a TOML date/datetime literal. Everything is
//! kept in UTC at second precision.

use anyhow::{Result, bail};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;

/// UTC datetime without timezone complexity.
///
/// Field order is significant: the derived `Ord` compares year first and
/// second last, which is chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub const fn from_ymd(year: u16, month: u8, day: u8) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Parse a front matter date.
    ///
    /// Accepts `YYYY-MM-DD`, RFC 3339 datetimes with `Z` or a `±HH:MM` offset
    /// (normalized to UTC), and local datetimes taken as UTC. The date and time
    /// may be separated by `T`, `t` or a space; fractional seconds are dropped.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Self::from_naive(date.and_time(NaiveTime::MIN));
        }

        let s = match s.as_bytes().get(10) {
            Some(b' ' | b't') => format!("{}T{}", &s[..10], &s[11..]),
            _ => s.to_owned(),
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return Self::from_naive(dt.naive_utc());
        }
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .and_then(Self::from_naive)
    }

    fn from_naive(dt: NaiveDateTime) -> Option<Self> {
        Some(Self::new(
            u16::try_from(dt.year()).ok()?,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
        ))
    }

    pub fn validate(&self) -> Result<()> {
        let Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = *self;

        if !(1..=12).contains(&month) {
            bail!("month is invalid: {month}");
        }

        let max_days = Self::days_in_month(year, month);
        if day == 0 || day > max_days {
            bail!("day is invalid: {day}");
        }
        if hour > 23 {
            bail!("hour is invalid: {hour}");
        }
        if minute > 59 {
            bail!("minute is invalid: {minute}");
        }
        if second > 59 {
            bail!("second is invalid: {second}");
        }

        Ok(())
    }

    #[inline]
    fn is_leap_year(year: u16) -> bool {
        year.is_multiple_of(4) && (!year.is_multiple_of(100) || year.is_multiple_of(400))
    }

    #[inline]
    fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    /// Midnight dates print as `YYYY-MM-DD`, everything else as RFC 3339.
    const fn has_time(&self) -> bool {
        self.hour != 0 || self.minute != 0 || self.second != 0
    }
}

impl fmt::Display for DateTimeUtc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)?;
        if self.has_time() {
            write!(f, "T{:02}:{:02}:{:02}Z", self.hour, self.minute, self.second)?;
        }
        Ok(())
    }
}

// ============================================================================
// Deserialization
// ============================================================================

impl<'de> Deserialize<'de> for DateTimeUtc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DateVisitor)
    }
}

struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
    type Value = DateTimeUtc;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a date as YYYY-MM-DD or an RFC 3339 datetime")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        DateTimeUtc::parse(v).ok_or_else(|| E::custom(format!("invalid date `{v}`")))
    }

    /// TOML date literals arrive as a single-entry map wrapping their text.
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let Some((_, text)) = map.next_entry::<String, String>()? else {
            return Err(de::Error::custom("empty date"));
        };
        self.visit_str(&text)
    }
}
