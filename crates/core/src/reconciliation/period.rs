//! Calendar month periods.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ReconciliationError;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period, validating the month.
    pub fn new(year: i32, month: u32) -> Result<Self, ReconciliationError> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(ReconciliationError::InvalidPeriod(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Parses a strict `YYYY-MM` string.
    pub fn parse(value: &str) -> Result<Self, ReconciliationError> {
        let invalid = || ReconciliationError::InvalidPeriod(value.to_string());
        let (year, month) = value.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4
            || month.len() != 2
            || !year.bytes().all(|b| b.is_ascii_digit())
            || !month.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    /// Year component.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month component (1-12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Half-open `[start, end)` window of the month in UTC.
    pub fn window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ReconciliationError> {
        let next = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        Ok((month_start(self.year, self.month)?, month_start(next.0, next.1)?))
    }

    /// `YYYYMM`, used in reconciliation numbers.
    #[must_use]
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>, ReconciliationError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ReconciliationError::InvalidPeriod(format!("{year:04}-{month:02}")))
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_and_display() {
        let period = Period::parse("2024-03").unwrap();
        assert_eq!(period.year(), 2024);
        assert_eq!(period.month(), 3);
        assert_eq!(period.to_string(), "2024-03");
        assert_eq!(period.compact(), "202403");
    }

    #[rstest]
    #[case("2024-3")]
    #[case("2024-13")]
    #[case("2024-00")]
    #[case("24-03")]
    #[case("2024/03")]
    #[case("2024-03-01")]
    #[case("+024-03")]
    #[case("")]
    fn test_parse_rejects(#[case] raw: &str) {
        assert!(matches!(
            Period::parse(raw),
            Err(ReconciliationError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_window_is_half_open_month() {
        let (start, end) = Period::parse("2024-02").unwrap().window().unwrap();
        assert_eq!(start.to_rfc3339(), "2024-02-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_window_rolls_over_year() {
        let (start, end) = Period::parse("2023-12").unwrap().window().unwrap();
        assert_eq!(start.to_rfc3339(), "2023-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_serde_as_string() {
        let period: Period = serde_json::from_str("\"2025-11\"").unwrap();
        assert_eq!(serde_json::to_string(&period).unwrap(), "\"2025-11\"");
        assert!(serde_json::from_str::<Period>("\"2025-1\"").is_err());
    }
}
