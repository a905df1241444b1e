//! Date range and interval validation for chart queries.
//!
//! Request dates are wall-clock America/New_York, accepted as `YYYY-MM-DD`
//! or `YYYY-MM-DD HH:MM`, and converted to UTC before anything touches the
//! upstream gateway. A validated range also carries how many interval
//! buckets it spans so oversized queries are rejected up front.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;

use crate::error::ApiError;

/// Maximum number of interval buckets a single chart query may span.
pub const MAX_BUCKETS: i64 = 10_000;

/// Bar interval granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    /// Daily bars.
    Day,
    /// Hourly bars.
    Hour,
    /// Minute bars.
    Minute,
    /// Second bars.
    Second,
}

impl IntervalUnit {
    /// Parses an interval code (`d`, `h`, `m`, `s`), case-insensitively.
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s.trim().to_lowercase().as_str() {
            "d" => Ok(IntervalUnit::Day),
            "h" => Ok(IntervalUnit::Hour),
            "m" => Ok(IntervalUnit::Minute),
            "s" => Ok(IntervalUnit::Second),
            other => Err(ApiError::Format(format!("invalid interval '{other}'"))),
        }
    }

    /// The single-letter code used in gateway schema names.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            IntervalUnit::Day => "d",
            IntervalUnit::Hour => "h",
            IntervalUnit::Minute => "m",
            IntervalUnit::Second => "s",
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validated UTC query window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    /// Window start, inclusive.
    pub start: DateTime<Utc>,
    /// Window end, exclusive.
    pub end: DateTime<Utc>,
    /// Bar granularity for the query.
    pub unit: IntervalUnit,
    /// Whole interval buckets the window spans (floored).
    pub buckets: i64,
}

impl TimeRange {
    /// Validates a date range and interval from raw request strings.
    ///
    /// # Errors
    ///
    /// * [`ApiError::Format`] on unparseable dates or intervals
    /// * [`ApiError::RangeInvalid`] unless start is strictly before end
    /// * [`ApiError::RangeTooLarge`] beyond [`MAX_BUCKETS`] buckets
    pub fn validate(start: &str, end: &str, interval: &str) -> Result<Self, ApiError> {
        let (start, end) = parse_range(start, end)?;
        let unit = IntervalUnit::parse(interval)?;

        let delta = end - start;
        let buckets = match unit {
            IntervalUnit::Day => delta.num_days(),
            IntervalUnit::Hour => delta.num_hours(),
            IntervalUnit::Minute => delta.num_minutes(),
            IntervalUnit::Second => delta.num_seconds(),
        };
        if buckets > MAX_BUCKETS {
            return Err(ApiError::RangeTooLarge(format!(
                "{buckets} '{unit}' buckets exceed the limit of {MAX_BUCKETS}"
            )));
        }

        Ok(Self {
            start,
            end,
            unit,
            buckets,
        })
    }
}

/// Parses and orders a raw date pair, returning UTC instants.
///
/// Used directly by endpoints that take a range without an interval.
pub fn parse_range(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let start_local = parse_wall_clock(start)?;
    let end_local = parse_wall_clock(end)?;
    if start_local >= end_local {
        return Err(ApiError::RangeInvalid(
            "start date must be before end date".to_string(),
        ));
    }
    Ok((ny_to_utc(start_local)?, ny_to_utc(end_local)?))
}

/// Parses `YYYY-MM-DD HH:MM`, falling back to `YYYY-MM-DD` at midnight.
fn parse_wall_clock(s: &str) -> Result<NaiveDateTime, ApiError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }
    Err(ApiError::Format(format!(
        "invalid date '{s}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM"
    )))
}

/// Interprets a wall-clock time as America/New_York and converts to UTC.
///
/// Ambiguous times (DST fall-back) take the earlier offset; times inside the
/// spring-forward gap do not exist and are rejected.
fn ny_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>, ApiError> {
    New_York
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ApiError::Format(format!("nonexistent local time '{naive}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_minute_format() {
        let range = TimeRange::validate("2025-01-17 09:30", "2025-01-17 10:30", "m").unwrap();

        // 09:30 EST is 14:30 UTC.
        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 1, 17, 14, 30, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2025, 1, 17, 15, 30, 0).unwrap());
        assert_eq!(range.unit, IntervalUnit::Minute);
        assert_eq!(range.buckets, 60);
    }

    #[test]
    fn test_validate_date_only_fallback() {
        let range = TimeRange::validate("2025-07-17", "2025-07-18", "d").unwrap();

        // Midnight EDT is 04:00 UTC.
        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 7, 17, 4, 0, 0).unwrap());
        assert_eq!(range.buckets, 1);
    }

    #[test]
    fn test_validate_rejects_bad_date_format() {
        for bad in ["17-01-2025", "2025/01/17", "2025-01-17T09:30", "today"] {
            let err = TimeRange::validate(bad, "2025-01-18", "d").unwrap_err();
            assert!(matches!(err, ApiError::Format(_)), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_validate_rejects_bad_interval() {
        let err = TimeRange::validate("2025-01-17", "2025-01-18", "w").unwrap_err();
        assert!(matches!(err, ApiError::Format(_)));
    }

    #[test]
    fn test_interval_parse_is_case_insensitive() {
        assert_eq!(IntervalUnit::parse("D").unwrap(), IntervalUnit::Day);
        assert_eq!(IntervalUnit::parse(" s ").unwrap(), IntervalUnit::Second);
    }

    #[test]
    fn test_validate_rejects_reversed_and_equal_ranges() {
        let err = TimeRange::validate("2025-01-18", "2025-01-17", "d").unwrap_err();
        assert!(matches!(err, ApiError::RangeInvalid(_)));

        let err = TimeRange::validate("2025-01-17", "2025-01-17", "d").unwrap_err();
        assert!(matches!(err, ApiError::RangeInvalid(_)));
    }

    #[test]
    fn test_bucket_cap_boundary() {
        // 10,000 minutes is 6 days, 22 hours, 40 minutes: exactly at the cap.
        let range =
            TimeRange::validate("2025-01-06 00:00", "2025-01-12 22:40", "m").unwrap();
        assert_eq!(range.buckets, MAX_BUCKETS);

        // One more minute goes over.
        let err =
            TimeRange::validate("2025-01-06 00:00", "2025-01-12 22:41", "m").unwrap_err();
        assert!(matches!(err, ApiError::RangeTooLarge(_)));
    }

    #[test]
    fn test_partial_buckets_floor() {
        let range = TimeRange::validate("2025-01-17 00:00", "2025-01-17 01:30", "h").unwrap();
        assert_eq!(range.buckets, 1);
    }

    #[test]
    fn test_day_buckets_across_spring_forward() {
        // March 9, 2025 has only 23 wall-clock hours, so two calendar days
        // floor to a single whole day in UTC.
        let range = TimeRange::validate("2025-03-08", "2025-03-10", "d").unwrap();
        assert_eq!(range.buckets, 1);
    }

    #[test]
    fn test_parse_range_utc_conversion() {
        let (start, end) = parse_range("2025-01-17", "2025-01-17 09:30").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 17, 5, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 17, 14, 30, 0).unwrap());
    }
}
