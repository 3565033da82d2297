//! Calendar helpers for day-of-year climatology lookups and date ranges.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ReefError, ReefResult};

/// Highest day-of-year the pipeline distinguishes.
///
/// Day 366 is served by the same daily baseline raster in leap and non-leap
/// years; there is no separate Feb-29 handling.
pub const MAX_DAY_OF_YEAR: u16 = 366;

/// Day-of-year for a date, clamped to `[1, 366]`.
pub fn day_of_year(date: NaiveDate) -> u16 {
    clamp_day_of_year(date.ordinal())
}

/// Clamp an ordinal day to the supported `[1, 366]` range.
///
/// Out-of-range ordinals can only arise from calendar edge cases, never
/// corrupt input, so they clamp rather than fail.
pub fn clamp_day_of_year(ordinal: u32) -> u16 {
    ordinal.clamp(1, MAX_DAY_OF_YEAR as u32) as u16
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> ReefResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ReefError::InvalidDate(s.to_string()))
}

/// Compact `YYYYMMDD` form used in export dataset paths.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// An inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ReefResult<Self> {
        if start > end {
            return Err(ReefError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The full calendar year.
    pub fn year(year: i32) -> ReefResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| ReefError::InvalidDate(format!("{year}-01-01")))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| ReefError::InvalidDate(format!("{year}-12-31")))?;
        Ok(Self { start, end })
    }

    /// One calendar month.
    pub fn month(year: i32, month: u32) -> ReefResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| ReefError::InvalidDate(format!("{year}-{month:02}-01")))?;
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| ReefError::InvalidDate(format!("month after {year}-{month:02}")))?;
        Ok(Self {
            start,
            end: first_of_next - Duration::days(1),
        })
    }

    /// Extend the range backwards by `days` (the DHW lookback buffer).
    pub fn with_lookback(&self, days: u32) -> Self {
        Self {
            start: self.start - Duration::days(days as i64),
            end: self.end,
        }
    }

    /// Number of days in the range, inclusive.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Check whether a date falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Iterate every date in the range in order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |d| {
            let next = *d + Duration::days(1);
            (next <= end).then_some(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_year_leap_and_non_leap() {
        let leap = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let non_leap = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(day_of_year(leap), 366);
        assert_eq!(day_of_year(non_leap), 365);
    }

    #[test]
    fn test_clamp_day_of_year() {
        assert_eq!(clamp_day_of_year(0), 1);
        assert_eq!(clamp_day_of_year(180), 180);
        assert_eq!(clamp_day_of_year(400), 366);
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-02-29").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("20240101").is_err());
    }

    #[test]
    fn test_month_range_boundaries() {
        let feb = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let dec = DateRange::month(2023, 12).unwrap();
        assert_eq!(dec.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_range_iteration() {
        let range = DateRange::month(2023, 11).unwrap();
        let days: Vec<_> = range.iter().collect();
        assert_eq!(days.len(), 30);
        assert_eq!(days[0], range.start);
        assert_eq!(days[29], range.end);
        assert_eq!(range.num_days(), 30);
    }

    #[test]
    fn test_rejects_reversed_range() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(DateRange::new(start, end).is_err());
    }

    #[test]
    fn test_lookback_extension() {
        let range = DateRange::single(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        let buffered = range.with_lookback(84);
        assert_eq!(buffered.num_days(), 85);
        assert_eq!(buffered.end, range.end);
        assert_eq!(
            buffered.start,
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
    }

    #[test]
    fn test_compact_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(compact_date(date), "20240105");
    }
}
