//! Stay-interval types with half-open date semantics
//!
//! This module provides the temporal vocabulary of the allocation engine:
//! - `StayPeriod`: a half-open `[check_in, check_out)` date range
//! - `Timezone`: property-local business-date handling

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper for property locations
///
/// Wraps chrono_tz::Tz with custom serialization support. Check-in and
/// check-out are evaluated against the property's local calendar date,
/// not the server's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s)
            .map(Timezone)
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC datetime to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }

    /// Returns the property-local calendar date for the given instant
    pub fn business_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.0).date_naive()
    }

    /// Returns the property-local calendar date for the current instant
    pub fn today(&self) -> NaiveDate {
        self.business_date(Utc::now())
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid stay range: check-in {check_in} must be before check-out {check_out}")]
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
}

/// A half-open stay interval `[check_in, check_out)`
///
/// The check-out date is exclusive: a stay ending on day D and a stay
/// beginning on day D occupy the room on disjoint nights, so same-day
/// turnover is not an overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayPeriod {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayPeriod {
    /// Creates a new stay period
    ///
    /// # Errors
    ///
    /// Returns `TemporalError::InvalidRange` when the range is inverted or
    /// zero-length. Rejected before any allocation state is touched.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, TemporalError> {
        if check_in >= check_out {
            return Err(TemporalError::InvalidRange { check_in, check_out });
        }
        Ok(Self { check_in, check_out })
    }

    /// Returns the check-in date (inclusive)
    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Returns the check-out date (exclusive)
    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Returns the number of occupied nights
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Returns true if the date falls within the occupied nights
    ///
    /// Half-open: the check-out date itself is not contained.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.check_in && date < self.check_out
    }

    /// Returns true if this period overlaps another
    ///
    /// Half-open overlap test: `a.check_in < b.check_out && b.check_in < a.check_out`.
    pub fn overlaps(&self, other: &StayPeriod) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Returns true if one period begins exactly where the other ends
    pub fn abuts(&self, other: &StayPeriod) -> bool {
        self.check_out == other.check_in || other.check_out == self.check_in
    }
}

impl fmt::Display for StayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.check_in, self.check_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_stay_period_creation() {
        let period = StayPeriod::new(date(2024, 6, 1), date(2024, 6, 3)).unwrap();
        assert_eq!(period.nights(), 2);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = StayPeriod::new(date(2024, 6, 3), date(2024, 6, 1));
        assert!(matches!(result, Err(TemporalError::InvalidRange { .. })));
    }

    #[test]
    fn test_zero_length_range_rejected() {
        let result = StayPeriod::new(date(2024, 6, 1), date(2024, 6, 1));
        assert!(matches!(result, Err(TemporalError::InvalidRange { .. })));
    }

    #[test]
    fn test_overlap() {
        let a = StayPeriod::new(date(2024, 6, 1), date(2024, 6, 3)).unwrap();
        let b = StayPeriod::new(date(2024, 6, 2), date(2024, 6, 4)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_back_to_back_does_not_overlap() {
        let a = StayPeriod::new(date(2024, 6, 1), date(2024, 6, 5)).unwrap();
        let b = StayPeriod::new(date(2024, 6, 5), date(2024, 6, 8)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.abuts(&b));
    }

    #[test]
    fn test_contains_is_half_open() {
        let period = StayPeriod::new(date(2024, 6, 1), date(2024, 6, 3)).unwrap();
        assert!(period.contains(date(2024, 6, 1)));
        assert!(period.contains(date(2024, 6, 2)));
        assert!(!period.contains(date(2024, 6, 3)));
    }

    #[test]
    fn test_business_date_crosses_midnight() {
        use chrono::TimeZone;

        // 2024-06-01 03:00 UTC is still 2024-05-31 in Honolulu.
        let tz = Timezone::new(chrono_tz::Pacific::Honolulu);
        let instant = Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap();
        assert_eq!(tz.business_date(instant), date(2024, 5, 31));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(
            a_start in 0i64..360, a_len in 1i64..30,
            b_start in 0i64..360, b_len in 1i64..30
        ) {
            let a = StayPeriod::new(day(a_start), day(a_start + a_len)).unwrap();
            let b = StayPeriod::new(day(b_start), day(b_start + b_len)).unwrap();
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn overlap_agrees_with_shared_night(
            a_start in 0i64..360, a_len in 1i64..30,
            b_start in 0i64..360, b_len in 1i64..30
        ) {
            let a = StayPeriod::new(day(a_start), day(a_start + a_len)).unwrap();
            let b = StayPeriod::new(day(b_start), day(b_start + b_len)).unwrap();

            let shared_night = (0..400).map(day).any(|d| a.contains(d) && b.contains(d));
            prop_assert_eq!(a.overlaps(&b), shared_night);
        }
    }
}
