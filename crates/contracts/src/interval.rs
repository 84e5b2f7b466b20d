//! Replay interval - inclusive [start, end] at one-second resolution

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use serde::Serialize;

use crate::ContractError;

/// Textual format of interval bounds: `YYYY-MM-DD HH:MM:SS`
pub const INTERVAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Widest accepted `end - start`, in seconds.
///
/// Sentences only carry a time of day and resolve onto the start date, so no
/// sentence can land a full day or more after `start`.
const MAX_SPAN_SECS: i64 = 24 * 60 * 60 - 1;

/// Inclusive time interval selecting which part of a log is replayed.
///
/// `total_seconds() == (end - start).num_seconds() + 1`, so an interval whose
/// bounds are equal still covers exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Interval {
    /// Create an interval from already parsed bounds.
    ///
    /// # Errors
    /// Returns `InvalidInterval` when `end` lies before `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ContractError> {
        if end < start {
            return Err(ContractError::invalid_interval(format!(
                "end {} is before start {}",
                end.format(INTERVAL_FORMAT),
                start.format(INTERVAL_FORMAT)
            )));
        }
        // Sub-second parts would make offsets ambiguous
        let start = truncate_to_second(start);
        let end = truncate_to_second(end);
        if (end - start).num_seconds() > MAX_SPAN_SECS {
            return Err(ContractError::invalid_interval(format!(
                "interval {} .. {} spans a day or more; sentences only carry a time of day",
                start.format(INTERVAL_FORMAT),
                end.format(INTERVAL_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from `YYYY-MM-DD HH:MM:SS` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ContractError> {
        let start = parse_bound("start", start)?;
        let end = parse_bound("end", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Date that every sentence time-of-day is resolved against.
    pub fn reference_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Number of one-second buckets covered by the interval.
    pub fn total_seconds(&self) -> usize {
        (self.end - self.start).num_seconds() as usize + 1
    }

    /// Whole seconds between the interval start and `ts`, if `ts` falls inside.
    pub fn offset_of(&self, ts: NaiveDateTime) -> Option<usize> {
        let offset = (truncate_to_second(ts) - self.start).num_seconds();
        if offset >= 0 && (offset as usize) < self.total_seconds() {
            Some(offset as usize)
        } else {
            None
        }
    }

    /// Wall-clock second represented by bucket `offset`.
    pub fn second_at(&self, offset: usize) -> NaiveDateTime {
        self.start + TimeDelta::seconds(offset as i64)
    }
}

fn parse_bound(which: &str, value: &str) -> Result<NaiveDateTime, ContractError> {
    NaiveDateTime::parse_from_str(value.trim(), INTERVAL_FORMAT).map_err(|e| {
        ContractError::invalid_interval(format!(
            "cannot parse interval {which} '{value}' (expected YYYY-MM-DD HH:MM:SS): {e}"
        ))
    })
}

fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, INTERVAL_FORMAT).unwrap()
    }

    #[test]
    fn test_total_seconds_is_inclusive() {
        let interval = Interval::parse("2023-09-21 07:40:56", "2023-09-21 07:59:00").unwrap();
        assert_eq!(interval.total_seconds(), 18 * 60 + 4 + 1);

        let single = Interval::parse("2023-09-21 07:40:56", "2023-09-21 07:40:56").unwrap();
        assert_eq!(single.total_seconds(), 1);
    }

    #[test]
    fn test_offset_bounds() {
        let interval = Interval::parse("2023-09-21 10:00:00", "2023-09-21 10:00:09").unwrap();
        assert_eq!(interval.offset_of(ts("2023-09-21 10:00:00")), Some(0));
        assert_eq!(interval.offset_of(ts("2023-09-21 10:00:09")), Some(9));
        assert_eq!(interval.offset_of(ts("2023-09-21 09:59:59")), None);
        assert_eq!(interval.offset_of(ts("2023-09-21 10:00:10")), None);
    }

    #[test]
    fn test_second_at() {
        let interval = Interval::parse("2023-09-21 23:59:58", "2023-09-22 00:00:01").unwrap();
        assert_eq!(interval.second_at(3), ts("2023-09-22 00:00:01"));
        assert_eq!(interval.reference_date(), ts("2023-09-21 00:00:00").date());
    }

    #[test]
    fn test_rejects_reversed_bounds() {
        let err = Interval::parse("2023-09-21 10:00:01", "2023-09-21 10:00:00").unwrap_err();
        assert!(matches!(err, ContractError::InvalidInterval { .. }));
    }

    #[test]
    fn test_span_capped_below_one_day() {
        let widest = Interval::parse("2023-09-21 07:40:56", "2023-09-22 07:40:55").unwrap();
        assert_eq!(widest.total_seconds(), 24 * 60 * 60);

        let err = Interval::parse("2023-09-21 07:40:56", "2023-09-22 07:40:56").unwrap_err();
        assert!(matches!(err, ContractError::InvalidInterval { .. }));

        let years = Interval::parse("2000-01-01 00:00:00", "2099-12-31 23:59:59").unwrap_err();
        assert!(years.to_string().contains("spans a day or more"));
    }

    #[test]
    fn test_rejects_bad_format() {
        let err = Interval::parse("2023/09/21 10:00:00", "2023-09-21 10:00:00").unwrap_err();
        assert!(err.to_string().contains("start"));
    }
}
