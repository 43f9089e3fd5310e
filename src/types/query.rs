//! Query parameters for movement history lookups
//!
//! Pagination and time-range types accepted by the movement log, plus RFC 3339
//! timestamp parsing for callers that receive timestamps as text.

use super::error::LedgerError;
use chrono::{DateTime, Utc};

/// Normalized pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// Normalize caller-supplied pagination values
    ///
    /// - `limit <= 0` becomes `default_limit`
    /// - `limit` above `max_limit` is clamped to `max_limit`
    /// - a negative `offset` becomes 0
    pub fn normalize(limit: i64, offset: i64, default_limit: usize, max_limit: usize) -> Self {
        let limit = if limit <= 0 {
            default_limit
        } else {
            usize::try_from(limit).unwrap_or(usize::MAX)
        };

        Page {
            limit: limit.min(max_limit),
            offset: usize::try_from(offset).unwrap_or(0),
        }
    }
}

/// Inclusive `[start, end]` window over movement creation times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting `start > end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, LedgerError> {
        if start > end {
            return Err(LedgerError::invalid_argument(format!(
                "time range start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(TimeRange { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| LedgerError::invalid_argument(format!("invalid timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case::defaults_when_zero(0, 0, 10, 0)]
    #[case::defaults_when_negative(-5, -3, 10, 0)]
    #[case::explicit(25, 40, 25, 40)]
    #[case::clamped(5000, 0, 100, 0)]
    fn test_page_normalize(
        #[case] limit: i64,
        #[case] offset: i64,
        #[case] expected_limit: usize,
        #[case] expected_offset: usize,
    ) {
        let page = Page::normalize(limit, offset, 10, 100);
        assert_eq!(page.limit, expected_limit);
        assert_eq!(page.offset, expected_offset);
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let range = TimeRange::new(start, end).unwrap();

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(end + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_time_range_rejects_inverted_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let result = TimeRange::new(start, end);
        assert!(matches!(result, Err(LedgerError::InvalidArgument { .. })));
    }

    #[rstest]
    #[case::utc("2024-05-01T10:00:00Z", Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())]
    #[case::offset("2024-05-01T12:00:00+02:00", Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())]
    fn test_parse_timestamp(#[case] input: &str, #[case] expected: DateTime<Utc>) {
        assert_eq!(parse_timestamp(input).unwrap(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::date_only("2024-05-01")]
    #[case::garbage("yesterday")]
    fn test_parse_timestamp_rejects_malformed(#[case] input: &str) {
        assert!(matches!(
            parse_timestamp(input),
            Err(LedgerError::InvalidArgument { .. })
        ));
    }
}
