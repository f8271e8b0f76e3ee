//! Calendar helpers for the integer-encoded date kind.
//!
//! Dates are stored as `i32` in YYYYMMDD form (2024-03-07 is 20240307), so
//! byte-comparing little-endian payloads is wrong but integer comparison is
//! exactly chronological. Parsing validates real calendar dates, including
//! leap-year February.

use crate::error::EngineError;
use eyre::Result;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: i32) -> i32 {
    const DAYS: [i32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        return 29;
    }
    DAYS[(month - 1) as usize]
}

/// Parses `YYYY-MM-DD` into the YYYYMMDD integer encoding, rejecting
/// calendar-invalid dates with a field-type-mismatch condition.
pub fn parse_date(text: &str) -> Result<i32> {
    let mut parts = text.trim().splitn(3, '-');
    let (year, month, day) = match (parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d)) => (
            y.parse::<i32>().ok(),
            m.parse::<i32>().ok(),
            d.parse::<i32>().ok(),
        ),
        _ => (None, None, None),
    };

    match (year, month, day) {
        (Some(y), Some(m), Some(d))
            if y >= 0 && (1..=12).contains(&m) && d >= 1 && d <= days_in_month(y, m) =>
        {
            Ok(y * 10000 + m * 100 + d)
        }
        _ => Err(EngineError::FieldTypeMismatch(format!("invalid date '{text}'")).into()),
    }
}

/// Formats a YYYYMMDD integer back to `YYYY-MM-DD`, zero-padded so the
/// textual form parses back to the same encoding.
pub fn format_date(date: i32) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date / 10000,
        date / 100 % 100,
        date % 100
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{engine_error, EngineError};

    #[test]
    fn leap_year_rules() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn february_day_counts() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 1), 31);
        assert_eq!(days_in_month(2024, 4), 30);
    }

    #[test]
    fn parses_valid_dates() {
        assert_eq!(parse_date("2024-02-29").unwrap(), 20240229);
        assert_eq!(parse_date("0001-01-01").unwrap(), 10101);
    }

    #[test]
    fn rejects_february_30_even_in_leap_years() {
        let err = parse_date("2024-02-30").unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::FieldTypeMismatch(_))
        ));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("2024-00-10").is_err());
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("20240229").is_err());
    }

    #[test]
    fn format_roundtrips() {
        assert_eq!(format_date(20240307), "2024-03-07");
        assert_eq!(parse_date(&format_date(10101)).unwrap(), 10101);
    }
}
