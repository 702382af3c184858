//! Conversions between calendar dates and the integer day representation
//! used everywhere inside the engine.
//!
//! All day indices are offsets from a fixed reference date, January 1, 2019.
//! The core never touches calendar dates; conversion happens here, at the
//! boundary, when input is loaded and when results are reported.

use chrono::NaiveDate;

/// Every integer day in the system is an offset from this date.
pub fn reference_zero_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).expect("reference date is valid")
}

/// Converts a calendar date to its integer reference-day offset.
pub fn to_reference_date(day: NaiveDate) -> i32 {
    (day - reference_zero_date()).num_days() as i32
}

/// Converts an integer reference-day offset back to a calendar date.
pub fn from_reference_date(day: i32) -> NaiveDate {
    reference_zero_date() + chrono::Duration::days(i64::from(day))
}

/// Parses a `YYYY-MM-DD` date string, as found in the input record.
pub fn parse_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_date_is_day_zero() {
        assert_eq!(to_reference_date(reference_zero_date()), 0);
    }

    #[test]
    fn round_trip() {
        for day in [0, 1, 365, 730, 1000] {
            assert_eq!(to_reference_date(from_reference_date(day)), day);
        }
    }

    #[test]
    fn parses_input_dates() {
        let date = parse_date("2021-05-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 5, 1).unwrap());
        assert_eq!(to_reference_date(date), 851);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date("05/01/2021").is_err());
        assert!(parse_date("not a date").is_err());
    }
}
