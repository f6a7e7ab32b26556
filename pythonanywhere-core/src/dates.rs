//! Date helpers for expiry handling.

use chrono::{Months, NaiveDate};

use crate::error::ClientError;

/// Textual format of the expiry date shown on the webapps page,
/// e.g. `"Friday 21 August 2026"`.
pub const EXPIRY_DATE_FORMAT: &str = "%A %d %B %Y";

/// Adds `months` calendar months to `date`, clamping the day to the end of
/// the target month (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    // NaiveDate covers a far larger range than any expiry the platform
    // hands out, so the checked add cannot fail for realistic inputs.
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// Parses the expiry date text scraped from a webapp page fragment.
pub fn parse_expiry_date(text: &str) -> Result<NaiveDate, ClientError> {
    NaiveDate::parse_from_str(text.trim(), EXPIRY_DATE_FORMAT)
        .map_err(|e| ClientError::Parse(format!("invalid expiry date {text:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_months_simple() {
        assert_eq!(add_months(date(2026, 1, 15), 3), date(2026, 4, 15));
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2026, 1, 31), 1), date(2026, 2, 28));
        assert_eq!(add_months(date(2024, 1, 31), 1), date(2024, 2, 29));
    }

    #[test]
    fn test_add_months_crosses_year() {
        assert_eq!(add_months(date(2026, 11, 30), 3), date(2027, 2, 28));
    }

    #[test]
    fn test_parse_expiry_date() {
        assert_eq!(
            parse_expiry_date("Friday 21 August 2026").unwrap(),
            date(2026, 8, 21)
        );
        assert_eq!(
            parse_expiry_date("  Monday 01 June 2026  ").unwrap(),
            date(2026, 6, 1)
        );
    }

    #[test]
    fn test_parse_expiry_date_rejects_garbage() {
        let err = parse_expiry_date("expires soon").unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[test]
    fn test_parse_expiry_date_rejects_wrong_order() {
        assert!(parse_expiry_date("21 August 2026").is_err());
    }
}
