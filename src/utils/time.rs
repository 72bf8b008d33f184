
use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::diary::error::{DiaryError, DiaryResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Parses a `YYYY-MM-DD` date. Empty input means `today`.
pub fn parse_date(value: &str, today: NaiveDate) -> DiaryResult<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(today);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DiaryError::InvalidDate(value.into()))
}

/// Parses a 24-hour `HH:MM` time of day.
pub fn parse_time(value: &str) -> DiaryResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| DiaryError::InvalidTime(format!("{value:?} is not in HH:MM format")))
}

/// Drops seconds, the diary keeps times with minute resolution.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(time)
}

/// Formats minutes with at most 2 decimals, dropping trailing zeros. 45.0 becomes "45".
pub fn format_minutes(minutes: f64) -> String {
    let formatted = format!("{minutes:.2}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use crate::diary::error::DiaryError;

    use super::{format_minutes, parse_date, parse_time, truncate_to_minute};

    #[test]
    fn test_parse_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            parse_date("2024-01-05", today).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(parse_date("", today).unwrap(), today);
        assert_eq!(parse_date("  ", today).unwrap(), today);
        assert!(matches!(
            parse_date("2024-13-40", today),
            Err(DiaryError::InvalidDate(v)) if v == "2024-13-40"
        ));
        assert!(matches!(
            parse_date("05/01/2024", today),
            Err(DiaryError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time(" 09:30 ").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(matches!(parse_time("25:61"), Err(DiaryError::InvalidTime(_))));
        assert!(matches!(parse_time("noon"), Err(DiaryError::InvalidTime(_))));
        assert!(matches!(parse_time(""), Err(DiaryError::InvalidTime(_))));
    }

    #[test]
    fn test_truncate_to_minute() {
        assert_eq!(
            truncate_to_minute(NaiveTime::from_hms_milli_opt(9, 30, 59, 999).unwrap()),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45.), "45");
        assert_eq!(format_minutes(12.5), "12.5");
        assert_eq!(format_minutes(1. / 3.), "0.33");
        assert_eq!(format_minutes(0.), "0");
    }
}
