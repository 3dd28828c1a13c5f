//! Date parsing and the `formatted_date` helper.
//!
//! Dates are rendered in the offset they were written in; nothing is
//! converted to the local timezone. Values that don't parse render as
//! [`INVALID_DATE`] instead of failing the build.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use tera::Value;

/// What an unparseable date renders as.
pub const INVALID_DATE: &str = "Invalid Date";

/// Display format: abbreviated month, unpadded day, full year.
const DISPLAY_FORMAT: &str = "%b %-d, %Y";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

/// A value that can be interpreted as a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLike<'a> {
    Text(&'a str),
    /// Milliseconds since the Unix epoch
    EpochMillis(i64),
}

impl<'a> From<&'a str> for DateLike<'a> {
    fn from(text: &'a str) -> Self {
        DateLike::Text(text)
    }
}

impl From<i64> for DateLike<'_> {
    fn from(millis: i64) -> Self {
        DateLike::EpochMillis(millis)
    }
}

/// Parse a date string in any of the accepted formats.
///
/// Strings without an offset are taken as UTC.
pub fn parse_date(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date);
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(input) {
        return Some(date);
    }
    for format in DATETIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(input, format) {
            return Some(date.and_utc().fixed_offset());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|date| date.and_utc().fixed_offset());
        }
    }
    None
}

impl DateLike<'_> {
    pub fn parse(self) -> Option<DateTime<FixedOffset>> {
        match self {
            DateLike::Text(text) => parse_date(text),
            DateLike::EpochMillis(millis) => {
                DateTime::from_timestamp_millis(millis).map(|date| date.fixed_offset())
            }
        }
    }

    /// Interpret a template value: strings are parsed, numbers are epoch
    /// milliseconds. Anything else is not a date.
    pub fn from_value(value: &'_ Value) -> Option<DateLike<'_>> {
        match value {
            Value::String(text) => Some(DateLike::Text(text)),
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f as i64))
                .map(DateLike::EpochMillis),
            _ => None,
        }
    }
}

/// Render a date as `"Jan 5, 2024"`, or [`INVALID_DATE`].
pub fn format_date<'a>(input: impl Into<DateLike<'a>>) -> String {
    input
        .into()
        .parse()
        .map(|date| date.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// The `formatted_date` template helper.
pub fn formatted_date(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let formatted = match DateLike::from_value(value) {
        Some(date) => format_date(date),
        None => INVALID_DATE.to_string(),
    };
    Ok(Value::String(formatted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_iso_date() {
        assert_eq!(format_date("2024-01-05"), "Jan 5, 2024");
        assert_eq!(format_date("2023-12-25"), "Dec 25, 2023");
    }

    #[test]
    fn test_format_keeps_written_offset() {
        // Late evening in UTC-5 is the next day in UTC; the written day wins.
        assert_eq!(format_date("2024-03-09T23:30:00-05:00"), "Mar 9, 2024");
        assert_eq!(format_date("2024-03-09T23:30:00Z"), "Mar 9, 2024");
    }

    #[test]
    fn test_format_other_layouts() {
        assert_eq!(format_date("2024-07-04 08:15:00"), "Jul 4, 2024");
        assert_eq!(format_date("2024/07/04"), "Jul 4, 2024");
        assert_eq!(format_date("July 4, 2024"), "Jul 4, 2024");
        assert_eq!(format_date("Thu, 04 Jul 2024 10:00:00 +0000"), "Jul 4, 2024");
    }

    #[test]
    fn test_format_epoch_millis() {
        assert_eq!(format_date(0_i64), "Jan 1, 1970");
        assert_eq!(format_date(1_704_412_800_000_i64), "Jan 5, 2024");
    }

    #[test]
    fn test_invalid_input_yields_sentinel() {
        assert_eq!(format_date("not a date"), INVALID_DATE);
        assert_eq!(format_date(""), INVALID_DATE);
        assert_eq!(format_date("2024-02-30"), INVALID_DATE);
    }

    #[test]
    fn test_output_shape() {
        let pattern = regex::Regex::new(r"^[A-Z][a-z]{2} \d{1,2}, \d{4}$").unwrap();
        for input in ["2020-02-29", "1999-10-01T12:00:00Z", "2031-05-17 00:00"] {
            assert!(pattern.is_match(&format_date(input)), "{input}");
        }
    }

    #[test]
    fn test_helper_on_template_values() {
        let args = HashMap::new();
        assert_eq!(
            formatted_date(&json!("2024-01-05"), &args).unwrap(),
            json!("Jan 5, 2024")
        );
        assert_eq!(
            formatted_date(&json!(1_704_412_800_000_i64), &args).unwrap(),
            json!("Jan 5, 2024")
        );
        assert_eq!(formatted_date(&json!(null), &args).unwrap(), json!(INVALID_DATE));
        assert_eq!(formatted_date(&json!(["x"]), &args).unwrap(), json!(INVALID_DATE));
    }
}
