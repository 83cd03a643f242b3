use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use std::fmt::Write;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a record timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    dateparser::parse_with_timezone(text, &Utc)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Week of the year as strftime's `%W` computes it: weeks start on Monday,
/// days before the first Monday fall in week 0.
pub fn week_of_year(ts: &NaiveDateTime) -> u32 {
    let weekday = ts.weekday().num_days_from_monday();
    (ts.ordinal0() + 7 - weekday) / 7
}

/// True if chrono can render every directive in `format`
pub fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Render `ts` with a strftime pattern
pub fn format_timestamp(ts: &NaiveDateTime, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", ts.format(format)).ok()?;
    Some(out)
}
