//! Korean-locale display strings used by the dashboard frontend.

use chrono::{DateTime, Datelike, FixedOffset, SecondsFormat, Timelike, Utc};

/// `오전 9:05:03` / `오후 3:04:05`, matching the `ko-KR` time format.
pub fn korean_time(at: &DateTime<FixedOffset>) -> String {
    let (is_pm, hour) = at.hour12();
    let meridiem = if is_pm { "오후" } else { "오전" };
    format!(
        "{} {}:{:02}:{:02}",
        meridiem,
        hour,
        at.minute(),
        at.second()
    )
}

/// `2024. 1. 5.`, matching the `ko-KR` date format.
pub fn korean_date(at: &DateTime<FixedOffset>) -> String {
    format!("{}. {}. {}.", at.year(), at.month(), at.day())
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-01-05T06:04:05.000Z`.
pub fn iso_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
