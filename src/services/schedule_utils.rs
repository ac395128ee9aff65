use chrono::{
    DateTime, Datelike, Duration, FixedOffset, LocalResult, NaiveDate, NaiveTime, TimeZone,
    Timelike, Weekday,
};
use serde_json::json;

use crate::error::{AppError, AppResult};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Boundary helper for collaborators feeding RFC3339 strings. The scheduler
/// itself only ever sees parsed instants.
pub fn parse_datetime(value: &str) -> AppResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|err| {
        AppError::validation_with_details(
            "invalid datetime format",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn parse_optional_datetime(value: Option<&String>) -> AppResult<Option<DateTime<FixedOffset>>> {
    match value {
        Some(raw) => Ok(Some(parse_datetime(raw)?)),
        None => Ok(None),
    }
}

pub fn format_datetime(dt: DateTime<FixedOffset>) -> String {
    dt.to_rfc3339()
}

pub fn add_minutes(dt: DateTime<FixedOffset>, minutes: i64) -> DateTime<FixedOffset> {
    dt + Duration::minutes(minutes)
}

/// Signed minute distance from `start` to `end`.
pub fn minutes_between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> i64 {
    end.signed_duration_since(start).num_minutes()
}

pub fn overlaps(
    a_start: DateTime<FixedOffset>,
    a_end: DateTime<FixedOffset>,
    b_start: DateTime<FixedOffset>,
    b_end: DateTime<FixedOffset>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Hour of the instant as `h + m/60`, so 17:30 reads as 17.5.
pub fn decimal_hour(dt: DateTime<FixedOffset>) -> f64 {
    dt.hour() as f64 + dt.minute() as f64 / 60.0
}

fn to_naive_time(hour: f64) -> NaiveTime {
    let total_minutes = (hour * 60.0).round().clamp(0.0, (MINUTES_PER_DAY - 1) as f64) as u32;
    NaiveTime::from_hms_opt(total_minutes / 60, total_minutes % 60, 0)
        .unwrap_or(NaiveTime::MIN)
}

/// Build `date` at the given decimal hour in the ambient fixed offset.
pub fn at_hour(date: NaiveDate, offset: FixedOffset, hour: f64) -> DateTime<FixedOffset> {
    let naive = date.and_time(to_naive_time(hour));
    match offset.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _) => first,
        LocalResult::None => DateTime::from_naive_utc_and_offset(naive - offset, offset),
    }
}

pub fn start_of_day(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    at_hour(dt.date_naive(), *dt.offset(), 0.0)
}

pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

pub fn is_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri
}

/// Days from `from` to `target` as the ceiling of fractional days: a
/// deadline later tonight is 1 day away, an instant already passed is ≤ 0.
pub fn days_until(target: DateTime<FixedOffset>, from: DateTime<FixedOffset>) -> i64 {
    let minutes = minutes_between(from, target);
    let whole = minutes.div_euclid(MINUTES_PER_DAY);
    if minutes.rem_euclid(MINUTES_PER_DAY) > 0 {
        whole + 1
    } else {
        whole
    }
}

pub fn same_local_day(a: DateTime<FixedOffset>, b: DateTime<FixedOffset>) -> bool {
    a.date_naive() == b.date_naive()
}
