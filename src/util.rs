use std::sync::OnceLock;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime};
use regex::Regex;

fn re_schedule_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").unwrap())
}

/// True when `value` is a 24-hour `H:MM` / `HH:MM` time.
pub fn is_valid_schedule_time(value: &str) -> bool {
    re_schedule_time().is_match(value)
}

/// Parse a scheduled time, or `None` if it fails the 24-hour pattern.
pub fn parse_schedule_time(value: &str) -> Option<NaiveTime> {
    if !is_valid_schedule_time(value) {
        return None;
    }
    let (hours, minutes) = value.split_once(':')?;
    NaiveTime::from_hms_opt(hours.parse().ok()?, minutes.parse().ok()?, 0)
}

/// Trim task text, rejecting blank input.
pub fn normalize_task_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Monday of the week containing `date`. Sundays belong to the week that
/// started six days earlier.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as i64;
    date.checked_sub_signed(Duration::days(offset)).unwrap_or(date)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift a month-start date by `months` (negative goes back).
pub fn add_months(first_of_month: NaiveDate, months: i32) -> NaiveDate {
    let shift = Months::new(months.unsigned_abs());
    let shifted = if months >= 0 {
        first_of_month.checked_add_months(shift)
    } else {
        first_of_month.checked_sub_months(shift)
    };
    shifted.unwrap_or(first_of_month)
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}
