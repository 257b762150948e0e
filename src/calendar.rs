use chrono::{Datelike, IsoWeek, NaiveDate};
use serde::Serialize;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// ISO-8601 week number of `date`, in `1..=53`.
///
/// Dates near the year boundary belong to the week holding their Thursday, so
/// Dec 31 can be week 1 and Jan 1 can be week 52 or 53.
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// ISO year and week of `date`. Compare weeks with this, never with the bare
/// week number: week 1 of 2024 and week 1 of 2025 are different weeks.
pub fn iso_year_week(date: NaiveDate) -> IsoWeek {
    date.iso_week()
}

/// 1-based day of the year.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn total_days_in_year(date: NaiveDate) -> u32 {
    if is_leap_year(date.year()) { 366 } else { 365 }
}

/// Number of ISO weeks in `year` (52 or 53). Dec 28 always sits in the last
/// ISO week of its year.
pub fn total_weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(iso_week)
        .unwrap_or(52)
}

/// Parses a stored `YYYY-MM-DD` date. Anything else yields `None`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarPosition {
    pub date: String,
    pub iso_year: i32,
    pub week: u32,
    pub total_weeks: u32,
    pub day_of_year: u32,
    pub total_days: u32,
}

impl CalendarPosition {
    pub fn at(date: NaiveDate) -> Self {
        let iso = iso_year_week(date);
        Self {
            date: date_key(date),
            iso_year: iso.year(),
            week: iso.week(),
            total_weeks: total_weeks_in_year(iso.year()),
            day_of_year: day_of_year(date),
            total_days: total_days_in_year(date),
        }
    }
}
