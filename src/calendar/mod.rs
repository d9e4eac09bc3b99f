//! Month arithmetic for recurring entries.
//!
//! A "month" is always represented by the `NaiveDate` of its first day.

use chrono::{Datelike, Months, NaiveDate};

/// First day of the month containing `date`.
pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Step `month` forward by `n` months. Saturates at the last month chrono
/// can represent.
pub(crate) fn add_months(month: NaiveDate, n: u32) -> NaiveDate {
    month_start(month)
        .checked_add_months(Months::new(n))
        .unwrap_or_else(|| month_start(NaiveDate::MAX))
}

/// Last calendar day number (28..=31) of the month containing `date`.
pub(crate) fn last_day_of_month(date: NaiveDate) -> u32 {
    let start = month_start(date);
    match start.checked_add_months(Months::new(1)) {
        Some(next) => next.pred_opt().map_or(31, |d| d.day()),
        None => 31,
    }
}

/// Concrete date an entry lands on in `month`.
///
/// The day is clamped to the month's length either way: a 31st lands on
/// the 28th or 29th in February and the 30th in April.
pub(crate) fn occurs_on(month: NaiveDate, day_of_month: u32, use_end_of_month: bool) -> NaiveDate {
    let start = month_start(month);
    let last_day = last_day_of_month(start);
    let mut day = day_of_month.max(1);
    if use_end_of_month && day > last_day {
        day = last_day;
    }
    start.with_day(day.min(last_day)).unwrap_or(start)
}

/// Every month from `from` through `to`, inclusive. Empty when `to < from`.
pub(crate) fn months_inclusive(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let end = month_start(to);
    let mut month = month_start(from);
    let mut months = Vec::new();
    while month <= end {
        months.push(month);
        let next = add_months(month, 1);
        if next == month {
            break;
        }
        month = next;
    }
    months
}

/// Parse `YYYY-MM` (or a full `YYYY-MM-DD`) into the first day of that month.
pub(crate) fn parse_month(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.len() == 7 {
        NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").ok()
    } else {
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(month_start)
    }
}

/// `YYYY-MM` label for a month.
pub(crate) fn format_month(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests;
