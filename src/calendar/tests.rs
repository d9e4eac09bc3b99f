#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;

use super::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ── month_start / add_months ──────────────────────────────────

#[test]
fn test_month_start() {
    assert_eq!(month_start(d(2025, 3, 17)), d(2025, 3, 1));
    assert_eq!(month_start(d(2025, 3, 1)), d(2025, 3, 1));
}

#[test]
fn test_add_months_crosses_year() {
    assert_eq!(add_months(d(2025, 11, 1), 3), d(2026, 2, 1));
    assert_eq!(add_months(d(2025, 1, 1), 24), d(2027, 1, 1));
}

#[test]
fn test_add_months_normalizes_day() {
    assert_eq!(add_months(d(2025, 1, 31), 1), d(2025, 2, 1));
}

#[test]
fn test_add_months_saturates_at_last_month() {
    let last = month_start(NaiveDate::MAX);
    assert_eq!(add_months(d(2025, 1, 1), u32::MAX), last);
    assert_eq!(add_months(d(2025, 1, 1), 4_000_000_000), last);
    assert!(add_months(d(2025, 6, 1), u32::MAX) > d(2025, 6, 1));
}

#[test]
fn test_add_zero_months() {
    assert_eq!(add_months(d(2025, 6, 15), 0), d(2025, 6, 1));
}

// ── last_day_of_month ─────────────────────────────────────────

#[test]
fn test_last_day_of_month() {
    assert_eq!(last_day_of_month(d(2025, 1, 1)), 31);
    assert_eq!(last_day_of_month(d(2025, 2, 10)), 28);
    assert_eq!(last_day_of_month(d(2024, 2, 10)), 29);
    assert_eq!(last_day_of_month(d(2025, 4, 1)), 30);
    assert_eq!(last_day_of_month(d(2025, 12, 31)), 31);
}

// ── occurs_on ─────────────────────────────────────────────────

#[test]
fn test_occurs_on_end_of_month_clamps_february() {
    assert_eq!(occurs_on(d(2025, 2, 1), 31, true), d(2025, 2, 28));
    assert_eq!(occurs_on(d(2025, 1, 1), 31, true), d(2025, 1, 31));
}

#[test]
fn test_occurs_on_end_of_month_leap_year() {
    assert_eq!(occurs_on(d(2024, 2, 1), 31, true), d(2024, 2, 29));
}

#[test]
fn test_occurs_on_fixed_day() {
    assert_eq!(occurs_on(d(2025, 2, 1), 5, false), d(2025, 2, 5));
    assert_eq!(occurs_on(d(2025, 2, 1), 5, true), d(2025, 2, 5));
}

#[test]
fn test_occurs_on_clamps_without_end_of_month() {
    // Fixed day past the month end still yields a valid date.
    assert_eq!(occurs_on(d(2025, 2, 1), 30, false), d(2025, 2, 28));
    assert_eq!(occurs_on(d(2025, 4, 1), 31, false), d(2025, 4, 30));
}

#[test]
fn test_occurs_on_accepts_mid_month_input() {
    assert_eq!(occurs_on(d(2025, 6, 20), 10, false), d(2025, 6, 10));
}

// ── months_inclusive ──────────────────────────────────────────

#[test]
fn test_months_inclusive_range() {
    let months = months_inclusive(d(2025, 11, 1), d(2026, 2, 1));
    assert_eq!(
        months,
        vec![d(2025, 11, 1), d(2025, 12, 1), d(2026, 1, 1), d(2026, 2, 1)]
    );
}

#[test]
fn test_months_inclusive_single() {
    assert_eq!(months_inclusive(d(2025, 5, 9), d(2025, 5, 28)), vec![d(2025, 5, 1)]);
}

#[test]
fn test_months_inclusive_reversed_is_empty() {
    assert!(months_inclusive(d(2025, 5, 1), d(2025, 4, 1)).is_empty());
}

// ── parse_month / format_month ────────────────────────────────

#[test]
fn test_parse_month() {
    assert_eq!(parse_month("2025-03"), Some(d(2025, 3, 1)));
    assert_eq!(parse_month(" 2025-03 "), Some(d(2025, 3, 1)));
    assert_eq!(parse_month("2025-03-19"), Some(d(2025, 3, 1)));
    assert_eq!(parse_month("2025-13"), None);
    assert_eq!(parse_month("March"), None);
}

#[test]
fn test_format_month() {
    assert_eq!(format_month(d(2025, 3, 19)), "2025-03");
}
