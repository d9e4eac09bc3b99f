#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;

use super::util::*;
use crate::models::{EntryKind, RecurringTemplate};

fn template() -> RecurringTemplate {
    RecurringTemplate::new(
        EntryKind::Expense,
        1,
        1,
        "Rent".into(),
        80_000,
        5,
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    )
}

// ── format_amount ─────────────────────────────────────────────

#[test]
fn test_format_amount_small() {
    assert_eq!(format_amount(0), "0");
    assert_eq!(format_amount(999), "999");
}

#[test]
fn test_format_amount_thousands() {
    assert_eq!(format_amount(80_000), "80,000");
    assert_eq!(format_amount(1_234_567), "1,234,567");
}

#[test]
fn test_format_amount_negative() {
    assert_eq!(format_amount(-1_000), "-1,000");
}

#[test]
fn test_format_amount_extremes() {
    assert_eq!(format_amount(i64::MIN), "-9,223,372,036,854,775,808");
}

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
}

#[test]
fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 5), "hell…");
}

#[test]
fn test_truncate_zero_max() {
    assert_eq!(truncate("hello", 0), "");
}

#[test]
fn test_truncate_unicode() {
    assert_eq!(truncate("家賃の支払い", 4), "家賃の…");
}

// ── describe_* ────────────────────────────────────────────────

#[test]
fn test_describe_window() {
    let mut t = template();
    assert_eq!(describe_window(&t), "2025-01..");
    t.effective_to = NaiveDate::from_ymd_opt(2025, 12, 1);
    assert_eq!(describe_window(&t), "2025-01..2025-12");
}

#[test]
fn test_describe_day() {
    let mut t = template();
    assert_eq!(describe_day(&t), "day 5");
    t.use_end_of_month = true;
    assert_eq!(describe_day(&t), "day 5 (eom)");
    t.day_of_month = 31;
    assert_eq!(describe_day(&t), "last day");
}
