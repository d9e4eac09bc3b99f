use crate::calendar;
use crate::models::RecurringTemplate;

/// Format an integer amount with thousand separators.
/// e.g. `1234567` → `"1,234,567"`
pub(crate) fn format_amount(val: i64) -> String {
    let digits = val.unsigned_abs().to_string();
    let with_commas: String = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < 0 {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// `2025-01..2025-12`, or `2025-01..` for open-ended templates.
pub(crate) fn describe_window(template: &RecurringTemplate) -> String {
    let from = template
        .effective_from
        .map(calendar::format_month)
        .unwrap_or_else(|| "?".into());
    let to = template
        .effective_to
        .map(calendar::format_month)
        .unwrap_or_default();
    format!("{from}..{to}")
}

/// `day 5`, or `last day` for end-of-month templates on the 31st.
pub(crate) fn describe_day(template: &RecurringTemplate) -> String {
    if template.use_end_of_month && template.day_of_month >= 31 {
        "last day".into()
    } else if template.use_end_of_month {
        format!("day {} (eom)", template.day_of_month)
    } else {
        format!("day {}", template.day_of_month)
    }
}
