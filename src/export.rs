use anyhow::Result;
use csv::WriterBuilder;
use std::io::Write;

use crate::calendar;
use crate::models::{Occurrence, RecurringTemplate};

const HEADER: [&str; 9] = [
    "template_id",
    "title",
    "kind",
    "amount",
    "period_month",
    "occurs_on",
    "status",
    "income_id",
    "expense_id",
];

/// Write a template's occurrence schedule as CSV. Returns the number of rows.
pub(crate) fn write_schedule<W: Write>(
    w: W,
    template: &RecurringTemplate,
    occurrences: &[Occurrence],
) -> Result<usize> {
    let mut wrt = WriterBuilder::new().from_writer(w);
    wrt.write_record(HEADER)?;

    let template_id = template.id.map(|id| id.to_string()).unwrap_or_default();
    let amount = template.amount.to_string();
    for occ in occurrences {
        let income_id = occ.income_id().map(|id| id.to_string()).unwrap_or_default();
        let expense_id = occ.expense_id().map(|id| id.to_string()).unwrap_or_default();
        wrt.write_record([
            template_id.as_str(),
            template.title.as_str(),
            template.kind.as_str(),
            amount.as_str(),
            calendar::format_month(occ.period_month).as_str(),
            occ.occurs_on.format("%Y-%m-%d").to_string().as_str(),
            occ.status.as_str(),
            income_id.as_str(),
            expense_id.as_str(),
        ])?;
    }
    wrt.flush()?;
    Ok(occurrences.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::NaiveDate;

    use super::*;
    use crate::models::{EntryKind, LedgerRef, OccurrenceStatus};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_write_schedule() {
        let mut t = RecurringTemplate::new(
            EntryKind::Expense,
            1,
            1,
            "Rent, flat 3B".into(),
            80_000,
            5,
            d(2025, 1, 1),
        );
        t.id = Some(4);
        let mut jan = Occurrence::scheduled(4, d(2025, 1, 1), d(2025, 1, 5));
        jan.status = OccurrenceStatus::Applied;
        jan.ledger_ref = Some(LedgerRef::Expense(12));
        let feb = Occurrence::scheduled(4, d(2025, 2, 1), d(2025, 2, 5));

        let mut out = Vec::new();
        let rows = write_schedule(&mut out, &t, &[jan, feb]).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "template_id,title,kind,amount,period_month,occurs_on,status,income_id,expense_id"
        );
        assert_eq!(
            lines[1],
            "4,\"Rent, flat 3B\",expense,80000,2025-01,2025-01-05,applied,,12"
        );
        assert_eq!(lines[2], "4,\"Rent, flat 3B\",expense,80000,2025-02,2025-02-05,scheduled,,");
    }

    #[test]
    fn test_write_empty_schedule_has_header() {
        let t = RecurringTemplate::new(
            EntryKind::Income,
            1,
            1,
            "Salary".into(),
            300_000,
            25,
            d(2025, 1, 1),
        );
        let mut out = Vec::new();
        assert_eq!(write_schedule(&mut out, &t, &[]).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
