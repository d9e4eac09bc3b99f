use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::invalid_text;
use crate::error::{is_unique_violation, EngineError, EngineResult};
use crate::models::{LedgerRef, Occurrence, OccurrenceStatus};

const COLUMNS: &str =
    "id, template_id, period_month, occurs_on, status, income_id, expense_id, applied_at";

fn row_to_occurrence(row: &Row<'_>) -> rusqlite::Result<Occurrence> {
    let status: String = row.get(4)?;
    Ok(Occurrence {
        id: Some(row.get(0)?),
        template_id: row.get(1)?,
        period_month: row.get(2)?,
        occurs_on: row.get(3)?,
        status: OccurrenceStatus::parse(&status)
            .ok_or_else(|| invalid_text(4, "status", &status))?,
        ledger_ref: LedgerRef::from_columns(row.get(5)?, row.get(6)?),
        applied_at: row.get(7)?,
    })
}

pub(crate) fn occurrences_for_template(
    conn: &Connection,
    template_id: i64,
) -> rusqlite::Result<Vec<Occurrence>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM recurring_occurrences WHERE template_id = ?1 ORDER BY period_month"
    ))?;
    let rows = stmt.query_map(params![template_id], row_to_occurrence)?;
    rows.collect()
}

pub(crate) fn get_occurrence(conn: &Connection, id: i64) -> rusqlite::Result<Option<Occurrence>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM recurring_occurrences WHERE id = ?1"),
        params![id],
        row_to_occurrence,
    )
    .optional()
}

pub(crate) fn scheduled_between(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> rusqlite::Result<Vec<Occurrence>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM recurring_occurrences
         WHERE status = 'scheduled' AND occurs_on >= ?1 AND occurs_on <= ?2
         ORDER BY occurs_on, template_id"
    ))?;
    let rows = stmt.query_map(params![from, to], row_to_occurrence)?;
    rows.collect()
}

/// Insert a new occurrence. A second row for the same (template, month)
/// surfaces as [`EngineError::Conflict`].
pub(crate) fn insert_occurrence(conn: &Connection, occ: &Occurrence) -> EngineResult<i64> {
    let result = conn.execute(
        "INSERT INTO recurring_occurrences
             (template_id, period_month, occurs_on, status, income_id, expense_id, applied_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            occ.template_id,
            occ.period_month,
            occ.occurs_on,
            occ.status.as_str(),
            occ.income_id(),
            occ.expense_id(),
            occ.applied_at,
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(EngineError::Conflict {
            template_id: occ.template_id,
            period_month: occ.period_month,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Persist the mutable fields of a stored occurrence.
pub(crate) fn update_occurrence(conn: &Connection, occ: &Occurrence) -> EngineResult<()> {
    let Some(id) = occ.id else {
        return Err(EngineError::Validation("occurrence has not been saved".into()));
    };
    conn.execute(
        "UPDATE recurring_occurrences
         SET occurs_on = ?1, status = ?2, income_id = ?3, expense_id = ?4, applied_at = ?5
         WHERE id = ?6",
        params![
            occ.occurs_on,
            occ.status.as_str(),
            occ.income_id(),
            occ.expense_id(),
            occ.applied_at,
            id,
        ],
    )?;
    Ok(())
}

pub(crate) fn delete_occurrence(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM recurring_occurrences WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}
