use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::calendar;
use crate::error::{is_check_violation, is_foreign_key_violation, EngineError, EngineResult};
use crate::models::{EntryKind, LedgerEntry, LedgerRef};

const COLUMNS: &str =
    "id, account_id, user_id, category_id, title, amount, memo, date, created_at";

fn row_to_entry(kind: EntryKind) -> impl Fn(&Row<'_>) -> rusqlite::Result<LedgerEntry> {
    move |row: &Row<'_>| {
        Ok(LedgerEntry {
            id: Some(row.get(0)?),
            kind,
            account_id: row.get(1)?,
            user_id: row.get(2)?,
            category_id: row.get(3)?,
            title: row.get(4)?,
            amount: row.get(5)?,
            memo: row.get(6)?,
            date: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

/// Store an income or expense record, returning a reference to it.
///
/// Records that fail validation or a table constraint come back as
/// [`EngineError::LedgerRejected`].
pub(crate) fn insert_entry(conn: &Connection, entry: &LedgerEntry) -> EngineResult<LedgerRef> {
    entry.validate().map_err(EngineError::LedgerRejected)?;
    let result = conn.execute(
        &format!(
            "INSERT INTO {} (account_id, user_id, category_id, title, amount, memo, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            entry.kind.table()
        ),
        params![
            entry.account_id,
            entry.user_id,
            entry.category_id,
            entry.title,
            entry.amount,
            entry.memo,
            entry.date,
            entry.created_at,
        ],
    );
    match result {
        Ok(_) => Ok(LedgerRef::new(entry.kind, conn.last_insert_rowid())),
        Err(e) if is_check_violation(&e) || is_foreign_key_violation(&e) => {
            Err(EngineError::LedgerRejected(e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn get_entry(conn: &Connection, r: LedgerRef) -> rusqlite::Result<Option<LedgerEntry>> {
    let kind = r.kind();
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM {} WHERE id = ?1", kind.table()),
        params![r.id()],
        row_to_entry(kind),
    )
    .optional()
}

/// Remove a ledger record. Returns whether a row was deleted.
pub(crate) fn delete_entry(conn: &Connection, r: LedgerRef) -> rusqlite::Result<bool> {
    let removed = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", r.kind().table()),
        params![r.id()],
    )?;
    Ok(removed > 0)
}

pub(crate) fn entries_for_month(
    conn: &Connection,
    month: NaiveDate,
) -> rusqlite::Result<Vec<LedgerEntry>> {
    let from = calendar::month_start(month);
    let to = calendar::add_months(from, 1);
    let mut entries = Vec::new();
    for kind in [EntryKind::Income, EntryKind::Expense] {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM {} WHERE date >= ?1 AND date < ?2",
            kind.table()
        ))?;
        let rows = stmt.query_map(params![from, to], row_to_entry(kind))?;
        for row in rows {
            entries.push(row?);
        }
    }
    entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    Ok(entries)
}

#[cfg(test)]
pub(crate) fn count_entries(conn: &Connection, kind: EntryKind) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", kind.table()),
        [],
        |row| row.get(0),
    )
}
