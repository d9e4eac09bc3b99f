use rusqlite::{params, Connection, OptionalExtension, Row};

use super::invalid_text;
use crate::error::{is_foreign_key_violation, EngineError, EngineResult};
use crate::models::{EntryKind, RecurringTemplate};

const COLUMNS: &str = "id, kind, account_id, category_id, title, memo, amount, day_of_month,
     use_end_of_month, effective_from, effective_to, created_at";

fn row_to_template(row: &Row<'_>) -> rusqlite::Result<RecurringTemplate> {
    let kind: String = row.get(1)?;
    Ok(RecurringTemplate {
        id: Some(row.get(0)?),
        kind: EntryKind::parse(&kind).ok_or_else(|| invalid_text(1, "kind", &kind))?,
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        title: row.get(4)?,
        memo: row.get(5)?,
        amount: row.get(6)?,
        day_of_month: row.get(7)?,
        use_end_of_month: row.get(8)?,
        effective_from: Some(row.get(9)?),
        effective_to: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Validate, normalize and store a new template. Returns its id.
pub(crate) fn insert_template(conn: &Connection, template: &RecurringTemplate) -> EngineResult<i64> {
    let template = prepare(template)?;
    conn.execute(
        "INSERT INTO recurring_templates (kind, account_id, category_id, title, memo, amount,
             day_of_month, use_end_of_month, effective_from, effective_to, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            template.kind.as_str(),
            template.account_id,
            template.category_id,
            template.title,
            template.memo,
            template.amount,
            template.day_of_month,
            template.use_end_of_month,
            template.effective_from,
            template.effective_to,
            template.created_at,
        ],
    )
    .map_err(reference_error)?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_template(conn: &Connection, template: &RecurringTemplate) -> EngineResult<()> {
    let Some(id) = template.id else {
        return Err(EngineError::Validation("template has not been saved".into()));
    };
    let template = prepare(template)?;
    let changed = conn.execute(
        "UPDATE recurring_templates
         SET kind = ?1, account_id = ?2, category_id = ?3, title = ?4, memo = ?5, amount = ?6,
             day_of_month = ?7, use_end_of_month = ?8, effective_from = ?9, effective_to = ?10
         WHERE id = ?11",
        params![
            template.kind.as_str(),
            template.account_id,
            template.category_id,
            template.title,
            template.memo,
            template.amount,
            template.day_of_month,
            template.use_end_of_month,
            template.effective_from,
            template.effective_to,
            id,
        ],
    )
    .map_err(reference_error)?;
    if changed == 0 {
        return Err(EngineError::NotFound {
            entity: "template",
            id,
        });
    }
    Ok(())
}

fn reference_error(err: rusqlite::Error) -> EngineError {
    if is_foreign_key_violation(&err) {
        EngineError::Validation("unknown account or category".into())
    } else {
        err.into()
    }
}

fn prepare(template: &RecurringTemplate) -> EngineResult<RecurringTemplate> {
    template.validate().map_err(EngineError::Validation)?;
    let mut normalized = template.clone();
    normalized.normalize();
    Ok(normalized)
}

pub(crate) fn get_template(conn: &Connection, id: i64) -> rusqlite::Result<Option<RecurringTemplate>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM recurring_templates WHERE id = ?1"),
        params![id],
        row_to_template,
    )
    .optional()
}

pub(crate) fn list_templates(conn: &Connection) -> rusqlite::Result<Vec<RecurringTemplate>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM recurring_templates ORDER BY id"
    ))?;
    let rows = stmt.query_map([], row_to_template)?;
    rows.collect()
}

pub(crate) fn delete_template(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let removed = conn.execute("DELETE FROM recurring_templates WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}
