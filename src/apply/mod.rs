//! Turns an occurrence into a ledger record and back.
//!
//! `apply` and `cancel` each run in one write transaction: the ledger record
//! and the occurrence's status change commit together or not at all.

use crate::calendar;
use crate::clock::Clock;
use crate::db::{self, Database};
use crate::error::{EngineError, EngineResult};
use crate::models::{LedgerEntry, Occurrence};

pub(crate) struct Applier<'a> {
    clock: &'a dyn Clock,
}

impl<'a> Applier<'a> {
    pub(crate) fn new(clock: &'a dyn Clock) -> Self {
        Self { clock }
    }

    /// Record the occurrence in the ledger as `applied_by`.
    ///
    /// An occurrence that is already applied is returned as is. One whose
    /// month lies outside the template's effective range is refused: it was
    /// pruned, and its earlier ledger record may still stand.
    pub(crate) fn apply(
        &self,
        db: &mut Database,
        occurrence_id: i64,
        applied_by: Option<i64>,
    ) -> EngineResult<Occurrence> {
        let tx = db.write_txn()?;
        let mut occ = db::get_occurrence(&tx, occurrence_id)?.ok_or_else(|| {
            EngineError::Applier(format!("occurrence {occurrence_id} not found"))
        })?;
        let user_id =
            applied_by.ok_or_else(|| EngineError::Applier("acting user is required".into()))?;
        if !db::user_exists(&tx, user_id)? {
            return Err(EngineError::Applier(format!("user {user_id} not found")));
        }
        if occ.is_applied() {
            tracing::debug!(occurrence_id, "occurrence already applied");
            return Ok(occ);
        }

        let template = db::get_template(&tx, occ.template_id)?.ok_or(EngineError::NotFound {
            entity: "template",
            id: occ.template_id,
        })?;
        if !template.covers(occ.period_month) {
            return Err(EngineError::Applier(format!(
                "occurrence {occurrence_id} for {} is outside the template's effective range",
                calendar::format_month(occ.period_month)
            )));
        }
        let now = self.clock.now();
        let entry = LedgerEntry::from_template(&template, user_id, occ.occurs_on, now);
        let ledger_ref = db::insert_entry(&tx, &entry)?;
        occ.mark_applied(ledger_ref, now);
        db::update_occurrence(&tx, &occ)?;
        tx.commit()?;

        tracing::info!(
            occurrence_id,
            template_id = occ.template_id,
            kind = %ledger_ref.kind(),
            ledger_id = ledger_ref.id(),
            amount = entry.amount,
            date = %occ.occurs_on,
            "applied occurrence"
        );
        Ok(occ)
    }

    /// Mark the occurrence canceled and delete the ledger record it created,
    /// if any.
    pub(crate) fn cancel(&self, db: &mut Database, occurrence_id: i64) -> EngineResult<Occurrence> {
        let tx = db.write_txn()?;
        let mut occ = db::get_occurrence(&tx, occurrence_id)?.ok_or_else(|| {
            EngineError::Applier(format!("occurrence {occurrence_id} not found"))
        })?;
        let linked = occ.mark_canceled();
        db::update_occurrence(&tx, &occ)?;
        if let Some(ledger_ref) = linked {
            if !db::delete_entry(&tx, ledger_ref)? {
                tracing::warn!(occurrence_id, ?ledger_ref, "linked ledger record was already gone");
            }
        }
        tx.commit()?;

        tracing::info!(occurrence_id, removed = ?linked, "canceled occurrence");
        Ok(occ)
    }
}

#[cfg(test)]
mod tests;
