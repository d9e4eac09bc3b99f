//! Keeps a template's occurrences in step with its effective range and the
//! rolling horizon.
//!
//! A run computes the target months, prunes occurrences that fell outside
//! them, then find-or-creates one occurrence per target month. The whole
//! run is one write transaction.

use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};

use crate::calendar;
use crate::clock::Clock;
use crate::config::MAX_HORIZON_MONTHS;
use crate::db::{self, Database};
use crate::error::{EngineError, EngineResult};
use crate::models::{Occurrence, OccurrenceStatus, RecurringTemplate};

/// What a synchronize run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SyncReport {
    pub(crate) created: usize,
    pub(crate) updated: usize,
    pub(crate) deleted: usize,
    /// Applied occurrences pruned to `canceled`.
    pub(crate) canceled: usize,
}

impl SyncReport {
    pub(crate) fn writes(&self) -> usize {
        self.created + self.updated + self.deleted + self.canceled
    }
}

/// Months a template should have occurrences for, oldest first.
///
/// Runs from `effective_from` through `effective_to` when set; otherwise
/// through `today`'s month plus `horizon_months` (capped at
/// [`MAX_HORIZON_MONTHS`]), but never ending before `effective_from`.
pub(crate) fn target_months(
    template: &RecurringTemplate,
    horizon_months: u32,
    today: NaiveDate,
) -> EngineResult<Vec<NaiveDate>> {
    let from = template
        .effective_from
        .map(calendar::month_start)
        .ok_or_else(|| EngineError::Validation("effective_from is required".into()))?;
    let end = match template.effective_to {
        Some(to) => calendar::month_start(to),
        None => {
            let horizon = horizon_months.min(MAX_HORIZON_MONTHS);
            calendar::add_months(calendar::month_start(today), horizon).max(from)
        }
    };
    Ok(calendar::months_inclusive(from, end))
}

pub(crate) struct Synchronizer<'a> {
    horizon_months: u32,
    clock: &'a dyn Clock,
}

impl<'a> Synchronizer<'a> {
    pub(crate) fn new(horizon_months: u32, clock: &'a dyn Clock) -> Self {
        Self {
            horizon_months,
            clock,
        }
    }

    /// Reconcile `template`'s occurrences in one transaction.
    pub(crate) fn call(
        &self,
        db: &mut Database,
        template: &RecurringTemplate,
    ) -> EngineResult<SyncReport> {
        let tx = db.write_txn()?;
        let report = self.sync_in(&tx, template)?;
        tx.commit()?;
        tracing::info!(
            template_id = ?template.id,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            canceled = report.canceled,
            "synchronized recurring template"
        );
        Ok(report)
    }

    /// [`Self::call`], re-run up to `attempts` times while it fails with a
    /// conflict.
    ///
    /// Within one process `call` holds the write lock for the whole run, so a
    /// conflict only arises when another process writes the same database.
    pub(crate) fn call_with_retry(
        &self,
        db: &mut Database,
        template: &RecurringTemplate,
        attempts: u32,
    ) -> EngineResult<SyncReport> {
        retry_on_conflict(attempts, || self.call(db, template))
    }

    /// Create or edit a template and synchronize it, all in one transaction.
    /// Returns the stored template.
    pub(crate) fn save_template(
        &self,
        db: &mut Database,
        template: &RecurringTemplate,
    ) -> EngineResult<(RecurringTemplate, SyncReport)> {
        let tx = db.write_txn()?;
        let id = match template.id {
            Some(id) => {
                ensure_kind_change_allowed(&tx, id, template)?;
                db::update_template(&tx, template)?;
                id
            }
            None => db::insert_template(&tx, template)?,
        };
        let stored = db::get_template(&tx, id)?.ok_or(EngineError::NotFound {
            entity: "template",
            id,
        })?;
        let report = self.sync_in(&tx, &stored)?;
        tx.commit()?;
        tracing::info!(
            template_id = id,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            canceled = report.canceled,
            "saved recurring template"
        );
        Ok((stored, report))
    }

    /// Synchronize every stored template, each in its own transaction.
    /// One template failing does not undo the others.
    pub(crate) fn synchronize_all(
        &self,
        db: &mut Database,
    ) -> EngineResult<Vec<(i64, EngineResult<SyncReport>)>> {
        let templates = db.get_templates()?;
        let mut results = Vec::with_capacity(templates.len());
        for template in &templates {
            let id = template.id.unwrap_or_default();
            let result = self.call(db, template);
            if let Err(e) = &result {
                tracing::warn!(template_id = id, error = %e, "synchronize failed");
            }
            results.push((id, result));
        }
        Ok(results)
    }

    fn sync_in(&self, conn: &Connection, template: &RecurringTemplate) -> EngineResult<SyncReport> {
        let months = target_months(template, self.horizon_months, self.clock.today())?;
        let template_id = template
            .id
            .ok_or_else(|| EngineError::Validation("template has not been saved".into()))?;
        let wanted: BTreeSet<NaiveDate> = months.iter().copied().collect();
        let mut report = SyncReport::default();

        let mut kept: HashMap<NaiveDate, Occurrence> = HashMap::new();
        for mut occ in db::occurrences_for_template(conn, template_id)? {
            if wanted.contains(&occ.period_month) {
                kept.insert(occ.period_month, occ);
                continue;
            }
            match occ.status {
                OccurrenceStatus::Applied => {
                    // Only the link is dropped. The ledger record stays; cancel
                    // is the only path that deletes one.
                    let left = occ.mark_canceled();
                    db::update_occurrence(conn, &occ)?;
                    tracing::warn!(
                        template_id,
                        period_month = %occ.period_month,
                        ledger_ref = ?left,
                        "pruned applied occurrence; ledger record left in place"
                    );
                    report.canceled += 1;
                }
                OccurrenceStatus::Scheduled => {
                    if let Some(id) = occ.id {
                        db::delete_occurrence(conn, id)?;
                    }
                    tracing::debug!(template_id, period_month = %occ.period_month, "pruned occurrence");
                    report.deleted += 1;
                }
                OccurrenceStatus::Canceled => {}
            }
        }

        for month in months {
            let occurs_on = template.occurs_on(month);
            match kept.remove(&month) {
                Some(mut occ) => {
                    if occ.occurs_on != occurs_on {
                        occ.occurs_on = occurs_on;
                        db::update_occurrence(conn, &occ)?;
                        tracing::debug!(template_id, period_month = %month, %occurs_on, "moved occurrence");
                        report.updated += 1;
                    }
                }
                None => {
                    db::insert_occurrence(conn, &Occurrence::scheduled(template_id, month, occurs_on))?;
                    report.created += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Run `op` up to `attempts` times, retrying only on a retryable error.
pub(crate) fn retry_on_conflict<T>(
    attempts: u32,
    mut op: impl FnMut() -> EngineResult<T>,
) -> EngineResult<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(attempt, error = %e, "synchronize conflicted, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Applied occurrences link a record of the template's kind. Switching the
/// kind under them would leave links of the wrong kind.
fn ensure_kind_change_allowed(
    conn: &Connection,
    template_id: i64,
    template: &RecurringTemplate,
) -> EngineResult<()> {
    let Some(current) = db::get_template(conn, template_id)? else {
        return Ok(());
    };
    if current.kind == template.kind {
        return Ok(());
    }
    let applied = db::occurrences_for_template(conn, template_id)?
        .iter()
        .filter(|o| o.is_applied())
        .count();
    if applied > 0 {
        return Err(EngineError::Validation(format!(
            "cannot change kind from {} to {} while {applied} occurrence(s) are applied",
            current.kind, template.kind
        )));
    }
    Ok(())
}
