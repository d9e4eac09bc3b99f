#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, TimeZone, Utc};

use super::*;
use crate::clock::FixedClock;
use crate::error::EngineError;
use crate::models::{
    Account, AccountType, EntryKind, LedgerRef, OccurrenceStatus, RecurringTemplate, User,
};
use crate::sync::Synchronizer;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn clock() -> FixedClock {
    FixedClock {
        today: d(2025, 1, 10),
        now: Utc.with_ymd_and_hms(2025, 1, 10, 8, 30, 0).unwrap(),
    }
}

struct Fixture {
    db: Database,
    user_id: i64,
    template_id: i64,
}

/// One template with occurrences for Jan..Mar 2025.
fn setup(kind: EntryKind) -> Fixture {
    let mut db = Database::open_in_memory().unwrap();
    let account_id = db
        .insert_account(&Account::new("Main".into(), AccountType::Checking))
        .unwrap();
    let category_id = db.get_categories().unwrap()[0].id.unwrap();
    let user_id = db.insert_user(&User::new("alice".into())).unwrap();

    let mut t = RecurringTemplate::new(
        kind,
        account_id,
        category_id,
        "Rent".into(),
        80_000,
        5,
        d(2025, 1, 1),
    );
    t.memo = "flat 3B".into();
    t.effective_to = Some(d(2025, 3, 1));
    let clock = clock();
    let (stored, _) = Synchronizer::new(24, &clock).save_template(&mut db, &t).unwrap();
    Fixture {
        db,
        user_id,
        template_id: stored.id.unwrap(),
    }
}

fn first_occurrence(f: &Fixture) -> Occurrence {
    f.db.get_occurrences(f.template_id).unwrap()[0].clone()
}

// ── apply ─────────────────────────────────────────────────────

#[test]
fn test_apply_creates_expense_record() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let occ = first_occurrence(&f);

    let applied = Applier::new(&clock)
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap();
    assert_eq!(applied.status, OccurrenceStatus::Applied);
    assert_eq!(applied.applied_at, Some(clock.now));
    assert!(applied.income_id().is_none());
    let expense_id = applied.expense_id().unwrap();

    let entry = f
        .db
        .get_ledger_entry(LedgerRef::Expense(expense_id))
        .unwrap()
        .unwrap();
    assert_eq!(entry.kind, EntryKind::Expense);
    assert_eq!(entry.title, "Rent");
    assert_eq!(entry.memo, "flat 3B");
    assert_eq!(entry.amount, 80_000);
    assert_eq!(entry.date, d(2025, 1, 5));
    assert_eq!(entry.user_id, f.user_id);

    let stored = f.db.get_occurrence(occ.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored, applied);
}

#[test]
fn test_apply_income_template_links_income() {
    let mut f = setup(EntryKind::Income);
    let clock = clock();
    let occ = first_occurrence(&f);

    let applied = Applier::new(&clock)
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap();
    assert!(matches!(applied.ledger_ref, Some(LedgerRef::Income(_))));
    assert_eq!(f.db.count_ledger_entries(EntryKind::Income).unwrap(), 1);
    assert_eq!(f.db.count_ledger_entries(EntryKind::Expense).unwrap(), 0);
}

#[test]
fn test_apply_is_idempotent() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let occ = first_occurrence(&f);
    let applier = Applier::new(&clock);

    let first = applier
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap();
    let second = applier
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(f.db.count_ledger_entries(EntryKind::Expense).unwrap(), 1);
}

#[test]
fn test_apply_missing_occurrence() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let err = Applier::new(&clock)
        .apply(&mut f.db, 9_999, Some(f.user_id))
        .unwrap_err();
    assert!(matches!(err, EngineError::Applier(_)));
}

#[test]
fn test_apply_requires_user() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let occ = first_occurrence(&f);
    let applier = Applier::new(&clock);

    let err = applier.apply(&mut f.db, occ.id.unwrap(), None).unwrap_err();
    assert!(matches!(err, EngineError::Applier(_)));
    let err = applier
        .apply(&mut f.db, occ.id.unwrap(), Some(4_242))
        .unwrap_err();
    assert!(matches!(err, EngineError::Applier(_)));

    let stored = f.db.get_occurrence(occ.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.status, OccurrenceStatus::Scheduled);
    assert_eq!(f.db.count_ledger_entries(EntryKind::Expense).unwrap(), 0);
}

#[test]
fn test_apply_rejected_record_rolls_back() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let occ = first_occurrence(&f);
    f.db.raw()
        .execute(
            "UPDATE recurring_templates SET title = '  ' WHERE id = ?1",
            [f.template_id],
        )
        .unwrap();

    let err = Applier::new(&clock)
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap_err();
    assert!(matches!(err, EngineError::LedgerRejected(_)));

    let stored = f.db.get_occurrence(occ.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored, occ);
    assert_eq!(f.db.count_ledger_entries(EntryKind::Expense).unwrap(), 0);
}

// ── cancel ────────────────────────────────────────────────────

#[test]
fn test_apply_cancel_round_trip() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let occ = first_occurrence(&f);
    let applier = Applier::new(&clock);

    let applied = applier
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap();
    let ledger_ref = applied.ledger_ref.unwrap();

    let canceled = applier.cancel(&mut f.db, occ.id.unwrap()).unwrap();
    assert_eq!(canceled.status, OccurrenceStatus::Canceled);
    assert!(canceled.applied_at.is_none());
    assert!(canceled.ledger_ref.is_none());
    assert!(f.db.get_ledger_entry(ledger_ref).unwrap().is_none());
    assert_eq!(f.db.count_ledger_entries(EntryKind::Expense).unwrap(), 0);

    let stored = f.db.get_occurrence(occ.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored, canceled);
}

#[test]
fn test_cancel_scheduled_sets_canceled() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let occ = first_occurrence(&f);

    let canceled = Applier::new(&clock)
        .cancel(&mut f.db, occ.id.unwrap())
        .unwrap();
    assert_eq!(canceled.status, OccurrenceStatus::Canceled);
    assert!(canceled.ledger_ref.is_none());
    assert_eq!(canceled.occurs_on, occ.occurs_on);
}

#[test]
fn test_cancel_twice_is_harmless() {
    let mut f = setup(EntryKind::Income);
    let clock = clock();
    let occ = first_occurrence(&f);
    let applier = Applier::new(&clock);
    applier
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap();

    applier.cancel(&mut f.db, occ.id.unwrap()).unwrap();
    let again = applier.cancel(&mut f.db, occ.id.unwrap()).unwrap();
    assert_eq!(again.status, OccurrenceStatus::Canceled);
    assert_eq!(f.db.count_ledger_entries(EntryKind::Income).unwrap(), 0);
}

#[test]
fn test_cancel_missing_occurrence() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let err = Applier::new(&clock).cancel(&mut f.db, 9_999).unwrap_err();
    assert!(matches!(err, EngineError::Applier(_)));
}

#[test]
fn test_apply_refuses_occurrence_pruned_from_range() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let march = f.db.get_occurrences(f.template_id).unwrap()[2].clone();
    let applier = Applier::new(&clock);
    let applied = applier
        .apply(&mut f.db, march.id.unwrap(), Some(f.user_id))
        .unwrap();
    let kept = applied.ledger_ref.unwrap();

    let mut t = f.db.get_template(f.template_id).unwrap().unwrap();
    t.effective_to = Some(d(2025, 2, 1));
    Synchronizer::new(24, &clock)
        .save_template(&mut f.db, &t)
        .unwrap();
    let pruned = f.db.get_occurrence(march.id.unwrap()).unwrap().unwrap();
    assert_eq!(pruned.status, OccurrenceStatus::Canceled);

    let err = applier
        .apply(&mut f.db, march.id.unwrap(), Some(f.user_id))
        .unwrap_err();
    assert!(matches!(err, EngineError::Applier(_)));
    assert_eq!(f.db.count_ledger_entries(EntryKind::Expense).unwrap(), 1);
    assert!(f.db.get_ledger_entry(kept).unwrap().is_some());
    let still = f.db.get_occurrence(march.id.unwrap()).unwrap().unwrap();
    assert_eq!(still, pruned);
}

#[test]
fn test_reapply_after_cancel_creates_new_record() {
    let mut f = setup(EntryKind::Expense);
    let clock = clock();
    let occ = first_occurrence(&f);
    let applier = Applier::new(&clock);

    let first = applier
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap();
    applier.cancel(&mut f.db, occ.id.unwrap()).unwrap();
    let second = applier
        .apply(&mut f.db, occ.id.unwrap(), Some(f.user_id))
        .unwrap();

    assert_eq!(second.status, OccurrenceStatus::Applied);
    assert_ne!(first.ledger_ref, second.ledger_ref);
    assert_eq!(f.db.count_ledger_entries(EntryKind::Expense).unwrap(), 1);
}
