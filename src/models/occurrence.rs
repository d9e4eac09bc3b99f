use chrono::{DateTime, NaiveDate, Utc};

use super::LedgerRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceStatus {
    Scheduled,
    Applied,
    Canceled,
}

impl OccurrenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Applied => "applied",
            Self::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "applied" => Some(Self::Applied),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One instance of a template in a given month.
///
/// `(template_id, period_month)` is the natural key. `ledger_ref` and
/// `applied_at` are set exactly when `status` is `Applied`.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub id: Option<i64>,
    pub template_id: i64,
    /// First day of the target month.
    pub period_month: NaiveDate,
    pub occurs_on: NaiveDate,
    pub status: OccurrenceStatus,
    pub ledger_ref: Option<LedgerRef>,
    pub applied_at: Option<DateTime<Utc>>,
}

impl Occurrence {
    pub fn scheduled(template_id: i64, period_month: NaiveDate, occurs_on: NaiveDate) -> Self {
        Self {
            id: None,
            template_id,
            period_month,
            occurs_on,
            status: OccurrenceStatus::Scheduled,
            ledger_ref: None,
            applied_at: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == OccurrenceStatus::Applied
    }

    pub fn income_id(&self) -> Option<i64> {
        match self.ledger_ref {
            Some(LedgerRef::Income(id)) => Some(id),
            _ => None,
        }
    }

    pub fn expense_id(&self) -> Option<i64> {
        match self.ledger_ref {
            Some(LedgerRef::Expense(id)) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn mark_applied(&mut self, ledger_ref: LedgerRef, at: DateTime<Utc>) {
        self.status = OccurrenceStatus::Applied;
        self.ledger_ref = Some(ledger_ref);
        self.applied_at = Some(at);
    }

    /// Move to `Canceled`, dropping the link. Returns whatever was linked.
    pub(crate) fn mark_canceled(&mut self) -> Option<LedgerRef> {
        self.status = OccurrenceStatus::Canceled;
        self.applied_at = None;
        self.ledger_ref.take()
    }
}
