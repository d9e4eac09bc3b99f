use chrono::{DateTime, NaiveDate, Utc};

use super::RecurringTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "out" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Table holding ledger records of this kind.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Income => "incomes",
            Self::Expense => "expenses",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Back-reference from an occurrence to the ledger record it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerRef {
    Income(i64),
    Expense(i64),
}

impl LedgerRef {
    pub fn new(kind: EntryKind, id: i64) -> Self {
        match kind {
            EntryKind::Income => Self::Income(id),
            EntryKind::Expense => Self::Expense(id),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Income(_) => EntryKind::Income,
            Self::Expense(_) => EntryKind::Expense,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Income(id) | Self::Expense(id) => *id,
        }
    }

    /// Rebuild from the two nullable storage columns.
    pub(crate) fn from_columns(income_id: Option<i64>, expense_id: Option<i64>) -> Option<Self> {
        match (income_id, expense_id) {
            (Some(id), _) => Some(Self::Income(id)),
            (None, Some(id)) => Some(Self::Expense(id)),
            (None, None) => None,
        }
    }
}

/// A dated income or expense record in the general ledger.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: Option<i64>,
    pub kind: EntryKind,
    pub account_id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub amount: i64,
    pub memo: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Build the record an occurrence of `template` turns into on `date`.
    pub fn from_template(
        template: &RecurringTemplate,
        user_id: i64,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            kind: template.kind,
            account_id: template.account_id,
            user_id,
            category_id: template.category_id,
            title: template.title.clone(),
            amount: template.amount,
            memo: template.memo.clone(),
            date,
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.amount <= 0 {
            return Err(format!("amount must be positive, got {}", self.amount));
        }
        if self.title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        Ok(())
    }

    /// Amount with its sign for balances: incomes positive, expenses negative.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            EntryKind::Income => self.amount,
            EntryKind::Expense => -self.amount,
        }
    }
}
