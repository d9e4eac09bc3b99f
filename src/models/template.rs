use chrono::{DateTime, NaiveDate, Utc};

use super::EntryKind;
use crate::calendar;

/// A user-authored recurrence: "pay `amount` on day N of every month
/// between `effective_from` and `effective_to`".
#[derive(Debug, Clone)]
pub struct RecurringTemplate {
    pub id: Option<i64>,
    pub kind: EntryKind,
    pub account_id: i64,
    pub category_id: i64,
    pub title: String,
    pub memo: String,
    pub amount: i64,
    /// 1..=31. With `use_end_of_month` this only matters when the month is
    /// shorter than it.
    pub day_of_month: u32,
    pub use_end_of_month: bool,
    pub effective_from: Option<NaiveDate>,
    /// `None` means open-ended, bounded by the rolling horizon.
    pub effective_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl RecurringTemplate {
    pub fn new(
        kind: EntryKind,
        account_id: i64,
        category_id: i64,
        title: String,
        amount: i64,
        day_of_month: u32,
        effective_from: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            kind,
            account_id,
            category_id,
            title,
            memo: String::new(),
            amount,
            day_of_month,
            use_end_of_month: false,
            effective_from: Some(calendar::month_start(effective_from)),
            effective_to: None,
            created_at: Utc::now(),
        }
    }

    /// Check the fields a user can get wrong. Months are not required to be
    /// normalized; see [`Self::normalize`].
    pub fn validate(&self) -> Result<(), String> {
        let Some(from) = self.effective_from else {
            return Err("effective_from is required".into());
        };
        if !(1..=31).contains(&self.day_of_month) {
            return Err(format!(
                "day_of_month must be between 1 and 31, got {}",
                self.day_of_month
            ));
        }
        if self.amount <= 0 {
            return Err(format!("amount must be positive, got {}", self.amount));
        }
        if self.title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        if let Some(to) = self.effective_to {
            if calendar::month_start(to) < calendar::month_start(from) {
                return Err(format!(
                    "effective_to {} is before effective_from {}",
                    calendar::format_month(to),
                    calendar::format_month(from)
                ));
            }
        }
        Ok(())
    }

    /// Pin both effective months to their first day.
    pub fn normalize(&mut self) {
        self.effective_from = self.effective_from.map(calendar::month_start);
        self.effective_to = self.effective_to.map(calendar::month_start);
    }

    /// Whether `month` falls between `effective_from` and `effective_to`.
    pub fn covers(&self, month: NaiveDate) -> bool {
        let month = calendar::month_start(month);
        let Some(from) = self.effective_from.map(calendar::month_start) else {
            return false;
        };
        match self.effective_to {
            Some(to) => from <= month && month <= calendar::month_start(to),
            None => from <= month,
        }
    }

    /// Date this template lands on in `month`.
    pub fn occurs_on(&self, month: NaiveDate) -> NaiveDate {
        calendar::occurs_on(month, self.day_of_month, self.use_end_of_month)
    }
}
