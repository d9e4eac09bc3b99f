use chrono::NaiveDate;
use rusqlite::ffi;
use thiserror::Error;

/// Failures surfaced by the recurring entry engine.
///
/// Every variant is raised from inside a single storage transaction, so a
/// caller that sees an error can rely on nothing having been written.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("cannot apply occurrence: {0}")]
    Applier(String),
    #[error("occurrence for template {template_id} in {period_month} already exists")]
    Conflict {
        template_id: i64,
        period_month: NaiveDate,
    },
    #[error("ledger record rejected: {0}")]
    LedgerRejected(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl EngineError {
    /// Conflicts come from a concurrent insert of the same natural key;
    /// re-running the operation reads the winner's row instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Extended result code of a failed constraint, if `err` is one.
pub(crate) fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        constraint_code(err),
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) | Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

pub(crate) fn is_check_violation(err: &rusqlite::Error) -> bool {
    matches!(
        constraint_code(err),
        Some(ffi::SQLITE_CONSTRAINT_CHECK) | Some(ffi::SQLITE_CONSTRAINT_NOTNULL)
    )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    constraint_code(err) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}
