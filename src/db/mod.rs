mod ledger;
mod occurrences;
mod schema;
mod templates;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;

use crate::error::EngineResult;
use crate::models::*;

pub(crate) use ledger::{delete_entry, insert_entry};
pub(crate) use occurrences::{
    delete_occurrence, get_occurrence, insert_occurrence, occurrences_for_template,
    update_occurrence,
};
pub(crate) use templates::{get_template, insert_template, update_template};

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .context("Failed to set busy timeout")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> &Connection {
        &self.conn
    }

    /// Start a write transaction. `IMMEDIATE` takes the write lock up front so
    /// read-then-write sequences inside it cannot interleave with another
    /// writer. Dropping the transaction without committing rolls it back.
    pub(crate) fn write_txn(&mut self) -> rusqlite::Result<rusqlite::Transaction<'_>> {
        self.conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
    }

    fn migrate(&mut self) -> Result<()> {
        // Check if schema_version table exists
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            let tx = self.conn.transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tx.commit()?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let defaults = [
            "Bills & Subscriptions",
            "Education",
            "Freelance",
            "Housing",
            "Income",
            "Insurance",
            "Interest",
            "Rent/Mortgage",
            "Salary",
            "Streaming",
            "Transportation",
            "Uncategorized",
            "Utilities",
        ];

        let tx = self.conn.transaction()?;
        for name in &defaults {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
                params![name],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────

    pub(crate) fn insert_user(&self, user: &User) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO users (name, created_at) VALUES (?1, ?2)",
            params![user.name, user.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE name = ?1",
                params![name],
                |row| {
                    Ok(User {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    // ── Accounts ──────────────────────────────────────────────

    pub(crate) fn insert_account(&self, account: &Account) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO accounts (name, account_type, currency, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account.name,
                account.account_type.as_str(),
                account.currency,
                account.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, account_type, currency, created_at FROM accounts ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Account {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                account_type: AccountType::parse(&row.get::<_, String>(2)?),
                currency: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: Some(row.get(0)?),
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (name) VALUES (?1)",
            params![cat.name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Recurring templates ───────────────────────────────────

    pub(crate) fn get_template(&self, id: i64) -> EngineResult<Option<RecurringTemplate>> {
        Ok(templates::get_template(&self.conn, id)?)
    }

    pub(crate) fn get_templates(&self) -> EngineResult<Vec<RecurringTemplate>> {
        Ok(templates::list_templates(&self.conn)?)
    }

    /// Delete a template. Its occurrences go with it (`ON DELETE CASCADE`);
    /// ledger records created from applied occurrences stay in the ledger.
    pub(crate) fn delete_template(&mut self, id: i64) -> EngineResult<bool> {
        let tx = self.write_txn()?;
        let removed = templates::delete_template(&tx, id)?;
        tx.commit()?;
        if removed {
            tracing::info!(template_id = id, "deleted recurring template");
        }
        Ok(removed)
    }

    // ── Occurrences ───────────────────────────────────────────

    pub(crate) fn get_occurrence(&self, id: i64) -> EngineResult<Option<Occurrence>> {
        Ok(occurrences::get_occurrence(&self.conn, id)?)
    }

    pub(crate) fn get_occurrences(&self, template_id: i64) -> EngineResult<Vec<Occurrence>> {
        Ok(occurrences::occurrences_for_template(&self.conn, template_id)?)
    }

    /// Scheduled occurrences landing in `[from, to]`, across all templates.
    pub(crate) fn get_upcoming(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<Occurrence>> {
        Ok(occurrences::scheduled_between(&self.conn, from, to)?)
    }

    // ── Ledger ────────────────────────────────────────────────

    pub(crate) fn get_ledger_entry(&self, r: LedgerRef) -> EngineResult<Option<LedgerEntry>> {
        Ok(ledger::get_entry(&self.conn, r)?)
    }

    /// Incomes and expenses dated in `month`, oldest first.
    pub(crate) fn get_ledger_entries(&self, month: NaiveDate) -> EngineResult<Vec<LedgerEntry>> {
        Ok(ledger::entries_for_month(&self.conn, month)?)
    }

    #[cfg(test)]
    pub(crate) fn count_ledger_entries(&self, kind: EntryKind) -> EngineResult<i64> {
        Ok(ledger::count_entries(&self.conn, kind)?)
    }
}

pub(crate) fn user_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

/// Conversion error for a text column holding an unknown enum value.
pub(crate) fn invalid_text(idx: usize, column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unexpected {column} value: {value}").into(),
    )
}
