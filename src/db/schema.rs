pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    account_type TEXT NOT NULL DEFAULT 'Checking',
    currency     TEXT NOT NULL DEFAULT 'JPY',
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS recurring_templates (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    kind              TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
    account_id        INTEGER NOT NULL REFERENCES accounts(id),
    category_id       INTEGER NOT NULL REFERENCES categories(id),
    title             TEXT NOT NULL,
    memo              TEXT NOT NULL DEFAULT '',
    amount            INTEGER NOT NULL CHECK (amount > 0),
    day_of_month      INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 31),
    use_end_of_month  BOOLEAN NOT NULL DEFAULT 0,
    effective_from    TEXT NOT NULL,
    effective_to      TEXT,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS incomes (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id   INTEGER NOT NULL REFERENCES accounts(id),
    user_id      INTEGER NOT NULL REFERENCES users(id),
    category_id  INTEGER NOT NULL REFERENCES categories(id),
    title        TEXT NOT NULL CHECK (length(trim(title)) > 0),
    amount       INTEGER NOT NULL CHECK (amount > 0),
    memo         TEXT NOT NULL DEFAULT '',
    date         TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS expenses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id   INTEGER NOT NULL REFERENCES accounts(id),
    user_id      INTEGER NOT NULL REFERENCES users(id),
    category_id  INTEGER NOT NULL REFERENCES categories(id),
    title        TEXT NOT NULL CHECK (length(trim(title)) > 0),
    amount       INTEGER NOT NULL CHECK (amount > 0),
    memo         TEXT NOT NULL DEFAULT '',
    date         TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_incomes_date ON incomes(date);
CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);

CREATE TABLE IF NOT EXISTS recurring_occurrences (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    template_id   INTEGER NOT NULL REFERENCES recurring_templates(id) ON DELETE CASCADE,
    period_month  TEXT NOT NULL,
    occurs_on     TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'scheduled'
                  CHECK (status IN ('scheduled', 'applied', 'canceled')),
    income_id     INTEGER REFERENCES incomes(id),
    expense_id    INTEGER REFERENCES expenses(id),
    applied_at    TEXT,
    UNIQUE(template_id, period_month),
    CHECK (income_id IS NULL OR expense_id IS NULL),
    CHECK ((status = 'applied') = (income_id IS NOT NULL OR expense_id IS NOT NULL)),
    CHECK ((status = 'applied') = (applied_at IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS idx_occurrences_occurs_on ON recurring_occurrences(occurs_on);
CREATE INDEX IF NOT EXISTS idx_occurrences_income ON recurring_occurrences(income_id);
CREATE INDEX IF NOT EXISTS idx_occurrences_expense ON recurring_occurrences(expense_id);

"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
