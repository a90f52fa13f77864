//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `users` - Users and notification preferences
//! - `accounts` - Money account operations
//! - `categories` - Spending categories
//! - `transactions` - Transaction CRUD through the ledger, splits, templates
//! - `budgets` - Budgets and spent-in-window aggregation
//! - `recurring` - Recurring transaction rules
//! - `bills` - Bills and bill payment
//! - `goals` - Savings goals and contributions
//! - `notifications` - Notifications, budget alert dedup, email outbox
//! - `reports` - Read-side aggregations (sums, breakdowns, dashboard)

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod accounts;
mod bills;
mod budgets;
mod categories;
mod goals;
mod notifications;
mod recurring;
mod reports;
mod transactions;
mod users;

pub use reports::{CategorySpend, DashboardStats, MonthTotals};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| {
            tracing::warn!(value = s, "Unparseable datetime in database, using now");
            Utc::now()
        })
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    db_path: String,
}

impl Database {
    /// Create a new database connection pool, running migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because every pooled
    /// connection would otherwise get its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            id
        ));

        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Users
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Notification preferences, one row per user, all flags on by default
            CREATE TABLE IF NOT EXISTS user_preferences (
                user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                email_notifications BOOLEAN NOT NULL DEFAULT 1,
                budget_alerts BOOLEAN NOT NULL DEFAULT 1,
                bill_reminders BOOLEAN NOT NULL DEFAULT 1,
                monthly_reports BOOLEAN NOT NULL DEFAULT 1,
                goal_notifications BOOLEAN NOT NULL DEFAULT 1
            );

            -- Spending categories (shared across users, matching the flat
            -- get-or-create import behavior)
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            -- Accounts; balance is written only by the ledger
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                account_type TEXT NOT NULL DEFAULT 'cash',
                balance REAL NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);

            -- Transactions
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                kind TEXT NOT NULL DEFAULT 'expense',
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                account_id INTEGER REFERENCES accounts(id) ON DELETE SET NULL,
                transfer_account_id INTEGER REFERENCES accounts(id) ON DELETE SET NULL,
                date DATE NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_transactions_user_kind ON transactions(user_id, kind);
            CREATE INDEX IF NOT EXISTS idx_transactions_user_category ON transactions(user_id, category_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);

            -- Transaction splits (category attribution only, no balance effect)
            CREATE TABLE IF NOT EXISTS transaction_splits (
                id INTEGER PRIMARY KEY,
                transaction_id INTEGER NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                amount REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_splits_transaction ON transaction_splits(transaction_id);

            -- Reusable transaction templates
            CREATE TABLE IF NOT EXISTS transaction_templates (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL DEFAULT 'expense',
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                account_id INTEGER REFERENCES accounts(id) ON DELETE SET NULL,
                description TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '',
                use_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_templates_user ON transaction_templates(user_id);

            -- Budgets
            CREATE TABLE IF NOT EXISTS budgets (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                start_date DATE,
                end_date DATE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_budgets_user ON budgets(user_id);

            -- Recurring transaction rules
            CREATE TABLE IF NOT EXISTS recurring_rules (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                kind TEXT NOT NULL DEFAULT 'expense',
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                account_id INTEGER REFERENCES accounts(id) ON DELETE SET NULL,
                description TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '',
                frequency TEXT NOT NULL DEFAULT 'monthly',
                next_date DATE NOT NULL,
                end_date DATE,
                active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_recurring_due ON recurring_rules(active, next_date);

            -- Bills
            CREATE TABLE IF NOT EXISTS bills (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                account_id INTEGER REFERENCES accounts(id) ON DELETE SET NULL,
                due_date DATE NOT NULL,
                frequency TEXT NOT NULL DEFAULT 'monthly',
                status TEXT NOT NULL DEFAULT 'pending',
                description TEXT NOT NULL DEFAULT '',
                reminder_days INTEGER NOT NULL DEFAULT 3,
                auto_pay BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_bills_user_status ON bills(user_id, status);
            CREATE INDEX IF NOT EXISTS idx_bills_due ON bills(status, due_date);

            -- Savings goals
            CREATE TABLE IF NOT EXISTS savings_goals (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                target_amount REAL NOT NULL,
                current_amount REAL NOT NULL DEFAULT 0,
                target_date DATE,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'active',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                completed_at DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_goals_user_status ON savings_goals(user_id, status);

            -- Goal contributions, append-only
            CREATE TABLE IF NOT EXISTS goal_contributions (
                id INTEGER PRIMARY KEY,
                goal_id INTEGER NOT NULL REFERENCES savings_goals(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                date DATE NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_contributions_goal ON goal_contributions(goal_id);

            -- Notifications, append-only. created_on is the job's logical
            -- day and the dedup key; created_at is wall-clock insertion time.
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                kind TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium',
                is_read BOOLEAN NOT NULL DEFAULT 0,
                created_on DATE NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_notifications_kind ON notifications(user_id, kind, created_on);

            -- Budget alert ledger. The UNIQUE constraint is the dedup key:
            -- each (budget, threshold) pair fires at most once ever.
            CREATE TABLE IF NOT EXISTS budget_alerts (
                id INTEGER PRIMARY KEY,
                budget_id INTEGER NOT NULL REFERENCES budgets(id) ON DELETE CASCADE,
                alert_type TEXT NOT NULL,
                triggered_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(budget_id, alert_type)
            );

            -- Financial health scores, overwritten in place
            CREATE TABLE IF NOT EXISTS health_scores (
                user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                score INTEGER NOT NULL DEFAULT 0,
                savings_rate REAL NOT NULL DEFAULT 0,
                budget_adherence REAL NOT NULL DEFAULT 0,
                emergency_fund_months REAL NOT NULL DEFAULT 0,
                calculated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Email outbox: notification creation is synchronous, delivery is
            -- drained asynchronously by the outbox worker
            CREATE TABLE IF NOT EXISTS email_outbox (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'queued',
                error TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                sent_at DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_outbox_status ON email_outbox(status);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
