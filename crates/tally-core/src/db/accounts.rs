//! Account operations
//!
//! The `balance` column is seeded at creation and from then on adjusted
//! only by the ledger (see `ledger::apply_effect`).

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Account, AccountType};

impl Database {
    /// Create an account with a starting balance
    pub fn create_account(
        &self,
        user_id: i64,
        name: &str,
        account_type: AccountType,
        balance: f64,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO accounts (user_id, name, account_type, balance) VALUES (?, ?, ?, ?)",
            params![user_id, name, account_type.as_str(), balance],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's accounts
    pub fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, name, account_type, balance, created_at
            FROM accounts WHERE user_id = ? ORDER BY name
            "#,
        )?;

        let accounts = stmt
            .query_map(params![user_id], Self::row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Get a single account by ID
    pub fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                r#"
                SELECT id, user_id, name, account_type, balance, created_at
                FROM accounts WHERE id = ?
                "#,
                params![id],
                Self::row_to_account,
            )
            .optional()?;

        Ok(account)
    }

    /// Rename an account or change its type
    pub fn update_account(&self, id: i64, name: &str, account_type: AccountType) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE accounts SET name = ?, account_type = ? WHERE id = ?",
            params![name, account_type.as_str(), id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("account {}", id)));
        }
        Ok(())
    }

    /// Delete an account
    ///
    /// Transactions referencing it keep their rows with the account set to
    /// NULL, so their balance effect is simply gone with the account.
    pub fn delete_account(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM accounts WHERE id = ?", params![id])?;

        if changed == 0 {
            return Err(Error::NotFound(format!("account {}", id)));
        }
        Ok(())
    }

    /// Sum of all account balances for a user
    pub fn total_balance(&self, user_id: i64) -> Result<f64> {
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(balance), 0) FROM accounts WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Count a user's accounts
    pub fn count_accounts(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
        let type_str: String = row.get(3)?;
        let created_at_str: String = row.get(5)?;
        Ok(Account {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            account_type: type_str.parse().unwrap_or_default(),
            balance: row.get(4)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
