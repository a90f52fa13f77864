//! Budget operations
//!
//! Budgets are read-side aggregation targets only; they never move balances.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Budget;

impl Database {
    /// Create a budget
    pub fn create_budget(
        &self,
        user_id: i64,
        name: &str,
        category_id: i64,
        amount: f64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (user_id, name, category_id, amount, start_date, end_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                name,
                category_id,
                amount,
                start_date.map(|d| d.to_string()),
                end_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's budgets
    pub fn list_budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY name",
            SELECT_BUDGET
        ))?;

        let budgets = stmt
            .query_map(params![user_id], Self::row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(budgets)
    }

    /// Budgets whose date range contains `today`
    ///
    /// A NULL start or end is treated as unbounded on that side.
    pub fn list_active_budgets(&self, today: NaiveDate) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"{} WHERE (start_date IS NULL OR start_date <= ?)
                 AND (end_date IS NULL OR end_date >= ?)
               ORDER BY id"#,
            SELECT_BUDGET
        ))?;

        let today_str = today.to_string();
        let budgets = stmt
            .query_map(params![today_str, today_str], Self::row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(budgets)
    }

    /// Get a single budget by ID
    pub fn get_budget(&self, id: i64) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_BUDGET),
                params![id],
                Self::row_to_budget,
            )
            .optional()?;

        Ok(budget)
    }

    /// Update a budget
    pub fn update_budget(
        &self,
        id: i64,
        name: &str,
        category_id: i64,
        amount: f64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE budgets
            SET name = ?, category_id = ?, amount = ?, start_date = ?, end_date = ?
            WHERE id = ?
            "#,
            params![
                name,
                category_id,
                amount,
                start_date.map(|d| d.to_string()),
                end_date.map(|d| d.to_string()),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("budget {}", id)));
        }
        Ok(())
    }

    /// Delete a budget and its alert history
    pub fn delete_budget(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM budgets WHERE id = ?", params![id])?;

        if changed == 0 {
            return Err(Error::NotFound(format!("budget {}", id)));
        }
        Ok(())
    }

    /// Expense total for a budget's category within a window
    ///
    /// The window defaults match the alert job: a missing start falls back to
    /// the first of the current month, a missing end to today.
    pub fn budget_spent(&self, budget: &Budget, today: NaiveDate) -> Result<f64> {
        let from = budget
            .start_date
            .unwrap_or_else(|| today.with_day(1).unwrap_or(today));
        let to = budget.end_date.unwrap_or(today);

        let conn = self.conn()?;
        let spent: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0) FROM transactions
            WHERE user_id = ? AND category_id = ? AND kind = 'expense'
              AND date >= ? AND date <= ?
            "#,
            params![
                budget.user_id,
                budget.category_id,
                from.to_string(),
                to.to_string()
            ],
            |row| row.get(0),
        )?;

        Ok(spent)
    }

    fn row_to_budget(row: &rusqlite::Row) -> rusqlite::Result<Budget> {
        let start_str: Option<String> = row.get(5)?;
        let end_str: Option<String> = row.get(6)?;
        let created_at_str: String = row.get(7)?;
        Ok(Budget {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            category_id: row.get(3)?,
            amount: row.get(4)?,
            start_date: start_str.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            end_date: end_str.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            created_at: parse_datetime(&created_at_str),
        })
    }
}

const SELECT_BUDGET: &str = r#"
    SELECT id, user_id, name, category_id, amount, start_date, end_date, created_at
    FROM budgets
"#;
