//! Read-side aggregation queries
//!
//! Everything here is pure SELECT over the ledger tables. The metrics and
//! job layers compose these into scores and insights.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::HealthScore;

/// Income and expense totals for one calendar month
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MonthTotals {
    pub income: f64,
    pub expenses: f64,
}

impl MonthTotals {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

/// Expense total for one category over a window
#[derive(Debug, Clone, Serialize)]
pub struct CategorySpend {
    pub category_id: i64,
    pub name: String,
    pub total: f64,
}

/// Headline numbers for the dashboard endpoint
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_balance: f64,
    pub month_income: f64,
    pub month_expenses: f64,
    pub month_net: f64,
    pub account_count: i64,
    pub pending_bills: i64,
    pub active_goals: i64,
    pub unread_notifications: i64,
}

impl Database {
    /// Income and expense totals for a calendar month
    pub fn month_totals(&self, user_id: i64, year: i32, month: u32) -> Result<MonthTotals> {
        let Some(from) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Ok(MonthTotals::default());
        };
        let to_exclusive = crate::schedule::add_months(from, 1);

        let conn = self.conn()?;
        let (income, expenses) = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0)
            FROM transactions
            WHERE user_id = ? AND date >= ? AND date < ?
            "#,
            params![user_id, from.to_string(), to_exclusive.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(MonthTotals { income, expenses })
    }

    /// Expense total over an inclusive date window
    pub fn expenses_between(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> Result<f64> {
        let conn = self.conn()?;
        let total = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0) FROM transactions
            WHERE user_id = ? AND kind = 'expense' AND date >= ? AND date <= ?
            "#,
            params![user_id, from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Expense totals per category over an inclusive window, biggest first
    pub fn spending_by_category(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategorySpend>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.name, COALESCE(SUM(t.amount), 0) AS total
            FROM transactions t
            JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = ? AND t.kind = 'expense'
              AND t.date >= ? AND t.date <= ?
            GROUP BY c.id, c.name
            ORDER BY total DESC
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![user_id, from.to_string(), to.to_string()],
                |row| {
                    Ok(CategorySpend {
                        category_id: row.get(0)?,
                        name: row.get(1)?,
                        total: row.get(2)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Number of transactions in a calendar month
    pub fn count_month_transactions(&self, user_id: i64, year: i32, month: u32) -> Result<i64> {
        let Some(from) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Ok(0);
        };
        let to_exclusive = crate::schedule::add_months(from, 1);

        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ? AND date >= ? AND date < ?",
            params![user_id, from.to_string(), to_exclusive.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// One-query summary for the dashboard endpoint
    pub fn dashboard_stats(&self, user_id: i64, today: NaiveDate) -> Result<DashboardStats> {
        let totals = self.month_totals(user_id, today.year(), today.month())?;
        let total_balance = self.total_balance(user_id)?;
        let account_count = self.count_accounts(user_id)?;
        let active_goals = self.count_active_goals(user_id)?;
        let unread_notifications = self.count_unread_notifications(user_id)?;

        let conn = self.conn()?;
        let pending_bills = conn.query_row(
            "SELECT COUNT(*) FROM bills WHERE user_id = ? AND status = 'pending'",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(DashboardStats {
            total_balance,
            month_income: totals.income,
            month_expenses: totals.expenses,
            month_net: totals.net(),
            account_count,
            pending_bills,
            active_goals,
            unread_notifications,
        })
    }

    /// Overwrite a user's stored health score
    pub fn upsert_health_score(
        &self,
        user_id: i64,
        score: i64,
        savings_rate: f64,
        budget_adherence: f64,
        emergency_fund_months: f64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO health_scores
                (user_id, score, savings_rate, budget_adherence,
                 emergency_fund_months, calculated_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(user_id) DO UPDATE SET
                score = excluded.score,
                savings_rate = excluded.savings_rate,
                budget_adherence = excluded.budget_adherence,
                emergency_fund_months = excluded.emergency_fund_months,
                calculated_at = CURRENT_TIMESTAMP
            "#,
            params![
                user_id,
                score,
                savings_rate,
                budget_adherence,
                emergency_fund_months
            ],
        )?;
        Ok(())
    }

    /// A user's most recently stored health score, if any
    pub fn get_health_score(&self, user_id: i64) -> Result<Option<HealthScore>> {
        let conn = self.conn()?;
        let score = conn
            .query_row(
                r#"
                SELECT user_id, score, savings_rate, budget_adherence,
                       emergency_fund_months, calculated_at
                FROM health_scores WHERE user_id = ?
                "#,
                params![user_id],
                |row| {
                    let calculated_at_str: String = row.get(5)?;
                    Ok(HealthScore {
                        user_id: row.get(0)?,
                        score: row.get(1)?,
                        savings_rate: row.get(2)?,
                        budget_adherence: row.get(3)?,
                        emergency_fund_months: row.get(4)?,
                        calculated_at: parse_datetime(&calculated_at_str),
                    })
                },
            )
            .optional()?;

        Ok(score)
    }
}
