//! Bill operations
//!
//! Paying a bill is owned by `jobs::pay_bill`: it marks the row paid here,
//! records the payment transaction, and inserts the next instance for
//! recurring bills.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Bill, BillStatus, NewBill};

impl Database {
    /// Create a bill
    pub fn create_bill(&self, bill: &NewBill) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO bills
                (user_id, name, amount, category_id, account_id, due_date,
                 frequency, description, reminder_days, auto_pay)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                bill.user_id,
                bill.name,
                bill.amount,
                bill.category_id,
                bill.account_id,
                bill.due_date.to_string(),
                bill.frequency.as_str(),
                bill.description,
                bill.reminder_days,
                bill.auto_pay,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's bills, soonest due first
    pub fn list_bills(&self, user_id: i64) -> Result<Vec<Bill>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY due_date, id",
            SELECT_BILL
        ))?;

        let bills = stmt
            .query_map(params![user_id], Self::row_to_bill)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bills)
    }

    /// Pending bills across all users, for the reminder and auto-pay jobs
    pub fn list_pending_bills(&self) -> Result<Vec<Bill>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE status = 'pending' ORDER BY due_date, id",
            SELECT_BILL
        ))?;

        let bills = stmt
            .query_map([], Self::row_to_bill)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bills)
    }

    /// Get a single bill by ID
    pub fn get_bill(&self, id: i64) -> Result<Option<Bill>> {
        let conn = self.conn()?;
        let bill = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_BILL),
                params![id],
                Self::row_to_bill,
            )
            .optional()?;

        Ok(bill)
    }

    /// Replace a bill's fields
    pub fn update_bill(&self, id: i64, bill: &NewBill) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE bills
            SET name = ?, amount = ?, category_id = ?, account_id = ?,
                due_date = ?, frequency = ?, description = ?,
                reminder_days = ?, auto_pay = ?
            WHERE id = ?
            "#,
            params![
                bill.name,
                bill.amount,
                bill.category_id,
                bill.account_id,
                bill.due_date.to_string(),
                bill.frequency.as_str(),
                bill.description,
                bill.reminder_days,
                bill.auto_pay,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("bill {}", id)));
        }
        Ok(())
    }

    /// Set a bill's lifecycle status
    pub fn set_bill_status(&self, id: i64, status: BillStatus) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE bills SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("bill {}", id)));
        }
        Ok(())
    }

    /// Delete a bill
    pub fn delete_bill(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM bills WHERE id = ?", params![id])?;

        if changed == 0 {
            return Err(Error::NotFound(format!("bill {}", id)));
        }
        Ok(())
    }

    fn row_to_bill(row: &rusqlite::Row) -> rusqlite::Result<Bill> {
        let due_str: String = row.get(6)?;
        let freq_str: String = row.get(7)?;
        let status_str: String = row.get(8)?;
        let created_at_str: String = row.get(12)?;
        Ok(Bill {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            amount: row.get(3)?,
            category_id: row.get(4)?,
            account_id: row.get(5)?,
            due_date: NaiveDate::parse_from_str(&due_str, "%Y-%m-%d").unwrap_or_default(),
            frequency: freq_str.parse().unwrap_or_default(),
            status: status_str.parse().unwrap_or_default(),
            description: row.get(9)?,
            reminder_days: row.get(10)?,
            auto_pay: row.get(11)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}

const SELECT_BILL: &str = r#"
    SELECT id, user_id, name, amount, category_id, account_id, due_date,
           frequency, status, description, reminder_days, auto_pay, created_at
    FROM bills
"#;
