//! Recurring rule operations
//!
//! The scheduler in `jobs` drives `list_due_recurring` and `set_next_date`;
//! everything else backs the CRUD surface.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewRecurringRule, RecurringRule};

impl Database {
    /// Create a recurring rule
    pub fn create_recurring_rule(&self, rule: &NewRecurringRule) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO recurring_rules
                (user_id, amount, kind, category_id, account_id, description,
                 tags, frequency, next_date, end_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                rule.user_id,
                rule.amount,
                rule.kind.as_str(),
                rule.category_id,
                rule.account_id,
                rule.description,
                rule.tags,
                rule.frequency.as_str(),
                rule.next_date.to_string(),
                rule.end_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's recurring rules
    pub fn list_recurring_rules(&self, user_id: i64) -> Result<Vec<RecurringRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY next_date, id",
            SELECT_RULE
        ))?;

        let rules = stmt
            .query_map(params![user_id], Self::row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Active rules whose cursor is due on or before `today`, across all users
    pub fn list_due_recurring(&self, today: NaiveDate) -> Result<Vec<RecurringRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE active = 1 AND next_date <= ? ORDER BY next_date, id",
            SELECT_RULE
        ))?;

        let rules = stmt
            .query_map(params![today.to_string()], Self::row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Get a single recurring rule by ID
    pub fn get_recurring_rule(&self, id: i64) -> Result<Option<RecurringRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_RULE),
                params![id],
                Self::row_to_rule,
            )
            .optional()?;

        Ok(rule)
    }

    /// Replace a rule's fields
    pub fn update_recurring_rule(&self, id: i64, rule: &NewRecurringRule) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE recurring_rules
            SET amount = ?, kind = ?, category_id = ?, account_id = ?,
                description = ?, tags = ?, frequency = ?, next_date = ?, end_date = ?
            WHERE id = ?
            "#,
            params![
                rule.amount,
                rule.kind.as_str(),
                rule.category_id,
                rule.account_id,
                rule.description,
                rule.tags,
                rule.frequency.as_str(),
                rule.next_date.to_string(),
                rule.end_date.map(|d| d.to_string()),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("recurring rule {}", id)));
        }
        Ok(())
    }

    /// Move a rule's cursor forward after the scheduler applies it
    pub fn set_recurring_next_date(&self, id: i64, next_date: NaiveDate) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE recurring_rules SET next_date = ? WHERE id = ?",
            params![next_date.to_string(), id],
        )?;
        Ok(())
    }

    /// Turn a rule on or off without touching its cursor
    pub fn set_recurring_active(&self, id: i64, active: bool) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE recurring_rules SET active = ? WHERE id = ?",
            params![active, id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("recurring rule {}", id)));
        }
        Ok(())
    }

    /// Delete a recurring rule
    pub fn delete_recurring_rule(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM recurring_rules WHERE id = ?", params![id])?;

        if changed == 0 {
            return Err(Error::NotFound(format!("recurring rule {}", id)));
        }
        Ok(())
    }

    fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<RecurringRule> {
        let kind_str: String = row.get(3)?;
        let freq_str: String = row.get(8)?;
        let next_str: String = row.get(9)?;
        let end_str: Option<String> = row.get(10)?;
        let created_at_str: String = row.get(12)?;
        Ok(RecurringRule {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            kind: kind_str.parse().unwrap_or_default(),
            category_id: row.get(4)?,
            account_id: row.get(5)?,
            description: row.get(6)?,
            tags: row.get(7)?,
            frequency: freq_str.parse().unwrap_or_default(),
            next_date: NaiveDate::parse_from_str(&next_str, "%Y-%m-%d").unwrap_or_default(),
            end_date: end_str.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            active: row.get(11)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}

const SELECT_RULE: &str = r#"
    SELECT id, user_id, amount, kind, category_id, account_id, description,
           tags, frequency, next_date, end_date, active, created_at
    FROM recurring_rules
"#;
