//! Savings goal operations
//!
//! `add_contribution` owns the completion transition: the first contribution
//! that lifts `current_amount` to the target flips the goal to completed and
//! stamps `completed_at`. Later contributions never re-fire it.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{GoalContribution, GoalStatus, SavingsGoal};

impl Database {
    /// Create a savings goal
    pub fn create_goal(
        &self,
        user_id: i64,
        name: &str,
        target_amount: f64,
        target_date: Option<NaiveDate>,
        description: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO savings_goals (user_id, name, target_amount, target_date, description)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                name,
                target_amount,
                target_date.map(|d| d.to_string()),
                description,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's goals
    pub fn list_goals(&self, user_id: i64) -> Result<Vec<SavingsGoal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY created_at, id",
            SELECT_GOAL
        ))?;

        let goals = stmt
            .query_map(params![user_id], Self::row_to_goal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(goals)
    }

    /// Count a user's active goals
    pub fn count_active_goals(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM savings_goals WHERE user_id = ? AND status = 'active'",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get a single goal by ID
    pub fn get_goal(&self, id: i64) -> Result<Option<SavingsGoal>> {
        let conn = self.conn()?;
        let goal = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_GOAL),
                params![id],
                Self::row_to_goal,
            )
            .optional()?;

        Ok(goal)
    }

    /// Update a goal's editable fields
    pub fn update_goal(
        &self,
        id: i64,
        name: &str,
        target_amount: f64,
        target_date: Option<NaiveDate>,
        description: &str,
    ) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE savings_goals
            SET name = ?, target_amount = ?, target_date = ?, description = ?
            WHERE id = ?
            "#,
            params![
                name,
                target_amount,
                target_date.map(|d| d.to_string()),
                description,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("goal {}", id)));
        }
        Ok(())
    }

    /// Pause or reactivate a goal
    pub fn set_goal_status(&self, id: i64, status: GoalStatus) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE savings_goals SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("goal {}", id)));
        }
        Ok(())
    }

    /// Record a contribution and advance the goal
    ///
    /// Returns the updated goal. The completed transition happens exactly
    /// once, on the contribution that crosses the target.
    pub fn add_contribution(
        &self,
        goal_id: i64,
        amount: f64,
        date: NaiveDate,
        description: &str,
    ) -> Result<SavingsGoal> {
        let goal = self
            .get_goal(goal_id)?
            .ok_or_else(|| Error::NotFound(format!("goal {}", goal_id)))?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO goal_contributions (goal_id, amount, date, description)
            VALUES (?, ?, ?, ?)
            "#,
            params![goal_id, amount, date.to_string(), description],
        )?;

        let new_amount = goal.current_amount + amount;
        let completing = goal.status == GoalStatus::Active && new_amount >= goal.target_amount;

        if completing {
            // datetime('now') matches the format parse_datetime reads back
            conn.execute(
                r#"
                UPDATE savings_goals
                SET current_amount = ?, status = 'completed', completed_at = datetime('now')
                WHERE id = ?
                "#,
                params![new_amount, goal_id],
            )?;
        } else {
            conn.execute(
                "UPDATE savings_goals SET current_amount = ? WHERE id = ?",
                params![new_amount, goal_id],
            )?;
        }

        drop(conn);
        self.get_goal(goal_id)?
            .ok_or_else(|| Error::NotFound(format!("goal {}", goal_id)))
    }

    /// List a goal's contributions, newest first
    pub fn list_contributions(&self, goal_id: i64) -> Result<Vec<GoalContribution>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, goal_id, amount, date, description, created_at
            FROM goal_contributions
            WHERE goal_id = ?
            ORDER BY date DESC, id DESC
            "#,
        )?;

        let contributions = stmt
            .query_map(params![goal_id], |row| {
                let date_str: String = row.get(3)?;
                let created_at_str: String = row.get(5)?;
                Ok(GoalContribution {
                    id: row.get(0)?,
                    goal_id: row.get(1)?,
                    amount: row.get(2)?,
                    date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
                    description: row.get(4)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(contributions)
    }

    /// Delete a goal and its contributions
    pub fn delete_goal(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM savings_goals WHERE id = ?", params![id])?;

        if changed == 0 {
            return Err(Error::NotFound(format!("goal {}", id)));
        }
        Ok(())
    }

    fn row_to_goal(row: &rusqlite::Row) -> rusqlite::Result<SavingsGoal> {
        let target_str: Option<String> = row.get(5)?;
        let status_str: String = row.get(7)?;
        let created_at_str: String = row.get(8)?;
        let completed_at_str: Option<String> = row.get(9)?;
        Ok(SavingsGoal {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            target_amount: row.get(3)?,
            current_amount: row.get(4)?,
            target_date: target_str.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            description: row.get(6)?,
            status: status_str.parse().unwrap_or_default(),
            created_at: parse_datetime(&created_at_str),
            completed_at: completed_at_str.map(|s| parse_datetime(&s)),
        })
    }
}

const SELECT_GOAL: &str = r#"
    SELECT id, user_id, name, target_amount, current_amount, target_date,
           description, status, created_at, completed_at
    FROM savings_goals
"#;
