//! User and notification preference operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{User, UserPreferences};

impl Database {
    /// Create a user, or return the existing ID for the username
    pub fn upsert_user(&self, username: &str, email: Option<&str>) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?",
                params![username],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO users (username, email) VALUES (?, ?)",
            params![username, email],
        )?;
        let id = conn.last_insert_rowid();

        // Every user gets a preference row with all flags on
        conn.execute(
            "INSERT OR IGNORE INTO user_preferences (user_id) VALUES (?)",
            params![id],
        )?;

        Ok(id)
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, username, email, created_at FROM users ORDER BY id")?;

        let users = stmt
            .query_map([], |row| {
                let created_at_str: String = row.get(3)?;
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Get a single user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, email, created_at FROM users WHERE id = ?",
                params![id],
                |row| {
                    let created_at_str: String = row.get(3)?;
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        created_at: parse_datetime(&created_at_str),
                    })
                },
            )
            .optional()?;

        Ok(user)
    }

    /// Get a user's notification preferences
    ///
    /// A missing row (user created before the preferences table, or the
    /// insert was lost) falls back to everything-on defaults.
    pub fn get_preferences(&self, user_id: i64) -> Result<UserPreferences> {
        let conn = self.conn()?;

        let prefs = conn
            .query_row(
                r#"
                SELECT user_id, email_notifications, budget_alerts, bill_reminders,
                       monthly_reports, goal_notifications
                FROM user_preferences WHERE user_id = ?
                "#,
                params![user_id],
                |row| {
                    Ok(UserPreferences {
                        user_id: row.get(0)?,
                        email_notifications: row.get(1)?,
                        budget_alerts: row.get(2)?,
                        bill_reminders: row.get(3)?,
                        monthly_reports: row.get(4)?,
                        goal_notifications: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(prefs.unwrap_or(UserPreferences {
            user_id,
            ..Default::default()
        }))
    }

    /// Update a user's notification preferences
    pub fn set_preferences(&self, prefs: &UserPreferences) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO user_preferences (user_id, email_notifications, budget_alerts,
                                          bill_reminders, monthly_reports, goal_notifications)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                email_notifications = excluded.email_notifications,
                budget_alerts = excluded.budget_alerts,
                bill_reminders = excluded.bill_reminders,
                monthly_reports = excluded.monthly_reports,
                goal_notifications = excluded.goal_notifications
            "#,
            params![
                prefs.user_id,
                prefs.email_notifications,
                prefs.budget_alerts,
                prefs.bill_reminders,
                prefs.monthly_reports,
                prefs.goal_notifications,
            ],
        )?;
        Ok(())
    }
}
