//! Notifications, budget alert dedup, and the email outbox
//!
//! Alert jobs run repeatedly over the same data, so everything here is built
//! around not firing twice: budget alerts dedup through a UNIQUE constraint,
//! the other jobs through the `notification_exists_*` queries.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    BudgetThreshold, Notification, NotificationKind, OutboxEmail, OutboxStatus, Priority,
};

impl Database {
    /// Create a notification dated `created_on`
    ///
    /// `created_on` is the caller's logical day, not the insertion time.
    /// Jobs replayed for a past date dedup against that date, so a catch-up
    /// run behaves exactly like the run it replaces.
    pub fn create_notification(
        &self,
        user_id: i64,
        title: &str,
        message: &str,
        kind: NotificationKind,
        priority: Priority,
        created_on: NaiveDate,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO notifications (user_id, title, message, kind, priority, created_on)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                title,
                message,
                kind.as_str(),
                priority.as_str(),
                created_on.to_string()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's notifications, newest first
    pub fn list_notifications(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        let conn = self.conn()?;
        let filter = if unread_only { "AND is_read = 0" } else { "" };
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? {} ORDER BY created_at DESC, id DESC",
            SELECT_NOTIFICATION, filter
        ))?;

        let notifications = stmt
            .query_map(params![user_id], Self::row_to_notification)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notifications)
    }

    /// Count a user's unread notifications
    pub fn count_unread_notifications(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Whether this exact notification was already created on `today`
    ///
    /// Dedup key for bill reminders: one per (user, title, calendar day).
    pub fn notification_exists_today(
        &self,
        user_id: i64,
        kind: NotificationKind,
        title: &str,
        today: NaiveDate,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE user_id = ? AND kind = ? AND title = ? AND created_on = ?
            "#,
            params![user_id, kind.as_str(), title, today.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether this exact notification has ever been created
    ///
    /// Dedup key for goal milestones and monthly summaries, whose titles
    /// already carry the milestone or month.
    pub fn notification_title_exists(
        &self,
        user_id: i64,
        kind: NotificationKind,
        title: &str,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND kind = ? AND title = ?",
            params![user_id, kind.as_str(), title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether any notification of this kind is dated on or after `since`
    ///
    /// Dedup key for unusual spending: at most one per trailing week.
    pub fn notification_exists_since(
        &self,
        user_id: i64,
        kind: NotificationKind,
        since: NaiveDate,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE user_id = ? AND kind = ? AND created_on >= ?
            "#,
            params![user_id, kind.as_str(), since.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Mark one notification read
    pub fn mark_notification_read(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?",
            params![id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("notification {}", id)));
        }
        Ok(())
    }

    /// Mark all of a user's notifications read, returning how many changed
    pub fn mark_all_notifications_read(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
            params![user_id],
        )?;
        Ok(changed)
    }

    /// Delete a notification
    pub fn delete_notification(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM notifications WHERE id = ?", params![id])?;

        if changed == 0 {
            return Err(Error::NotFound(format!("notification {}", id)));
        }
        Ok(())
    }

    /// Record a budget alert, returning whether it was fresh
    ///
    /// The UNIQUE(budget_id, alert_type) constraint makes this idempotent:
    /// a repeat insert is ignored and reports `false`, and the caller skips
    /// the notification.
    pub fn record_budget_alert(&self, budget_id: i64, threshold: BudgetThreshold) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO budget_alerts (budget_id, alert_type) VALUES (?, ?)",
            params![budget_id, threshold.as_str()],
        )?;
        Ok(inserted > 0)
    }

    /// Queue an email for the outbox worker
    pub fn enqueue_email(&self, user_id: i64, subject: &str, body: &str) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO email_outbox (user_id, subject, body) VALUES (?, ?, ?)",
            params![user_id, subject, body],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Oldest queued emails, up to `limit`
    pub fn list_queued_emails(&self, limit: i64) -> Result<Vec<OutboxEmail>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE status = 'queued' ORDER BY id LIMIT ?",
            SELECT_EMAIL
        ))?;

        let emails = stmt
            .query_map(params![limit], Self::row_to_email)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(emails)
    }

    /// Mark an outbox email sent
    ///
    /// sent_at is written in SQLite's own datetime format so it reads back
    /// unchanged through `parse_datetime`.
    pub fn mark_email_sent(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE email_outbox SET status = 'sent', sent_at = datetime('now'), error = NULL \
             WHERE id = ?",
            params![id],
        )?;
        Ok(())
    }

    /// Mark an outbox email failed, keeping the delivery error
    ///
    /// Failed emails stay in the table for inspection; there is no retry.
    pub fn mark_email_failed(&self, id: i64, error: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE email_outbox SET status = 'failed', error = ? WHERE id = ?",
            params![error, id],
        )?;
        Ok(())
    }

    /// Get a single outbox email by ID
    pub fn get_outbox_email(&self, id: i64) -> Result<Option<OutboxEmail>> {
        let conn = self.conn()?;
        let email = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_EMAIL),
                params![id],
                Self::row_to_email,
            )
            .optional()?;

        Ok(email)
    }

    fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
        let kind_str: String = row.get(4)?;
        let priority_str: String = row.get(5)?;
        let created_at_str: String = row.get(7)?;
        Ok(Notification {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            message: row.get(3)?,
            kind: kind_str.parse().unwrap_or(NotificationKind::BudgetAlert),
            priority: priority_str.parse().unwrap_or_default(),
            is_read: row.get(6)?,
            created_at: parse_datetime(&created_at_str),
        })
    }

    fn row_to_email(row: &rusqlite::Row) -> rusqlite::Result<OutboxEmail> {
        let status_str: String = row.get(4)?;
        let created_at_str: String = row.get(6)?;
        let sent_at_str: Option<String> = row.get(7)?;
        Ok(OutboxEmail {
            id: row.get(0)?,
            user_id: row.get(1)?,
            subject: row.get(2)?,
            body: row.get(3)?,
            status: status_str.parse().unwrap_or_default(),
            error: row.get(5)?,
            created_at: parse_datetime(&created_at_str),
            sent_at: sent_at_str.map(|s| parse_datetime(&s)),
        })
    }
}

const SELECT_NOTIFICATION: &str = r#"
    SELECT id, user_id, title, message, kind, priority, is_read, created_at
    FROM notifications
"#;

const SELECT_EMAIL: &str = r#"
    SELECT id, user_id, subject, body, status, error, created_at, sent_at
    FROM email_outbox
"#;
