//! Background task scheduler for the periodic jobs and the email outbox
//!
//! Two tickers drive the aggregator jobs:
//!
//! - hourly: budget alerts, bill reminders, goal milestones
//! - daily: recurring rules, health scores, unusual spending, monthly reports
//!
//! Intervals are configurable via environment variables for testing and
//! small deployments:
//!
//! - `TALLY_JOBS_HOURLY_SECS`: hourly tick interval (default 3600)
//! - `TALLY_JOBS_DAILY_SECS`: daily tick interval (default 86400)
//! - `TALLY_OUTBOX_SECS`: outbox drain interval (default 60)

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{info, warn};

use tally_core::db::Database;
use tally_core::jobs;

use crate::mailer::Mailer;

/// How many queued emails one drain pass picks up
const OUTBOX_BATCH: i64 = 50;

/// Scheduler intervals, in seconds
#[derive(Debug, Clone)]
pub struct JobScheduleConfig {
    pub hourly_secs: u64,
    pub daily_secs: u64,
    pub outbox_secs: u64,
}

impl Default for JobScheduleConfig {
    fn default() -> Self {
        Self {
            hourly_secs: 3600,
            daily_secs: 86400,
            outbox_secs: 60,
        }
    }
}

impl JobScheduleConfig {
    /// Read intervals from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            hourly_secs: env_secs("TALLY_JOBS_HOURLY_SECS", default.hourly_secs),
            daily_secs: env_secs("TALLY_JOBS_DAILY_SECS", default.daily_secs),
            outbox_secs: env_secs("TALLY_OUTBOX_SECS", default.outbox_secs),
        }
    }
}

fn env_secs(var: &str, default: u64) -> u64 {
    match std::env::var(var).ok().and_then(|s| s.parse().ok()) {
        Some(0) => {
            warn!("{} is 0, using default {}", var, default);
            default
        }
        Some(secs) => secs,
        None => default,
    }
}

/// Start the periodic job tickers as background tasks
pub fn start_job_scheduler(db: Database, config: JobScheduleConfig) {
    info!(
        hourly_secs = config.hourly_secs,
        daily_secs = config.daily_secs,
        "Starting job scheduler"
    );

    let hourly_db = db.clone();
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(config.hourly_secs));
        // Skip the immediate first tick so startup stays quiet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let today = Utc::now().date_naive();
            if let Err(e) = jobs::run_hourly(&hourly_db, today) {
                warn!(error = %e, "Hourly job batch failed");
            }
        }
    });

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(config.daily_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let today = Utc::now().date_naive();
            if let Err(e) = jobs::run_daily(&db, today) {
                warn!(error = %e, "Daily job batch failed");
            }
        }
    });
}

/// Start the outbox worker as a background task
pub fn start_outbox_worker(db: Database, mailer: Arc<dyn Mailer>, secs: u64) {
    info!(interval_secs = secs, "Starting email outbox worker");

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(secs));
        loop {
            ticker.tick().await;
            if let Err(e) = drain_outbox(&db, mailer.as_ref()) {
                warn!(error = %e, "Outbox drain failed");
            }
        }
    });
}

/// Deliver one batch of queued emails
///
/// Send failures become a status string on the row; they never propagate
/// and are not retried.
pub fn drain_outbox(db: &Database, mailer: &dyn Mailer) -> tally_core::Result<usize> {
    let queued = db.list_queued_emails(OUTBOX_BATCH)?;
    let mut sent = 0;

    for email in queued {
        let address = db
            .get_user(email.user_id)?
            .and_then(|u| u.email)
            .unwrap_or_default();
        if address.is_empty() {
            db.mark_email_failed(email.id, "user has no email address")?;
            continue;
        }

        match mailer.send(&address, &email.subject, &email.body) {
            Ok(()) => {
                db.mark_email_sent(email.id)?;
                sent += 1;
            }
            Err(status) => {
                warn!(email_id = email.id, status = %status, "Email delivery failed");
                db.mark_email_failed(email.id, &status)?;
            }
        }
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::{FailMailer, LogMailer};
    use tally_core::models::OutboxStatus;

    #[test]
    fn test_config_defaults_when_env_unset() {
        std::env::remove_var("TALLY_JOBS_HOURLY_SECS");
        std::env::remove_var("TALLY_JOBS_DAILY_SECS");
        let config = JobScheduleConfig::from_env();
        assert_eq!(config.hourly_secs, 3600);
        assert_eq!(config.daily_secs, 86400);
    }

    #[test]
    fn test_drain_marks_sent_and_failed() {
        let db = Database::in_memory().unwrap();
        let with_email = db.upsert_user("a", Some("a@example.com")).unwrap();
        let without_email = db.upsert_user("b", None).unwrap();
        let e1 = db.enqueue_email(with_email, "s1", "b1").unwrap();
        let e2 = db.enqueue_email(without_email, "s2", "b2").unwrap();

        let sent = drain_outbox(&db, &LogMailer).unwrap();
        assert_eq!(sent, 1);
        assert_eq!(
            db.get_outbox_email(e1).unwrap().unwrap().status,
            OutboxStatus::Sent
        );
        assert_eq!(
            db.get_outbox_email(e2).unwrap().unwrap().status,
            OutboxStatus::Failed
        );
    }

    #[test]
    fn test_send_failure_recorded_not_propagated() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("c", Some("c@example.com")).unwrap();
        let id = db.enqueue_email(user_id, "s", "b").unwrap();

        let sent = drain_outbox(&db, &FailMailer).unwrap();
        assert_eq!(sent, 0);

        let email = db.get_outbox_email(id).unwrap().unwrap();
        assert_eq!(email.status, OutboxStatus::Failed);
        assert_eq!(email.error.as_deref(), Some("connection refused"));
        // Failed rows leave the queue; a second drain sends nothing
        assert_eq!(drain_outbox(&db, &LogMailer).unwrap(), 0);
    }
}
