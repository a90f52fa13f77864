//! Email delivery behind a trait so the outbox worker stays testable
//!
//! There is no SMTP integration here; deployments plug in their own
//! transport. The default `LogMailer` writes deliveries to the log, which
//! keeps the outbox pipeline observable in development.

use tracing::info;

/// A delivery transport for outbox emails
///
/// `send` returns a status string on failure; the worker records it on the
/// outbox row and moves on.
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Logs deliveries instead of sending them
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), String> {
        info!(to, subject, "Email delivered (log transport)");
        Ok(())
    }
}

#[cfg(test)]
pub struct FailMailer;

#[cfg(test)]
impl Mailer for FailMailer {
    fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), String> {
        Err("connection refused".to_string())
    }
}
