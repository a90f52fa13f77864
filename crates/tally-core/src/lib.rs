//! Tally Core Library
//!
//! Shared functionality for the Tally personal finance tool:
//! - Database access and migrations
//! - Ledger engine keeping account balances consistent with transactions
//! - Recurring rule and bill schedulers
//! - Idempotent notification aggregator jobs
//! - Financial health score and spending insights
//! - CSV export and best-effort import

pub mod db;
pub mod error;
pub mod export;
pub mod jobs;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod schedule;

pub use db::{CategorySpend, DashboardStats, Database, MonthTotals};
pub use error::{Error, Result};
pub use export::ImportSummary;
pub use ledger::{BalanceEffect, Direction};
pub use metrics::{HealthBreakdown, Insight, InsightLevel};
