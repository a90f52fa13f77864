//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A user of the tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-user notification preferences
///
/// Every flag defaults to on. Email delivery additionally requires
/// `email_notifications`; the per-feature flags gate notification creation
/// for the matching job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: i64,
    pub email_notifications: bool,
    pub budget_alerts: bool,
    pub bill_reminders: bool,
    pub monthly_reports: bool,
    pub goal_notifications: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            user_id: 0,
            email_notifications: true,
            budget_alerts: true,
            bill_reminders: true,
            monthly_reports: true,
            goal_notifications: true,
        }
    }
}

/// A money account (wallet, bank account, card, mobile money)
///
/// `balance` is owned by the ledger: it only changes when a transaction is
/// created, updated, or deleted. Nothing else writes to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub account_type: AccountType,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

/// Account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Cash,
    Bank,
    Card,
    Mobile,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::Card => "card",
            Self::Mobile => "mobile",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "card" => Ok(Self::Card),
            "mobile" => Ok(Self::Mobile),
            _ => Err(format!("Unknown account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spending category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Transaction kind - direction of the money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Expense,
    Income,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded transaction
///
/// `amount` is always positive; `kind` decides the signed effect on the
/// attached accounts. `transfer_account_id` is the destination leg of a
/// transfer and is ignored for other kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub transfer_account_id: Option<i64>,
    pub date: NaiveDate,
    pub description: String,
    pub tags: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating or updating a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: i64,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub transfer_account_id: Option<i64>,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: String,
}

/// A category split within a transaction
///
/// Splits partition a transaction's category attribution for reporting.
/// Their sum is not reconciled against the parent amount and they never
/// touch account balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSplit {
    pub id: i64,
    pub transaction_id: i64,
    pub category_id: Option<i64>,
    pub amount: f64,
}

/// A spending budget for one category over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub category_id: i64,
    pub amount: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Recurring rule frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurringFrequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl RecurringFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for RecurringFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for RecurringFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A template that spawns concrete transactions on a schedule
///
/// `next_date` is the cursor: the scheduler creates one transaction per due
/// date and advances it until it lands in the future.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub description: String,
    pub tags: String,
    pub frequency: RecurringFrequency,
    pub next_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating or replacing a recurring rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecurringRule {
    pub user_id: i64,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: String,
    pub frequency: RecurringFrequency,
    pub next_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Bill frequency (includes one-time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillFrequency {
    Once,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BillFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for BillFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "once" | "one-time" => Ok(Self::Once),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown bill frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for BillFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bill lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }
}

impl std::str::FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            _ => Err(format!("Unknown bill status: {}", s)),
        }
    }
}

/// A bill with a due date and optional recurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub amount: f64,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub due_date: NaiveDate,
    pub frequency: BillFrequency,
    pub status: BillStatus,
    pub description: String,
    /// Days before the due date to start reminding
    pub reminder_days: i64,
    pub auto_pay: bool,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Days until the due date; negative when overdue.
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }
}

/// Payload for creating or replacing a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    pub user_id: i64,
    pub name: String,
    pub amount: f64,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub due_date: NaiveDate,
    pub frequency: BillFrequency,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_reminder_days")]
    pub reminder_days: i64,
    #[serde(default)]
    pub auto_pay: bool,
}

fn default_reminder_days() -> i64 {
    3
}

/// Savings goal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Paused => "paused",
        }
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "paused" => Ok(Self::Paused),
            _ => Err(format!("Unknown goal status: {}", s)),
        }
    }
}

/// A savings goal with an append-only contribution history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub description: String,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SavingsGoal {
    /// Progress toward the target, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount > 0.0 {
            (self.current_amount / self.target_amount * 100.0).min(100.0)
        } else {
            0.0
        }
    }

    /// Amount still needed, floored at zero.
    pub fn remaining_amount(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }
}

/// A single contribution toward a savings goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalContribution {
    pub id: i64,
    pub goal_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BudgetAlert,
    BillReminder,
    GoalMilestone,
    UnusualSpending,
    MonthlySummary,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetAlert => "budget_alert",
            Self::BillReminder => "bill_reminder",
            Self::GoalMilestone => "goal_milestone",
            Self::UnusualSpending => "unusual_spending",
            Self::MonthlySummary => "monthly_summary",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "budget_alert" => Ok(Self::BudgetAlert),
            "bill_reminder" => Ok(Self::BillReminder),
            "goal_milestone" => Ok(Self::GoalMilestone),
            "unusual_spending" => Ok(Self::UnusualSpending),
            "monthly_summary" => Ok(Self::MonthlySummary),
            _ => Err(format!("Unknown notification kind: {}", s)),
        }
    }
}

/// Notification priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// An append-only per-user notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority: Priority,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Budget alert threshold
///
/// Ordered descending so the highest crossed threshold can be picked with a
/// single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetThreshold {
    Exceeded,
    Ninety,
    SeventyFive,
    Fifty,
}

impl BudgetThreshold {
    /// All thresholds, highest first.
    pub const DESCENDING: [BudgetThreshold; 4] = [
        Self::Exceeded,
        Self::Ninety,
        Self::SeventyFive,
        Self::Fifty,
    ];

    pub fn percent(&self) -> f64 {
        match self {
            Self::Exceeded => 100.0,
            Self::Ninety => 90.0,
            Self::SeventyFive => 75.0,
            Self::Fifty => 50.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exceeded => "100_percent",
            Self::Ninety => "90_percent",
            Self::SeventyFive => "75_percent",
            Self::Fifty => "50_percent",
        }
    }
}

/// Per-user financial health score, recomputed in place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScore {
    pub user_id: i64,
    /// 0-100
    pub score: i64,
    /// Percentage of income kept this month
    pub savings_rate: f64,
    /// Average percent-under-budget across all budgets
    pub budget_adherence: f64,
    /// Months of expenses covered by total balances
    pub emergency_fund_months: f64,
    pub calculated_at: DateTime<Utc>,
}

/// Email delivery status in the outbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    #[default]
    Queued,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown outbox status: {}", s)),
        }
    }
}

/// An email queued for asynchronous delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEmail {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub body: String,
    pub status: OutboxStatus,
    /// Status message from the last delivery attempt
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// A reusable transaction template (one-tap entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionTemplate {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub description: String,
    pub tags: String,
    pub use_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_goal_progress_caps_at_100() {
        let goal = SavingsGoal {
            id: 1,
            user_id: 1,
            name: "Vacation".into(),
            target_amount: 100.0,
            current_amount: 250.0,
            target_date: None,
            description: String::new(),
            status: GoalStatus::Active,
            created_at: Utc::now(),
            completed_at: None,
        };
        assert_eq!(goal.progress_percent(), 100.0);
        assert_eq!(goal.remaining_amount(), 0.0);
    }

    #[test]
    fn test_goal_progress_zero_target() {
        let goal = SavingsGoal {
            id: 1,
            user_id: 1,
            name: "Empty".into(),
            target_amount: 0.0,
            current_amount: 10.0,
            target_date: None,
            description: String::new(),
            status: GoalStatus::Active,
            created_at: Utc::now(),
            completed_at: None,
        };
        assert_eq!(goal.progress_percent(), 0.0);
    }

    #[test]
    fn test_bill_days_until_due() {
        let bill = Bill {
            id: 1,
            user_id: 1,
            name: "Rent".into(),
            amount: 1200.0,
            category_id: None,
            account_id: None,
            due_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            frequency: BillFrequency::Monthly,
            status: BillStatus::Pending,
            description: String::new(),
            reminder_days: 3,
            auto_pay: false,
            created_at: Utc::now(),
        };
        let today = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
        assert_eq!(bill.days_until_due(today), 3);
        let late = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(bill.days_until_due(late), -2);
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!(
            "transfer".parse::<TransactionKind>().unwrap(),
            TransactionKind::Transfer
        );
        assert_eq!(
            "quarterly".parse::<BillFrequency>().unwrap(),
            BillFrequency::Quarterly
        );
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!(
            "goal_milestone".parse::<NotificationKind>().unwrap(),
            NotificationKind::GoalMilestone
        );
    }

    #[test]
    fn test_threshold_order() {
        let percents: Vec<f64> = BudgetThreshold::DESCENDING
            .iter()
            .map(|t| t.percent())
            .collect();
        assert_eq!(percents, vec![100.0, 90.0, 75.0, 50.0]);
    }
}
