//! Integration tests over an in-memory database
//!
//! These exercise the ledger protocol, the schedulers, and the aggregator
//! jobs end to end, where the unit tests in each module stay narrow.

use chrono::NaiveDate;

use super::Database;
use crate::jobs;
use crate::models::{
    AccountType, BillFrequency, BillStatus, GoalStatus, NewBill, NewRecurringRule,
    NewTransaction, NotificationKind, RecurringFrequency, TransactionKind,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn tx_on(user_id: i64, account_id: i64, amount: f64, kind: TransactionKind) -> NewTransaction {
    NewTransaction {
        user_id,
        amount,
        kind,
        category_id: None,
        account_id: Some(account_id),
        transfer_account_id: None,
        date: d(2025, 6, 10),
        description: String::new(),
        tags: String::new(),
    }
}

fn balance(db: &Database, account_id: i64) -> f64 {
    db.get_account(account_id).unwrap().unwrap().balance
}

#[test]
fn test_create_expense_debits_account() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("alice", None).unwrap();
    let account_id = db
        .create_account(user_id, "Checking", AccountType::Bank, 500.0)
        .unwrap();

    db.create_transaction(&tx_on(user_id, account_id, 100.0, TransactionKind::Expense))
        .unwrap();
    assert!((balance(&db, account_id) - 400.0).abs() < 1e-9);
}

#[test]
fn test_update_with_identical_snapshot_is_noop() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("alice", None).unwrap();
    let account_id = db
        .create_account(user_id, "Checking", AccountType::Bank, 500.0)
        .unwrap();

    let new = tx_on(user_id, account_id, 100.0, TransactionKind::Expense);
    let id = db.create_transaction(&new).unwrap();
    let after_create = balance(&db, account_id);

    db.update_transaction(id, &new).unwrap();
    assert!((balance(&db, account_id) - after_create).abs() < 1e-9);
}

#[test]
fn test_update_reassigns_entire_effect_across_accounts() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("alice", None).unwrap();
    let a = db
        .create_account(user_id, "A", AccountType::Bank, 600.0)
        .unwrap();
    let b = db
        .create_account(user_id, "B", AccountType::Bank, 500.0)
        .unwrap();

    // $100 expense on A
    let id = db
        .create_transaction(&tx_on(user_id, a, 100.0, TransactionKind::Expense))
        .unwrap();
    assert!((balance(&db, a) - 500.0).abs() < 1e-9);

    // Re-point it at B as a $150 expense: A refunded in full, B debited in full
    db.update_transaction(id, &tx_on(user_id, b, 150.0, TransactionKind::Expense))
        .unwrap();
    assert!((balance(&db, a) - 600.0).abs() < 1e-9);
    assert!((balance(&db, b) - 350.0).abs() < 1e-9);
}

#[test]
fn test_delete_reverses_balance_effect() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("alice", None).unwrap();
    let account_id = db
        .create_account(user_id, "Checking", AccountType::Bank, 500.0)
        .unwrap();

    let id = db
        .create_transaction(&tx_on(user_id, account_id, 200.0, TransactionKind::Income))
        .unwrap();
    assert!((balance(&db, account_id) - 700.0).abs() < 1e-9);

    db.delete_transaction(id).unwrap();
    assert!((balance(&db, account_id) - 500.0).abs() < 1e-9);
}

#[test]
fn test_transfer_moves_both_legs_or_neither() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("alice", None).unwrap();
    let from = db
        .create_account(user_id, "From", AccountType::Bank, 300.0)
        .unwrap();
    let to = db
        .create_account(user_id, "To", AccountType::Bank, 100.0)
        .unwrap();

    let mut transfer = tx_on(user_id, from, 50.0, TransactionKind::Transfer);
    transfer.transfer_account_id = Some(to);
    db.create_transaction(&transfer).unwrap();
    assert!((balance(&db, from) - 250.0).abs() < 1e-9);
    assert!((balance(&db, to) - 150.0).abs() < 1e-9);

    // Missing leg: no mutation at all
    let half = tx_on(user_id, from, 50.0, TransactionKind::Transfer);
    db.create_transaction(&half).unwrap();
    assert!((balance(&db, from) - 250.0).abs() < 1e-9);
}

#[test]
fn test_recurring_catch_up_produces_exact_count() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("bob", None).unwrap();
    let account_id = db
        .create_account(user_id, "Checking", AccountType::Bank, 1000.0)
        .unwrap();

    // Three weekly periods behind
    db.create_recurring_rule(&NewRecurringRule {
        user_id,
        amount: 10.0,
        kind: TransactionKind::Expense,
        category_id: None,
        account_id: Some(account_id),
        description: "gym".into(),
        tags: String::new(),
        frequency: RecurringFrequency::Weekly,
        next_date: d(2025, 6, 1),
        end_date: None,
    })
    .unwrap();

    let created = jobs::apply_recurring(&db, d(2025, 6, 15)).unwrap();
    assert_eq!(created, 3);
    assert!((balance(&db, account_id) - 970.0).abs() < 1e-9);

    // Cursor landed past today; a rerun creates nothing
    let created = jobs::apply_recurring(&db, d(2025, 6, 15)).unwrap();
    assert_eq!(created, 0);

    let rule = db.list_recurring_rules(user_id).unwrap().remove(0);
    assert_eq!(rule.next_date, d(2025, 6, 22));
}

#[test]
fn test_recurring_deactivates_past_end_date() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("bob", None).unwrap();

    db.create_recurring_rule(&NewRecurringRule {
        user_id,
        amount: 5.0,
        kind: TransactionKind::Expense,
        category_id: None,
        account_id: None,
        description: String::new(),
        tags: String::new(),
        frequency: RecurringFrequency::Daily,
        next_date: d(2025, 6, 1),
        end_date: Some(d(2025, 6, 2)),
    })
    .unwrap();

    let created = jobs::apply_recurring(&db, d(2025, 6, 10)).unwrap();
    assert_eq!(created, 2);

    let rule = db.list_recurring_rules(user_id).unwrap().remove(0);
    assert!(!rule.active);
}

#[test]
fn test_budget_alert_fires_once_across_reruns() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("carol", None).unwrap();
    let category_id = db.get_or_create_category("Dining").unwrap();
    let today = d(2025, 6, 15);

    db.create_budget(user_id, "Dining", category_id, 100.0, None, None)
        .unwrap();
    db.create_transaction(&NewTransaction {
        user_id,
        amount: 80.0,
        kind: TransactionKind::Expense,
        category_id: Some(category_id),
        account_id: None,
        transfer_account_id: None,
        date: today,
        description: String::new(),
        tags: String::new(),
    })
    .unwrap();

    // 80% crosses only the 75 threshold
    assert_eq!(jobs::check_budget_alerts(&db, today).unwrap(), 1);
    assert_eq!(jobs::check_budget_alerts(&db, today).unwrap(), 0);

    let notifications = db.list_notifications(user_id, false).unwrap();
    let alerts: Vec<_> = notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::BudgetAlert)
        .collect();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].message.contains("80.0%"));
}

#[test]
fn test_budget_alert_escalates_to_higher_threshold() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("carol", None).unwrap();
    let category_id = db.get_or_create_category("Dining").unwrap();
    let today = d(2025, 6, 15);

    db.create_budget(user_id, "Dining", category_id, 100.0, None, None)
        .unwrap();
    let spend = |amount: f64| {
        db.create_transaction(&NewTransaction {
            user_id,
            amount,
            kind: TransactionKind::Expense,
            category_id: Some(category_id),
            account_id: None,
            transfer_account_id: None,
            date: today,
            description: String::new(),
            tags: String::new(),
        })
        .unwrap();
    };

    spend(60.0);
    assert_eq!(jobs::check_budget_alerts(&db, today).unwrap(), 1);

    // Crossing 100% fires the new threshold, but only the highest one
    spend(45.0);
    assert_eq!(jobs::check_budget_alerts(&db, today).unwrap(), 1);
    assert_eq!(jobs::check_budget_alerts(&db, today).unwrap(), 0);
}

#[test]
fn test_bill_reminder_dedups_within_a_day() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("dave", None).unwrap();
    let today = d(2025, 6, 15);

    db.create_bill(&NewBill {
        user_id,
        name: "Rent".into(),
        amount: 900.0,
        category_id: None,
        account_id: None,
        due_date: d(2025, 6, 17),
        frequency: BillFrequency::Monthly,
        description: String::new(),
        reminder_days: 3,
        auto_pay: false,
    })
    .unwrap();

    assert_eq!(jobs::check_bill_reminders(&db, today).unwrap(), 1);
    assert_eq!(jobs::check_bill_reminders(&db, today).unwrap(), 0);

    // Dedup keys on the run's own day, so the next day reminds again
    assert_eq!(jobs::check_bill_reminders(&db, d(2025, 6, 16)).unwrap(), 1);

    let reminders: Vec<_> = db
        .list_notifications(user_id, false)
        .unwrap()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::BillReminder)
        .collect();
    assert_eq!(reminders.len(), 2);
}

#[test]
fn test_overdue_bill_flips_status_and_goes_urgent() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("dave", None).unwrap();
    let today = d(2025, 6, 15);

    let bill_id = db
        .create_bill(&NewBill {
            user_id,
            name: "Electric".into(),
            amount: 120.0,
            category_id: None,
            account_id: None,
            due_date: d(2025, 6, 12),
            frequency: BillFrequency::Monthly,
            description: String::new(),
            reminder_days: 3,
            auto_pay: false,
        })
        .unwrap();

    jobs::check_bill_reminders(&db, today).unwrap();

    let bill = db.get_bill(bill_id).unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Overdue);

    let notification = db.list_notifications(user_id, false).unwrap().remove(0);
    assert_eq!(notification.priority, crate::models::Priority::Urgent);
    assert!(notification.message.contains("3 days overdue"));
}

#[test]
fn test_pay_bill_spawns_exactly_one_successor() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("erin", None).unwrap();
    let account_id = db
        .create_account(user_id, "Checking", AccountType::Bank, 1000.0)
        .unwrap();
    let today = d(2025, 6, 15);

    let bill_id = db
        .create_bill(&NewBill {
            user_id,
            name: "Internet".into(),
            amount: 60.0,
            category_id: None,
            account_id: Some(account_id),
            due_date: d(2025, 6, 20),
            frequency: BillFrequency::Monthly,
            description: String::new(),
            reminder_days: 3,
            auto_pay: false,
        })
        .unwrap();

    jobs::pay_bill(&db, bill_id, today).unwrap();

    assert!((balance(&db, account_id) - 940.0).abs() < 1e-9);
    assert_eq!(
        db.get_bill(bill_id).unwrap().unwrap().status,
        BillStatus::Paid
    );

    let bills = db.list_bills(user_id).unwrap();
    assert_eq!(bills.len(), 2);
    let successor = bills
        .iter()
        .find(|b| b.status == BillStatus::Pending)
        .unwrap();
    assert_eq!(successor.due_date, d(2025, 7, 20));

    // Paying twice is rejected
    assert!(jobs::pay_bill(&db, bill_id, today).is_err());
}

#[test]
fn test_pay_once_bill_has_no_successor() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("erin", None).unwrap();

    let bill_id = db
        .create_bill(&NewBill {
            user_id,
            name: "Car registration".into(),
            amount: 150.0,
            category_id: None,
            account_id: None,
            due_date: d(2025, 6, 20),
            frequency: BillFrequency::Once,
            description: String::new(),
            reminder_days: 3,
            auto_pay: false,
        })
        .unwrap();

    jobs::pay_bill(&db, bill_id, d(2025, 6, 15)).unwrap();
    assert_eq!(db.list_bills(user_id).unwrap().len(), 1);
}

#[test]
fn test_goal_completion_fires_exactly_once() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("fay", None).unwrap();
    let today = d(2025, 6, 15);

    let goal_id = db.create_goal(user_id, "Vacation", 200.0, None, "").unwrap();
    let goal = db
        .add_contribution(goal_id, 200.0, today, "windfall")
        .unwrap();
    assert_eq!(goal.status, GoalStatus::Completed);
    assert!(goal.completed_at.is_some());

    // The milestone job sees a completed goal and adds nothing
    assert_eq!(jobs::check_goal_milestones(&db, today).unwrap(), 0);

    // A later contribution never re-completes
    let completed_at = goal.completed_at;
    let goal = db.add_contribution(goal_id, 50.0, today, "").unwrap();
    assert_eq!(goal.completed_at, completed_at);
}

#[test]
fn test_goal_milestones_fire_once_per_threshold() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("fay", None).unwrap();
    let today = d(2025, 6, 15);

    let goal_id = db.create_goal(user_id, "House", 1000.0, None, "").unwrap();
    db.add_contribution(goal_id, 600.0, today, "").unwrap();

    // 60% progress crosses the 25 and 50 milestones
    assert_eq!(jobs::check_goal_milestones(&db, today).unwrap(), 2);
    assert_eq!(jobs::check_goal_milestones(&db, today).unwrap(), 0);

    db.add_contribution(goal_id, 200.0, today, "").unwrap();
    assert_eq!(jobs::check_goal_milestones(&db, today).unwrap(), 1);
}

#[test]
fn test_unusual_spending_alerts_once_per_week() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("gus", None).unwrap();
    let today = d(2025, 6, 30);

    let spend = |date: NaiveDate, amount: f64| {
        db.create_transaction(&NewTransaction {
            user_id,
            amount,
            kind: TransactionKind::Expense,
            category_id: None,
            account_id: None,
            transfer_account_id: None,
            date,
            description: String::new(),
            tags: String::new(),
        })
        .unwrap();
    };

    // Quiet baseline, then a hot week
    spend(d(2025, 6, 5), 23.0);
    spend(d(2025, 6, 26), 100.0);
    spend(d(2025, 6, 28), 100.0);

    assert_eq!(jobs::detect_unusual_spending(&db, today).unwrap(), 1);
    assert_eq!(jobs::detect_unusual_spending(&db, today).unwrap(), 0);
}

#[test]
fn test_monthly_report_only_on_the_first() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("hal", Some("hal@example.com")).unwrap();

    db.create_transaction(&NewTransaction {
        user_id,
        amount: 1000.0,
        kind: TransactionKind::Income,
        category_id: None,
        account_id: None,
        transfer_account_id: None,
        date: d(2025, 5, 20),
        description: String::new(),
        tags: String::new(),
    })
    .unwrap();

    assert_eq!(jobs::generate_monthly_reports(&db, d(2025, 6, 15)).unwrap(), 0);
    assert_eq!(jobs::generate_monthly_reports(&db, d(2025, 6, 1)).unwrap(), 1);
    // Idempotent on the same first-of-month
    assert_eq!(jobs::generate_monthly_reports(&db, d(2025, 6, 1)).unwrap(), 0);

    let notification = db.list_notifications(user_id, false).unwrap().remove(0);
    assert_eq!(notification.kind, NotificationKind::MonthlySummary);
    assert!(notification.title.contains("May 2025"));
    assert!(notification.message.contains("Income: $1000.00"));

    // Report queues an email for delivery
    assert_eq!(db.list_queued_emails(10).unwrap().len(), 1);
}

#[test]
fn test_health_scores_upsert_in_place() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("iris", None).unwrap();
    let today = d(2025, 6, 15);

    jobs::recalculate_health_scores(&db, today).unwrap();
    let first = db.get_health_score(user_id).unwrap().unwrap();

    db.create_transaction(&NewTransaction {
        user_id,
        amount: 1000.0,
        kind: TransactionKind::Income,
        category_id: None,
        account_id: None,
        transfer_account_id: None,
        date: today,
        description: String::new(),
        tags: String::new(),
    })
    .unwrap();

    jobs::recalculate_health_scores(&db, today).unwrap();
    let second = db.get_health_score(user_id).unwrap().unwrap();
    assert!(second.score > first.score);
}

#[test]
fn test_preferences_gate_emails_not_notifications() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("june", None).unwrap();
    let category_id = db.get_or_create_category("Dining").unwrap();
    let today = d(2025, 6, 15);

    let mut prefs = db.get_preferences(user_id).unwrap();
    prefs.email_notifications = false;
    db.set_preferences(&prefs).unwrap();

    db.create_budget(user_id, "Dining", category_id, 100.0, None, None)
        .unwrap();
    db.create_transaction(&NewTransaction {
        user_id,
        amount: 120.0,
        kind: TransactionKind::Expense,
        category_id: Some(category_id),
        account_id: None,
        transfer_account_id: None,
        date: today,
        description: String::new(),
        tags: String::new(),
    })
    .unwrap();

    assert_eq!(jobs::check_budget_alerts(&db, today).unwrap(), 1);
    assert_eq!(db.list_notifications(user_id, false).unwrap().len(), 1);
    assert!(db.list_queued_emails(10).unwrap().is_empty());
}

#[test]
fn test_email_outbox_lifecycle() {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("kim", None).unwrap();

    let id = db.enqueue_email(user_id, "subject", "body").unwrap();
    assert_eq!(db.list_queued_emails(10).unwrap().len(), 1);

    db.mark_email_failed(id, "connection refused").unwrap();
    assert!(db.list_queued_emails(10).unwrap().is_empty());
    let email = db.get_outbox_email(id).unwrap().unwrap();
    assert_eq!(email.error.as_deref(), Some("connection refused"));

    db.mark_email_sent(id).unwrap();
    let email = db.get_outbox_email(id).unwrap().unwrap();
    assert!(email.sent_at.is_some());
    assert_eq!(email.error, None);

    // The stored timestamp reads back as-is, not re-stamped per read
    let reread = db.get_outbox_email(id).unwrap().unwrap();
    assert_eq!(reread.sent_at, email.sent_at);
}

#[test]
fn test_delete_missing_rows_reports_not_found() {
    let db = Database::in_memory().unwrap();
    assert!(db.delete_account(9999).is_err());
    assert!(db.delete_bill(9999).is_err());
    assert!(db.delete_goal(9999).is_err());
}
