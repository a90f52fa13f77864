//! CLI command tests

use chrono::{Duration, Utc};
use tally_core::db::Database;
use tally_core::models::{
    AccountType, BillStatus, NewRecurringRule, RecurringFrequency, TransactionKind,
};

use crate::commands;

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

#[test]
fn test_seed_default_categories_idempotent() {
    let db = setup_test_db();

    let first = commands::seed_default_categories(&db).unwrap();
    assert_eq!(first, commands::DEFAULT_CATEGORIES.len());

    let second = commands::seed_default_categories(&db).unwrap();
    assert_eq!(second, 0);
}

#[test]
fn test_cmd_sample_data_populates_user() {
    let db = setup_test_db();

    commands::cmd_sample_data(&db, "testuser").unwrap();

    let user_id = db.upsert_user("testuser", None).unwrap();
    assert_eq!(db.list_accounts(user_id).unwrap().len(), 5);
    assert_eq!(db.list_goals(user_id).unwrap().len(), 4);
    assert_eq!(db.list_budgets(user_id).unwrap().len(), 4);

    let bills = db.list_bills(user_id).unwrap();
    assert_eq!(bills.len(), 7);
    assert!(bills.iter().any(|b| b.status == BillStatus::Overdue));

    // Transactions went through the ledger, so balances moved off their seeds
    let checking = db
        .list_accounts(user_id)
        .unwrap()
        .into_iter()
        .find(|a| a.name == "Checking Account")
        .unwrap();
    assert_ne!(checking.balance, 2500.0);
}

#[test]
fn test_cmd_sample_data_skips_populated_user() {
    let db = setup_test_db();

    commands::cmd_sample_data(&db, "testuser").unwrap();
    commands::cmd_sample_data(&db, "testuser").unwrap();

    let user_id = db.upsert_user("testuser", None).unwrap();
    assert_eq!(db.list_accounts(user_id).unwrap().len(), 5);
}

#[test]
fn test_cmd_apply_recurring() {
    let db = setup_test_db();
    let user_id = db.upsert_user("alice", None).unwrap();
    let account_id = db
        .create_account(user_id, "Checking", AccountType::Bank, 100.0)
        .unwrap();

    db.create_recurring_rule(&NewRecurringRule {
        user_id,
        amount: 10.0,
        kind: TransactionKind::Expense,
        category_id: None,
        account_id: Some(account_id),
        description: "Subscription".to_string(),
        tags: String::new(),
        frequency: RecurringFrequency::Weekly,
        next_date: Utc::now().date_naive() - Duration::days(1),
        end_date: None,
    })
    .unwrap();

    commands::cmd_apply_recurring(&db).unwrap();

    assert_eq!(
        db.get_account(account_id).unwrap().unwrap().balance,
        90.0
    );
}

#[test]
fn test_cmd_run_jobs_rejects_unknown_batch() {
    let db = setup_test_db();
    assert!(commands::cmd_run_jobs(&db, "weekly").is_err());
}

#[test]
fn test_import_export_round_trip() {
    let db = setup_test_db();
    let user_id = db.upsert_user("alice", None).unwrap();
    let account_id = db
        .create_account(user_id, "Checking", AccountType::Bank, 0.0)
        .unwrap();

    db.create_transaction(&tally_core::models::NewTransaction {
        user_id,
        amount: 200.0,
        kind: TransactionKind::Income,
        category_id: None,
        account_id: Some(account_id),
        transfer_account_id: None,
        date: Utc::now().date_naive(),
        description: "Paycheck".to_string(),
        tags: String::new(),
    })
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    commands::cmd_export(&db, user_id, Some(&path)).unwrap();

    let exported = std::fs::read_to_string(&path).unwrap();
    assert!(exported.contains("Paycheck"));

    // Import into a second database for a fresh user
    let db2 = setup_test_db();
    let user2 = db2.upsert_user("bob", None).unwrap();
    db2.create_account(user2, "Checking", AccountType::Bank, 0.0)
        .unwrap();

    commands::cmd_import(&db2, user2, &path).unwrap();

    let accounts = db2.list_accounts(user2).unwrap();
    assert_eq!(accounts[0].balance, 200.0);
}
