//! Sample data generation for trying out the app

use anyhow::Result;
use chrono::{Datelike, Duration, Utc};
use tally_core::db::Database;
use tally_core::models::{
    AccountType, BillFrequency, BillStatus, NewBill, NewTransaction, TransactionKind,
    TransactionTemplate,
};

use super::seed_default_categories;

/// Populate the database with a realistic slice of data for `username`
///
/// Safe to point at an existing database: if the user already has
/// accounts the command refuses to add anything.
pub fn cmd_sample_data(db: &Database, username: &str) -> Result<()> {
    let user_id = db.upsert_user(username, Some(&format!("{}@example.com", username)))?;

    if !db.list_accounts(user_id)?.is_empty() {
        println!(
            "User '{}' already has accounts. Skipping sample data.",
            username
        );
        return Ok(());
    }

    println!("Creating sample data for user '{}'...", username);

    seed_default_categories(db)?;
    let category = |name: &str| db.get_or_create_category(name);

    let food = category("Food & Dining")?;
    let transport = category("Transportation")?;
    let shopping = category("Shopping")?;
    let entertainment = category("Entertainment")?;
    let utilities = category("Bills & Utilities")?;
    let healthcare = category("Healthcare")?;
    let education = category("Education")?;
    let salary = category("Salary")?;

    // Accounts
    let checking = db.create_account(user_id, "Checking Account", AccountType::Bank, 2500.0)?;
    let _savings = db.create_account(user_id, "Savings Account", AccountType::Bank, 5000.0)?;
    let card = db.create_account(user_id, "Credit Card", AccountType::Card, -450.0)?;
    let cash = db.create_account(user_id, "Cash Wallet", AccountType::Cash, 150.0)?;
    let _mobile = db.create_account(user_id, "M-Pesa", AccountType::Mobile, 75.0)?;

    // One-tap templates
    let templates = [
        ("Weekly Groceries", TransactionKind::Expense, 85.0, Some(food), Some(checking), "Weekly grocery shopping", "grocery,food,weekly"),
        ("Monthly Rent", TransactionKind::Expense, 1200.0, Some(utilities), Some(checking), "Monthly rent payment", "rent,housing,monthly"),
        ("Coffee Shop", TransactionKind::Expense, 4.5, Some(food), Some(cash), "Daily coffee", "coffee,daily"),
        ("Gas Station", TransactionKind::Expense, 45.0, Some(transport), Some(card), "Fuel for car", "gas,fuel"),
        ("Salary Deposit", TransactionKind::Income, 3500.0, Some(salary), Some(checking), "Monthly salary", "salary,monthly"),
    ];
    for (name, kind, amount, category_id, account_id, description, tags) in templates {
        db.create_template(&TransactionTemplate {
            id: 0,
            user_id,
            name: name.to_string(),
            amount,
            kind,
            category_id,
            account_id,
            description: description.to_string(),
            tags: tags.to_string(),
            use_count: 0,
        })?;
    }

    let today = Utc::now().date_naive();

    // Savings goals with contribution history
    let goals = [
        ("Emergency Fund", 5000.0, 1200.0, 365_i64, "Build 6-month emergency fund"),
        ("Vacation to Europe", 3000.0, 450.0, 180, "Summer vacation trip"),
        ("New Laptop", 1500.0, 800.0, 90, "Laptop for work"),
        ("Car Down Payment", 8000.0, 2100.0, 270, "Down payment for new car"),
    ];
    for (name, target, saved, days_out, description) in goals {
        let goal_id = db.create_goal(
            user_id,
            name,
            target,
            Some(today + Duration::days(days_out)),
            description,
        )?;
        let month_ago = today - Duration::days(30);
        db.add_contribution(goal_id, saved * 0.4, month_ago, "Initial contribution")?;
        db.add_contribution(goal_id, saved * 0.3, month_ago, "Monthly savings")?;
        db.add_contribution(goal_id, saved * 0.3, month_ago, "Bonus money")?;
    }

    // Bills, including one already overdue
    let bills = [
        ("Electric Bill", 120.0, utilities, 5_i64, 3_i64),
        ("Internet Service", 65.0, utilities, 12, 5),
        ("Phone Bill", 45.0, utilities, 8, 3),
        ("Car Insurance", 180.0, transport, 25, 7),
        ("Gym Membership", 35.0, healthcare, 15, 2),
        ("Streaming Service", 15.99, entertainment, 3, 1),
        ("Overdue Credit Card", 250.0, utilities, -5, 3),
    ];
    for (name, amount, category_id, days_out, reminder_days) in bills {
        let bill_id = db.create_bill(&NewBill {
            user_id,
            name: name.to_string(),
            amount,
            category_id: Some(category_id),
            account_id: Some(checking),
            due_date: today + Duration::days(days_out),
            frequency: BillFrequency::Monthly,
            description: String::new(),
            reminder_days,
            auto_pay: false,
        })?;
        if days_out < 0 {
            db.set_bill_status(bill_id, BillStatus::Overdue)?;
        }
    }

    // Recent transactions, applied through the ledger
    let transactions = [
        ("Grocery Store", TransactionKind::Expense, 78.5, Some(food), checking, "grocery,food", -2_i64),
        ("Gas Station", TransactionKind::Expense, 42.0, Some(transport), card, "gas,fuel", -1),
        ("Coffee Shop", TransactionKind::Expense, 4.75, Some(food), cash, "coffee", -1),
        ("Salary", TransactionKind::Income, 3500.0, Some(salary), checking, "salary,monthly", -30),
        ("Freelance Project", TransactionKind::Income, 750.0, Some(salary), checking, "freelance", -15),
        ("Restaurant Dinner", TransactionKind::Expense, 65.0, Some(food), card, "restaurant,dinner", -3),
        ("Online Shopping", TransactionKind::Expense, 125.0, Some(shopping), card, "shopping,online", -5),
        ("Movie Tickets", TransactionKind::Expense, 28.0, Some(entertainment), cash, "movie,weekend", -7),
        ("Pharmacy", TransactionKind::Expense, 15.5, Some(healthcare), checking, "health,medicine", -4),
        ("Book Purchase", TransactionKind::Expense, 22.99, Some(education), card, "books,learning", -10),
    ];
    for (description, kind, amount, category_id, account_id, tags, days_ago) in transactions {
        db.create_transaction(&NewTransaction {
            user_id,
            amount,
            kind,
            category_id,
            account_id: Some(account_id),
            transfer_account_id: None,
            date: today + Duration::days(days_ago),
            description: description.to_string(),
            tags: tags.to_string(),
        })?;
    }

    // Budgets covering the current month
    let first_of_month = today.with_day(1).unwrap_or(today);
    let end_of_window = today.with_day(28).unwrap_or(today);
    let budgets = [
        ("Monthly Food Budget", food, 400.0),
        ("Transportation Budget", transport, 200.0),
        ("Entertainment Budget", entertainment, 150.0),
        ("Shopping Budget", shopping, 300.0),
    ];
    for (name, category_id, amount) in budgets {
        db.create_budget(
            user_id,
            name,
            category_id,
            amount,
            Some(first_of_month),
            Some(end_of_window),
        )?;
    }

    println!("Sample data created:");
    println!("   Accounts:     5");
    println!("   Templates:    {}", templates.len());
    println!("   Goals:        {}", goals.len());
    println!("   Bills:        {}", bills.len());
    println!("   Transactions: {}", transactions.len());
    println!("   Budgets:      {}", budgets.len());
    println!();
    println!("Try 'tally status' or 'tally serve' next.");

    Ok(())
}
