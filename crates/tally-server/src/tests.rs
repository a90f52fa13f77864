//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use http_body_util::BodyExt;
use tally_core::db::Database;
use tally_core::models::{
    AccountType, BillFrequency, NewBill, NewRecurringRule, NewTransaction, NotificationKind,
    Priority, RecurringFrequency, TransactionKind,
};
use tower::ServiceExt;

/// Test app with one user ("alice", id 1) so the default user_id resolves
fn setup() -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    db.upsert_user("alice", Some("alice@example.com")).unwrap();
    (create_router(db.clone()), db)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn expense(db: &Database, account_id: i64, amount: f64) -> i64 {
    db.create_transaction(&NewTransaction {
        user_id: 1,
        amount,
        kind: TransactionKind::Expense,
        category_id: None,
        account_id: Some(account_id),
        transfer_account_id: None,
        date: Utc::now().date_naive(),
        description: String::new(),
        tags: String::new(),
    })
    .unwrap()
}

// ========== Account API Tests ==========

#[tokio::test]
async fn test_create_and_list_accounts() {
    let (app, _db) = setup();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/accounts",
            serde_json::json!({
                "name": "Checking",
                "account_type": "bank",
                "balance": 250.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Checking");
    assert_eq!(json["balance"], 250.0);

    let response = app.oneshot(get_request("/api/accounts")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_account_rejects_empty_name() {
    let (app, _db) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/accounts",
            serde_json::json!({ "name": "  ", "account_type": "bank" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_account_not_found() {
    let (app, _db) = setup();

    let response = app.oneshot(get_request("/api/accounts/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

// ========== Transaction API Tests ==========

#[tokio::test]
async fn test_create_transaction_debits_account() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 500.0)
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            serde_json::json!({
                "user_id": 1,
                "amount": 120.0,
                "kind": "expense",
                "account_id": account_id,
                "date": "2025-06-15"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let account = db.get_account(account_id).unwrap().unwrap();
    assert_eq!(account.balance, 380.0);
}

#[tokio::test]
async fn test_create_transaction_rejects_nonpositive_amount() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 500.0)
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            serde_json::json!({
                "user_id": 1,
                "amount": -5.0,
                "kind": "expense",
                "account_id": account_id,
                "date": "2025-06-15"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_transaction_restores_balance() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 500.0)
        .unwrap();
    let tx_id = expense(&db, account_id, 80.0);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/transactions/{}", tx_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let account = db.get_account(account_id).unwrap().unwrap();
    assert_eq!(account.balance, 500.0);
}

#[tokio::test]
async fn test_transfer_moves_between_accounts() {
    let (app, db) = setup();
    let from = db
        .create_account(1, "Checking", AccountType::Bank, 400.0)
        .unwrap();
    let to = db
        .create_account(1, "Savings", AccountType::Bank, 100.0)
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            serde_json::json!({
                "user_id": 1,
                "amount": 150.0,
                "kind": "transfer",
                "account_id": from,
                "transfer_account_id": to,
                "date": "2025-06-15"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(db.get_account(from).unwrap().unwrap().balance, 250.0);
    assert_eq!(db.get_account(to).unwrap().unwrap().balance, 250.0);
}

// ========== Budget API Tests ==========

#[tokio::test]
async fn test_budget_list_includes_spend() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 1000.0)
        .unwrap();
    let category_id = db.get_or_create_category("Groceries").unwrap();

    db.create_budget(1, "Food", category_id, 200.0, None, None)
        .unwrap();
    db.create_transaction(&NewTransaction {
        user_id: 1,
        amount: 50.0,
        kind: TransactionKind::Expense,
        category_id: Some(category_id),
        account_id: Some(account_id),
        transfer_account_id: None,
        date: Utc::now().date_naive(),
        description: String::new(),
        tags: String::new(),
    })
    .unwrap();

    let response = app.oneshot(get_request("/api/budgets")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let budgets = json.as_array().unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0]["spent"], 50.0);
    assert_eq!(budgets[0]["percent_used"], 25.0);
}

#[tokio::test]
async fn test_create_budget_rejects_nonpositive_amount() {
    let (app, db) = setup();
    let category_id = db.get_or_create_category("Groceries").unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/budgets",
            serde_json::json!({
                "name": "Food",
                "category_id": category_id,
                "amount": 0.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Recurring API Tests ==========

#[tokio::test]
async fn test_apply_recurring_endpoint() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 1000.0)
        .unwrap();
    let yesterday = Utc::now().date_naive() - chrono::Duration::days(1);

    db.create_recurring_rule(&NewRecurringRule {
        user_id: 1,
        amount: 15.0,
        kind: TransactionKind::Expense,
        category_id: None,
        account_id: Some(account_id),
        description: "Streaming".to_string(),
        tags: String::new(),
        frequency: RecurringFrequency::Monthly,
        next_date: yesterday,
        end_date: None,
    })
    .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recurring/apply")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["created"], 1);
    assert_eq!(db.get_account(account_id).unwrap().unwrap().balance, 985.0);
}

// ========== Bill API Tests ==========

#[tokio::test]
async fn test_pay_bill_endpoint() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 500.0)
        .unwrap();
    let bill_id = db
        .create_bill(&NewBill {
            user_id: 1,
            name: "Internet".to_string(),
            amount: 60.0,
            category_id: None,
            account_id: Some(account_id),
            due_date: Utc::now().date_naive(),
            frequency: BillFrequency::Monthly,
            description: String::new(),
            reminder_days: 3,
            auto_pay: false,
        })
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/bills/{}/pay", bill_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "paid");
    assert_eq!(db.get_account(account_id).unwrap().unwrap().balance, 440.0);

    // Paying the same instance again conflicts
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/bills/{}/pay", bill_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ========== Goal API Tests ==========

#[tokio::test]
async fn test_goal_contribution_completes_goal() {
    let (app, db) = setup();
    let goal_id = db.create_goal(1, "Vacation", 100.0, None, "").unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/goals/{}/contribute", goal_id),
            serde_json::json!({ "amount": 100.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["progress_percent"], 100.0);

    let response = app
        .oneshot(get_request(&format!("/api/goals/{}", goal_id)))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["contributions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_contribution_rejects_nonpositive_amount() {
    let (app, db) = setup();
    let goal_id = db.create_goal(1, "Vacation", 100.0, None, "").unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/goals/{}/contribute", goal_id),
            serde_json::json!({ "amount": 0.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Notification API Tests ==========

#[tokio::test]
async fn test_notifications_list_and_read_all() {
    let (app, db) = setup();
    db.create_notification(
        1,
        "Budget Alert: Food",
        "You've used 80.0% of your Food budget",
        NotificationKind::BudgetAlert,
        Priority::Medium,
        Utc::now().date_naive(),
    )
    .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/notifications"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["unread_count"], 1);
    assert_eq!(json["notifications"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/notifications/read-all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["marked"], 1);

    let response = app
        .oneshot(get_request("/api/notifications?unread_only=true"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["unread_count"], 0);
    assert!(json["notifications"].as_array().unwrap().is_empty());
}

// ========== Preferences API Tests ==========

#[tokio::test]
async fn test_preferences_update_roundtrip() {
    let (app, _db) = setup();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/preferences",
            serde_json::json!({
                "user_id": 1,
                "email_notifications": true,
                "budget_alerts": false,
                "bill_reminders": true,
                "monthly_reports": true,
                "goal_notifications": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/api/preferences")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["budget_alerts"], false);
    assert_eq!(json["bill_reminders"], true);
}

// ========== Dashboard and Metrics Tests ==========

#[tokio::test]
async fn test_dashboard_stats() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 1000.0)
        .unwrap();
    expense(&db, account_id, 200.0);

    let response = app.oneshot(get_request("/api/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_balance"], 800.0);
    assert_eq!(json["month_expenses"], 200.0);
    assert_eq!(json["account_count"], 1);
}

#[tokio::test]
async fn test_health_score_endpoint_stores_result() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 5000.0)
        .unwrap();
    db.create_transaction(&NewTransaction {
        user_id: 1,
        amount: 2000.0,
        kind: TransactionKind::Income,
        category_id: None,
        account_id: Some(account_id),
        transfer_account_id: None,
        date: Utc::now().date_naive(),
        description: String::new(),
        tags: String::new(),
    })
    .unwrap();
    expense(&db, account_id, 500.0);

    let response = app.oneshot(get_request("/api/health-score")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let score = json["score"].as_i64().unwrap();
    assert!((0..=100).contains(&score));
    assert!(score > 0);

    let stored = db.get_health_score(1).unwrap().unwrap();
    assert_eq!(stored.score, score);
}

#[tokio::test]
async fn test_insights_endpoint() {
    let (app, _db) = setup();

    let response = app.oneshot(get_request("/api/insights")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert!(json.is_array());
}

// ========== CSV Export/Import Tests ==========

#[tokio::test]
async fn test_export_csv() {
    let (app, db) = setup();
    let account_id = db
        .create_account(1, "Checking", AccountType::Bank, 500.0)
        .unwrap();
    expense(&db, account_id, 25.0);

    let response = app.oneshot(get_request("/api/export")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with("date,"));
    assert_eq!(csv.lines().count(), 2);
}

#[tokio::test]
async fn test_import_csv() {
    let (app, db) = setup();
    db.create_account(1, "Checking", AccountType::Bank, 0.0)
        .unwrap();

    let csv = "\
date,time,type,amount,category,account,description,tags,parent_id,is_split,split_category,split_amount
2025-06-01,09:00:00,income,1000.00,Salary,Checking,Paycheck,,,0,,
2025-06-02,12:30:00,expense,40.00,Groceries,Checking,Market,,,0,,
";

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import")
                .header("content-type", "text/csv")
                .body(Body::from(csv))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["imported"], 2);
    assert_eq!(json["skipped"], 0);

    let accounts = db.list_accounts(1).unwrap();
    assert_eq!(accounts[0].balance, 960.0);
}

#[tokio::test]
async fn test_import_rejects_empty_body() {
    let (app, _db) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import")
                .body(Body::from(""))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
