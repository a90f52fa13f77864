//! Transaction, split, and category handlers
//!
//! Creation, update, and deletion all route through the ledger engine in
//! core, so account balances stay consistent with the stored rows.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse, UserQuery, MAX_PAGE_LIMIT};
use tally_core::models::{
    Category, NewTransaction, Transaction, TransactionSplit, TransactionTemplate,
};

#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    #[serde(default = "crate::default_user_id")]
    pub user_id: i64,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/transactions - List the user's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let limit = query.limit.unwrap_or(100).clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let txs = state.db.list_transactions(query.user_id, limit, offset)?;
    Ok(Json(txs))
}

/// POST /api/transactions - Create a transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    if req.amount <= 0.0 {
        return Err(AppError::bad_request("Amount must be positive"));
    }

    let id = state.db.create_transaction(&req)?;
    let tx = state
        .db
        .get_transaction(id)?
        .ok_or_else(|| AppError::not_found("Transaction not found after creation"))?;
    Ok(Json(tx))
}

/// GET /api/transactions/:id - Get a single transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    let tx = state
        .db
        .get_transaction(id)?
        .ok_or_else(|| AppError::not_found(&format!("Transaction {} not found", id)))?;
    Ok(Json(tx))
}

/// PUT /api/transactions/:id - Replace a transaction
///
/// The old balance effect is reversed and the new one applied, so moving a
/// transaction between accounts refunds one and debits the other.
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    if req.amount <= 0.0 {
        return Err(AppError::bad_request("Amount must be positive"));
    }

    state.db.update_transaction(id, &req)?;
    let tx = state
        .db
        .get_transaction(id)?
        .ok_or_else(|| AppError::not_found(&format!("Transaction {} not found", id)))?;
    Ok(Json(tx))
}

/// DELETE /api/transactions/:id - Delete a transaction, reversing its effect
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_transaction(id)?;
    Ok(Json(SuccessResponse::ok()))
}

/// Request body for adding a split
#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    pub category_id: Option<i64>,
    pub amount: f64,
}

/// GET /api/transactions/:id/splits - List a transaction's splits
pub async fn list_splits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TransactionSplit>>, AppError> {
    let splits = state.db.list_splits(id)?;
    Ok(Json(splits))
}

/// POST /api/transactions/:id/splits - Add a category split
pub async fn add_split(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SplitRequest>,
) -> Result<Json<TransactionSplit>, AppError> {
    state
        .db
        .get_transaction(id)?
        .ok_or_else(|| AppError::not_found(&format!("Transaction {} not found", id)))?;

    let split_id = state.db.add_split(id, req.category_id, req.amount)?;
    let split = state
        .db
        .list_splits(id)?
        .into_iter()
        .find(|s| s.id == split_id)
        .ok_or_else(|| AppError::not_found("Split not found after creation"))?;
    Ok(Json(split))
}

/// PUT /api/splits/:id - Change a split's category or amount
pub async fn update_split(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SplitRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.update_split(id, req.category_id, req.amount)?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/splits/:id - Remove a split
pub async fn delete_split(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_split(id)?;
    Ok(Json(SuccessResponse::ok()))
}

/// Request body for creating a template
#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    #[serde(default = "crate::default_user_id")]
    pub user_id: i64,
    pub name: String,
    pub amount: f64,
    pub kind: tally_core::models::TransactionKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: String,
}

/// GET /api/templates - List the user's transaction templates
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<TransactionTemplate>>, AppError> {
    let templates = state.db.list_templates(user.user_id)?;
    Ok(Json(templates))
}

/// POST /api/templates - Create a template
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<TransactionTemplate>, AppError> {
    let id = state.db.create_template(&TransactionTemplate {
        id: 0,
        user_id: req.user_id,
        name: req.name,
        amount: req.amount,
        kind: req.kind,
        category_id: req.category_id,
        account_id: req.account_id,
        description: req.description,
        tags: req.tags,
        use_count: 0,
    })?;

    let template = state
        .db
        .list_templates(req.user_id)?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| AppError::not_found("Template not found after creation"))?;
    Ok(Json(template))
}

/// POST /api/templates/:id/use - Spawn a transaction from a template
pub async fn use_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    let today = chrono::Utc::now().date_naive();
    let tx_id = state.db.use_template(id, today)?;
    let tx = state
        .db
        .get_transaction(tx_id)?
        .ok_or_else(|| AppError::not_found("Transaction not found after creation"))?;
    Ok(Json(tx))
}

/// DELETE /api/templates/:id - Delete a template
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_template(id)?;
    Ok(Json(SuccessResponse::ok()))
}

/// Request body for creating a category
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

/// GET /api/categories - List all categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.db.list_categories()?;
    Ok(Json(categories))
}

/// POST /api/categories - Create (or fetch) a category by name
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Category name is required"));
    }

    let id = state.db.get_or_create_category(name)?;
    Ok(Json(Category {
        id,
        name: name.to_string(),
    }))
}
