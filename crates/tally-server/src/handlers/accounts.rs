//! Account management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse, UserQuery};
use tally_core::models::{Account, AccountType};

/// Request body for creating or updating an account
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    pub name: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub balance: f64,
}

/// GET /api/accounts - List the user's accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.db.list_accounts(user.user_id)?;
    Ok(Json(accounts))
}

/// POST /api/accounts - Create an account
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
    Json(req): Json<AccountRequest>,
) -> Result<Json<Account>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("Account name is required"));
    }

    let id = state
        .db
        .create_account(user.user_id, &req.name, req.account_type, req.balance)?;
    let account = state
        .db
        .get_account(id)?
        .ok_or_else(|| AppError::not_found("Account not found after creation"))?;

    Ok(Json(account))
}

/// GET /api/accounts/:id - Get a single account
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Account>, AppError> {
    let account = state
        .db
        .get_account(id)?
        .ok_or_else(|| AppError::not_found(&format!("Account {} not found", id)))?;
    Ok(Json(account))
}

/// PUT /api/accounts/:id - Rename an account or change its type
///
/// The balance field is ignored here; balances only move through
/// transactions.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<AccountRequest>,
) -> Result<Json<Account>, AppError> {
    state.db.update_account(id, &req.name, req.account_type)?;
    let account = state
        .db
        .get_account(id)?
        .ok_or_else(|| AppError::not_found(&format!("Account {} not found", id)))?;
    Ok(Json(account))
}

/// DELETE /api/accounts/:id - Delete an account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_account(id)?;
    Ok(Json(SuccessResponse::ok()))
}
