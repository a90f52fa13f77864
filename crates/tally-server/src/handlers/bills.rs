//! Bill handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::{AppError, AppState, SuccessResponse, UserQuery};
use tally_core::jobs;
use tally_core::models::{Bill, NewBill};

/// GET /api/bills - List the user's bills, soonest due first
pub async fn list_bills(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<Bill>>, AppError> {
    let bills = state.db.list_bills(user.user_id)?;
    Ok(Json(bills))
}

/// POST /api/bills - Create a bill
pub async fn create_bill(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewBill>,
) -> Result<Json<Bill>, AppError> {
    if req.amount <= 0.0 {
        return Err(AppError::bad_request("Amount must be positive"));
    }

    let id = state.db.create_bill(&req)?;
    let bill = state
        .db
        .get_bill(id)?
        .ok_or_else(|| AppError::not_found("Bill not found after creation"))?;
    Ok(Json(bill))
}

/// PUT /api/bills/:id - Update a bill
pub async fn update_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<NewBill>,
) -> Result<Json<Bill>, AppError> {
    state.db.update_bill(id, &req)?;
    let bill = state
        .db
        .get_bill(id)?
        .ok_or_else(|| AppError::not_found(&format!("Bill {} not found", id)))?;
    Ok(Json(bill))
}

/// POST /api/bills/:id/pay - Pay a bill
///
/// Records the payment through the ledger and, for recurring bills, creates
/// the next pending instance. Paying an already-paid bill is a conflict.
pub async fn pay_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Bill>, AppError> {
    let today = Utc::now().date_naive();
    jobs::pay_bill(&state.db, id, today).map_err(|e| match e {
        tally_core::Error::InvalidData(msg) => AppError::conflict(&msg),
        other => other.into(),
    })?;

    let bill = state
        .db
        .get_bill(id)?
        .ok_or_else(|| AppError::not_found(&format!("Bill {} not found", id)))?;
    Ok(Json(bill))
}

/// DELETE /api/bills/:id - Delete a bill
pub async fn delete_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_bill(id)?;
    Ok(Json(SuccessResponse::ok()))
}
