//! Recurring rule handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::{AppError, AppState, SuccessResponse, UserQuery};
use tally_core::jobs;
use tally_core::models::{NewRecurringRule, RecurringRule};

/// GET /api/recurring - List the user's recurring rules
pub async fn list_recurring(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<RecurringRule>>, AppError> {
    let rules = state.db.list_recurring_rules(user.user_id)?;
    Ok(Json(rules))
}

/// POST /api/recurring - Create a recurring rule
pub async fn create_recurring(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewRecurringRule>,
) -> Result<Json<RecurringRule>, AppError> {
    if req.amount <= 0.0 {
        return Err(AppError::bad_request("Amount must be positive"));
    }

    let id = state.db.create_recurring_rule(&req)?;
    let rule = state
        .db
        .get_recurring_rule(id)?
        .ok_or_else(|| AppError::not_found("Rule not found after creation"))?;
    Ok(Json(rule))
}

/// PUT /api/recurring/:id - Replace a rule
pub async fn update_recurring(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<NewRecurringRule>,
) -> Result<Json<RecurringRule>, AppError> {
    state.db.update_recurring_rule(id, &req)?;
    let rule = state
        .db
        .get_recurring_rule(id)?
        .ok_or_else(|| AppError::not_found(&format!("Recurring rule {} not found", id)))?;
    Ok(Json(rule))
}

/// DELETE /api/recurring/:id - Delete a rule
pub async fn delete_recurring(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_recurring_rule(id)?;
    Ok(Json(SuccessResponse::ok()))
}

#[derive(Debug, Serialize)]
pub struct ApplyRecurringResponse {
    pub created: usize,
}

/// POST /api/recurring/apply - Apply due rules now, without waiting for the
/// daily tick
pub async fn apply_recurring(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApplyRecurringResponse>, AppError> {
    let today = Utc::now().date_naive();
    let created = jobs::apply_recurring(&state.db, today)?;
    Ok(Json(ApplyRecurringResponse { created }))
}
