//! Budget handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse, UserQuery};
use tally_core::models::Budget;

/// Request body for creating or updating a budget
#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    #[serde(default = "crate::default_user_id")]
    pub user_id: i64,
    pub name: String,
    pub category_id: i64,
    pub amount: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A budget with its current spend attached
#[derive(Debug, Serialize)]
pub struct BudgetWithSpend {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: f64,
    pub percent_used: f64,
}

/// GET /api/budgets - List the user's budgets with current spend
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<BudgetWithSpend>>, AppError> {
    let today = Utc::now().date_naive();
    let mut out = Vec::new();

    for budget in state.db.list_budgets(user.user_id)? {
        let spent = state.db.budget_spent(&budget, today)?;
        let percent_used = if budget.amount > 0.0 {
            spent / budget.amount * 100.0
        } else {
            0.0
        };
        out.push(BudgetWithSpend {
            budget,
            spent,
            percent_used,
        });
    }

    Ok(Json(out))
}

/// POST /api/budgets - Create a budget
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BudgetRequest>,
) -> Result<Json<Budget>, AppError> {
    if req.amount <= 0.0 {
        return Err(AppError::bad_request("Budget amount must be positive"));
    }

    let id = state.db.create_budget(
        req.user_id,
        &req.name,
        req.category_id,
        req.amount,
        req.start_date,
        req.end_date,
    )?;
    let budget = state
        .db
        .get_budget(id)?
        .ok_or_else(|| AppError::not_found("Budget not found after creation"))?;
    Ok(Json(budget))
}

/// GET /api/budgets/:id - Get a single budget with its spend
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BudgetWithSpend>, AppError> {
    let budget = state
        .db
        .get_budget(id)?
        .ok_or_else(|| AppError::not_found(&format!("Budget {} not found", id)))?;

    let today = Utc::now().date_naive();
    let spent = state.db.budget_spent(&budget, today)?;
    let percent_used = if budget.amount > 0.0 {
        spent / budget.amount * 100.0
    } else {
        0.0
    };

    Ok(Json(BudgetWithSpend {
        budget,
        spent,
        percent_used,
    }))
}

/// PUT /api/budgets/:id - Update a budget
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<BudgetRequest>,
) -> Result<Json<Budget>, AppError> {
    state.db.update_budget(
        id,
        &req.name,
        req.category_id,
        req.amount,
        req.start_date,
        req.end_date,
    )?;
    let budget = state
        .db
        .get_budget(id)?
        .ok_or_else(|| AppError::not_found(&format!("Budget {} not found", id)))?;
    Ok(Json(budget))
}

/// DELETE /api/budgets/:id - Delete a budget and its alert history
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_budget(id)?;
    Ok(Json(SuccessResponse::ok()))
}
