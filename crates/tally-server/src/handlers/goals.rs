//! Savings goal handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse, UserQuery};
use tally_core::models::{GoalContribution, SavingsGoal};

/// Request body for creating a goal
#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    #[serde(default = "crate::default_user_id")]
    pub user_id: i64,
    pub name: String,
    pub target_amount: f64,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

/// A goal with derived progress fields
#[derive(Debug, Serialize)]
pub struct GoalResponse {
    #[serde(flatten)]
    pub goal: SavingsGoal,
    pub progress_percent: f64,
    pub remaining_amount: f64,
}

impl From<SavingsGoal> for GoalResponse {
    fn from(goal: SavingsGoal) -> Self {
        let progress_percent = goal.progress_percent();
        let remaining_amount = goal.remaining_amount();
        Self {
            goal,
            progress_percent,
            remaining_amount,
        }
    }
}

/// GET /api/goals - List the user's goals
pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<GoalResponse>>, AppError> {
    let goals = state
        .db
        .list_goals(user.user_id)?
        .into_iter()
        .map(GoalResponse::from)
        .collect();
    Ok(Json(goals))
}

/// POST /api/goals - Create a goal
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoalRequest>,
) -> Result<Json<GoalResponse>, AppError> {
    if req.target_amount <= 0.0 {
        return Err(AppError::bad_request("Target amount must be positive"));
    }

    let id = state.db.create_goal(
        req.user_id,
        &req.name,
        req.target_amount,
        req.target_date,
        &req.description,
    )?;
    let goal = state
        .db
        .get_goal(id)?
        .ok_or_else(|| AppError::not_found("Goal not found after creation"))?;
    Ok(Json(goal.into()))
}

/// GET /api/goals/:id - Get a goal with its contributions
#[derive(Debug, Serialize)]
pub struct GoalDetailResponse {
    #[serde(flatten)]
    pub goal: GoalResponse,
    pub contributions: Vec<GoalContribution>,
}

pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<GoalDetailResponse>, AppError> {
    let goal = state
        .db
        .get_goal(id)?
        .ok_or_else(|| AppError::not_found(&format!("Goal {} not found", id)))?;
    let contributions = state.db.list_contributions(id)?;

    Ok(Json(GoalDetailResponse {
        goal: goal.into(),
        contributions,
    }))
}

/// Request body for contributing to a goal
#[derive(Debug, Deserialize)]
pub struct ContributionRequest {
    pub amount: f64,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

/// POST /api/goals/:id/contribute - Record a contribution
///
/// The contribution that reaches the target completes the goal.
pub async fn contribute_to_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ContributionRequest>,
) -> Result<Json<GoalResponse>, AppError> {
    if req.amount <= 0.0 {
        return Err(AppError::bad_request("Contribution must be positive"));
    }

    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    let goal = state
        .db
        .add_contribution(id, req.amount, date, &req.description)?;
    Ok(Json(goal.into()))
}

/// DELETE /api/goals/:id - Delete a goal and its contributions
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_goal(id)?;
    Ok(Json(SuccessResponse::ok()))
}
