//! Dashboard, health score, and insight handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::{AppError, AppState, UserQuery};
use tally_core::{metrics, DashboardStats, HealthBreakdown, Insight};

/// GET /api/dashboard - Headline numbers for the current month
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    let today = Utc::now().date_naive();
    let stats = state.db.dashboard_stats(user.user_id, today)?;
    Ok(Json(stats))
}

/// GET /api/health-score - Compute the user's financial health score
///
/// Always computes fresh and stores the result, so the nightly job and
/// this endpoint never disagree for long.
pub async fn get_health_score(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<HealthBreakdown>, AppError> {
    let today = Utc::now().date_naive();
    let breakdown = metrics::health_score(&state.db, user.user_id, today)?;
    state.db.upsert_health_score(
        user.user_id,
        breakdown.score,
        breakdown.savings_rate,
        breakdown.budget_adherence,
        breakdown.emergency_fund_months,
    )?;
    Ok(Json(breakdown))
}

/// GET /api/insights - Spending insights for the current month
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<Insight>>, AppError> {
    let today = Utc::now().date_naive();
    let insights = metrics::spending_insights(&state.db, user.user_id, today)?;
    Ok(Json(insights))
}
