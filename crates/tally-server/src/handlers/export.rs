//! CSV export and import handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Response, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{AppError, AppState, UserQuery};
use tally_core::ImportSummary;

/// GET /api/export - Download the user's transactions as CSV
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Response<Body>, AppError> {
    let mut buf = Vec::new();
    tally_core::export::export_csv(&state.db, user.user_id, &mut buf)?;

    let rows = buf.iter().filter(|b| **b == b'\n').count().saturating_sub(1);
    info!("Exported {} transactions to CSV", rows);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"transactions-{}.csv\"",
                Utc::now().format("%Y-%m-%d")
            ),
        )
        .body(Body::from(buf))
        .map_err(|e| AppError::internal(&e.to_string()))
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

/// POST /api/import - Import transactions from a CSV body
///
/// Malformed rows are skipped, not fatal; the summary reports both counts.
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::bad_request("CSV body is empty"));
    }

    let today = Utc::now().date_naive();
    let summary = tally_core::export::import_csv(&state.db, user.user_id, body.as_bytes(), today)?;

    info!(
        "Imported {} transactions ({} splits, {} skipped)",
        summary.imported, summary.splits, summary.skipped
    );

    Ok(Json(ImportResponse {
        success: true,
        summary,
    }))
}
