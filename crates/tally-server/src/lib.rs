//! Tally Web Server
//!
//! Axum-based JSON API for the Tally personal finance application, plus the
//! background job scheduler and the email outbox worker. There is no auth
//! layer; requests select a user with the `user_id` query parameter and
//! default to user 1.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use tally_core::db::Database;

mod handlers;
mod mailer;
mod scheduler;

pub use mailer::{LogMailer, Mailer};
pub use scheduler::{start_job_scheduler, start_outbox_worker, JobScheduleConfig};

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Shared application state
pub struct AppState {
    pub db: Database,
}

/// Selects the acting user; defaults to user 1
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UserQuery {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
}

pub(crate) fn default_user_id() -> i64 {
    1
}

/// Generic success body for delete/mark endpoints
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Self {
        Self { success: true }
    }
}

/// Create the application router
pub fn create_router(db: Database) -> Router {
    let state = Arc::new(AppState { db });

    let api_routes = Router::new()
        // Dashboard and metrics
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/health-score", get(handlers::get_health_score))
        .route("/insights", get(handlers::get_insights))
        // Accounts
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/accounts/:id",
            get(handlers::get_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route(
            "/transactions/:id/splits",
            get(handlers::list_splits).post(handlers::add_split),
        )
        .route(
            "/splits/:id",
            axum::routing::put(handlers::update_split).delete(handlers::delete_split),
        )
        // Transaction templates (one-tap entry)
        .route(
            "/templates",
            get(handlers::list_templates).post(handlers::create_template),
        )
        .route("/templates/:id/use", post(handlers::use_template))
        .route(
            "/templates/:id",
            axum::routing::delete(handlers::delete_template),
        )
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        // Budgets
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::create_budget),
        )
        .route(
            "/budgets/:id",
            get(handlers::get_budget)
                .put(handlers::update_budget)
                .delete(handlers::delete_budget),
        )
        // Recurring rules
        .route(
            "/recurring",
            get(handlers::list_recurring).post(handlers::create_recurring),
        )
        .route(
            "/recurring/:id",
            axum::routing::put(handlers::update_recurring)
                .delete(handlers::delete_recurring),
        )
        .route("/recurring/apply", post(handlers::apply_recurring))
        // Bills
        .route(
            "/bills",
            get(handlers::list_bills).post(handlers::create_bill),
        )
        .route(
            "/bills/:id",
            axum::routing::put(handlers::update_bill).delete(handlers::delete_bill),
        )
        .route("/bills/:id/pay", post(handlers::pay_bill))
        // Savings goals
        .route(
            "/goals",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        .route(
            "/goals/:id",
            get(handlers::get_goal).delete(handlers::delete_goal),
        )
        .route("/goals/:id/contribute", post(handlers::contribute_to_goal))
        // Notifications
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
        .route(
            "/notifications/read-all",
            post(handlers::mark_all_notifications_read),
        )
        // Preferences
        .route(
            "/preferences",
            get(handlers::get_preferences).put(handlers::set_preferences),
        )
        // CSV
        .route("/export", get(handlers::export_csv))
        .route("/import", post(handlers::import_csv));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the server with the background scheduler and outbox worker
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    let config = JobScheduleConfig::from_env();
    start_job_scheduler(db.clone(), config.clone());
    start_outbox_worker(db.clone(), Arc::new(LogMailer), config.outbox_secs);

    let app = create_router(db);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(anyhow::anyhow!(msg.to_string())),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<tally_core::Error> for AppError {
    fn from(err: tally_core::Error) -> Self {
        match err {
            tally_core::Error::NotFound(what) => Self::not_found(&format!("{} not found", what)),
            tally_core::Error::InvalidData(msg) => Self::bad_request(&msg),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests;
